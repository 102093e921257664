use std::fs;
use std::path::{Path, PathBuf};

use super::params::WordListParam;

/// Directories searched, in order, when a wordlist is given as a bare file name.
pub const UPLOAD_DIRS: &[&str] = &["wordlist_uploads", "."];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    ExplicitList,
    ExistingFile,
    DelimitedString,
    SingleLiteral,
}

impl ResolutionStep {
    pub const ORDER: [ResolutionStep; 4] = [
        ResolutionStep::ExplicitList,
        ResolutionStep::ExistingFile,
        ResolutionStep::DelimitedString,
        ResolutionStep::SingleLiteral,
    ];
}

/// Turns a payload source into a list of payloads by trying each step in
/// order and keeping the first that applies.
#[derive(Debug, Clone)]
pub struct WordlistResolver {
    upload_dirs: Vec<PathBuf>,
    steps: Vec<ResolutionStep>,
}

impl Default for WordlistResolver {
    fn default() -> Self {
        Self {
            upload_dirs: UPLOAD_DIRS.iter().map(PathBuf::from).collect(),
            steps: ResolutionStep::ORDER.to_vec(),
        }
    }
}

impl WordlistResolver {
    pub fn with_upload_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.upload_dirs = dirs;
        self
    }

    pub fn with_steps(mut self, steps: Vec<ResolutionStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn resolve(&self, source: &WordListParam) -> Option<(ResolutionStep, Vec<String>)> {
        self.steps
            .iter()
            .find_map(|step| self.attempt(*step, source).map(|words| (*step, words)))
    }

    fn attempt(&self, step: ResolutionStep, source: &WordListParam) -> Option<Vec<String>> {
        match (step, source) {
            (ResolutionStep::ExplicitList, WordListParam::List(items)) => {
                Some(clean(items.iter().map(String::as_str)))
            }
            (ResolutionStep::ExistingFile, WordListParam::Text(text)) => self.load_file(text.trim()),
            (ResolutionStep::DelimitedString, WordListParam::Text(text))
                if text.contains(',') || text.contains('\n') =>
            {
                Some(clean(text.split([',', '\n'])))
            }
            (ResolutionStep::SingleLiteral, WordListParam::Text(text)) => {
                let text = text.trim();
                (!text.is_empty()).then(|| vec![text.to_string()])
            }
            _ => None,
        }
    }

    fn load_file(&self, name: &str) -> Option<Vec<String>> {
        if name.is_empty() || name.contains('\n') {
            return None;
        }

        let direct = PathBuf::from(name);
        let candidates = std::iter::once(direct).chain(self.upload_dirs.iter().map(|dir| dir.join(name)));

        for path in candidates {
            if !path.is_file() {
                continue;
            }
            match read_lines(&path) {
                Ok(words) => {
                    tracing::info!(path = %path.display(), count = words.len(), "loaded wordlist");
                    return Some(words);
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "failed to read wordlist");
                    return Some(Vec::new());
                }
            }
        }

        None
    }
}

fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(clean(content.lines()))
}

fn clean<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
