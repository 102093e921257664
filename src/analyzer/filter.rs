use serde::{Deserialize, Serialize};

use crate::models::ScanResult;

/// Content-length predicate: an exact byte count or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthFilter {
    Exact(usize),
    Range { min: usize, max: Option<usize> },
}

impl LengthFilter {
    /// Accepts `N`, `min,max`, `min,`, `,max`, `>N` and `<N`.
    /// Returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(rest) = input.strip_prefix('>') {
            let n: usize = rest.trim().parse().ok()?;
            return Some(LengthFilter::Range {
                min: n.checked_add(1)?,
                max: None,
            });
        }

        if let Some(rest) = input.strip_prefix('<') {
            let n: usize = rest.trim().parse().ok()?;
            return Some(LengthFilter::Range {
                min: 0,
                max: Some(n.checked_sub(1)?),
            });
        }

        match input.split_once(',') {
            None => input.parse().ok().map(LengthFilter::Exact),
            Some((min, max)) => {
                let min = min.trim();
                let max = max.trim();
                let min = if min.is_empty() { 0 } else { min.parse().ok()? };
                let max = if max.is_empty() {
                    None
                } else {
                    Some(max.parse().ok()?)
                };
                if matches!(max, Some(m) if m < min) {
                    return None;
                }
                Some(LengthFilter::Range { min, max })
            }
        }
    }

    pub fn matches(&self, length: usize) -> bool {
        match *self {
            LengthFilter::Exact(n) => length == n,
            LengthFilter::Range { min, max } => length >= min && max.is_none_or(|m| length <= m),
        }
    }
}

/// Admission rules applied to every probe result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFilter {
    pub hide_status: Vec<u16>,
    pub show_status: Vec<u16>,
    pub content_length: Option<LengthFilter>,
}

impl ResultFilter {
    pub fn admits(&self, result: &ScanResult) -> bool {
        self.admits_status(result.status_code) && self.admits_length(result.length)
    }

    pub fn admits_status(&self, status: u16) -> bool {
        if self.hide_status.contains(&status) {
            return false;
        }
        self.show_status.is_empty() || self.show_status.contains(&status)
    }

    pub fn admits_length(&self, length: usize) -> bool {
        self.content_length.is_none_or(|f| f.matches(length))
    }

    pub fn is_permissive(&self) -> bool {
        self.hide_status.is_empty() && self.show_status.is_empty() && self.content_length.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyMetrics, Severity};

    fn result_with(status: u16, body: &str) -> ScanResult {
        ScanResult::new(
            1,
            "http://example.test/x".to_string(),
            "x".to_string(),
            status,
            Severity::Low,
            BodyMetrics::measure(body),
            false,
        )
    }

    #[test]
    fn test_exact_length() {
        let filter = LengthFilter::parse("5").unwrap();
        assert_eq!(filter, LengthFilter::Exact(5));
        assert!(filter.matches(5));
        assert!(!filter.matches(4));
        assert!(!filter.matches(6));
    }

    #[test]
    fn test_open_ended_range() {
        let filter = LengthFilter::parse("3,").unwrap();
        assert_eq!(filter, LengthFilter::Range { min: 3, max: None });
        assert!(filter.matches(1_000_000));
        assert!(!filter.matches(2));
    }

    #[test]
    fn test_bounded_range_is_inclusive() {
        let filter = LengthFilter::parse("10, 20").unwrap();
        assert!(filter.matches(10));
        assert!(filter.matches(20));
        assert!(!filter.matches(21));
        assert_eq!(
            LengthFilter::parse(",20"),
            Some(LengthFilter::Range { min: 0, max: Some(20) })
        );
    }

    #[test]
    fn test_comparison_prefixes() {
        assert_eq!(
            LengthFilter::parse(">100"),
            Some(LengthFilter::Range { min: 101, max: None })
        );
        assert_eq!(
            LengthFilter::parse("<100"),
            Some(LengthFilter::Range { min: 0, max: Some(99) })
        );
        assert_eq!(LengthFilter::parse("<0"), None);
    }

    #[test]
    fn test_malformed_length_filters() {
        assert_eq!(LengthFilter::parse(""), None);
        assert_eq!(LengthFilter::parse("abc"), None);
        assert_eq!(LengthFilter::parse("5,x"), None);
        assert_eq!(LengthFilter::parse("20,10"), None);
    }

    #[test]
    fn test_hide_takes_precedence_over_show() {
        let filter = ResultFilter {
            hide_status: vec![404],
            show_status: vec![404, 200],
            content_length: None,
        };
        assert!(!filter.admits(&result_with(404, "")));
        assert!(filter.admits(&result_with(200, "")));
        assert!(!filter.admits(&result_with(500, "")));
    }

    #[test]
    fn test_empty_show_list_allows_all() {
        let filter = ResultFilter::default();
        assert!(filter.is_permissive());
        assert!(filter.admits(&result_with(0, "")));
        assert!(filter.admits(&result_with(302, "moved")));
    }

    #[test]
    fn test_all_predicates_must_pass() {
        let filter = ResultFilter {
            hide_status: Vec::new(),
            show_status: vec![200],
            content_length: Some(LengthFilter::Exact(5)),
        };
        assert!(filter.admits(&result_with(200, "hello")));
        assert!(!filter.admits(&result_with(200, "hello!")));
        assert!(!filter.admits(&result_with(301, "hello")));
    }
}
