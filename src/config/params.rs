use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Loosely typed scan request, as received from a form, a JSON body or the CLI.
/// Every field is optional and may arrive in more than one shape. A value of
/// the wrong shape never fails deserialization: scalars are coerced to text
/// and anything else lands in an `Other` variant or is dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    #[serde(alias = "url", deserialize_with = "scalar_text")]
    pub target_url: Option<String>,
    pub word_list: Option<WordListParam>,
    pub cookies: Option<KeyValueParam>,
    pub hide_status: Option<StatusListParam>,
    pub show_status: Option<StatusListParam>,
    #[serde(deserialize_with = "scalar_text")]
    pub http_method: Option<String>,
    pub filter_by_content_length: Option<NumberParam>,
    #[serde(deserialize_with = "scalar_text")]
    pub proxy: Option<String>,
    pub additional_parameters: Option<KeyValueParam>,
    pub show_results: Option<FlagParam>,
    pub depth: Option<NumberParam>,
    pub max_pages: Option<NumberParam>,
    #[serde(deserialize_with = "scalar_text")]
    pub user_agent: Option<String>,
    pub delay: Option<NumberParam>,
    pub timeout: Option<NumberParam>,
    #[serde(deserialize_with = "scalar_path")]
    pub output_dir: Option<PathBuf>,
    #[serde(deserialize_with = "scalar_text")]
    pub submit_url: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WordListParam {
    List(Vec<String>),
    Text(String),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeyValueParam {
    Map(BTreeMap<String, String>),
    Text(String),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusListParam {
    List(Vec<Value>),
    Text(String),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NumberParam {
    Number(u64),
    Text(String),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FlagParam {
    Bool(bool),
    Text(String),
    Other(Value),
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => {
            tracing::warn!(value = %other, "ignoring non-scalar scan parameter");
            None
        }
    })
}

fn scalar_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(deserializer)?.map(PathBuf::from))
}

impl WordListParam {
    pub fn is_malformed(&self) -> bool {
        matches!(self, WordListParam::Other(_))
    }
}

impl FlagParam {
    /// `true`/`false`, `yes`/`no`, `on`/`off` and `1`/`0`, in any case.
    pub fn value(&self) -> Option<bool> {
        let text = match self {
            FlagParam::Bool(b) => return Some(*b),
            FlagParam::Text(s) => s.trim().to_ascii_lowercase(),
            FlagParam::Other(Value::Number(n)) => n.to_string(),
            FlagParam::Other(_) => return None,
        };
        match text.as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            FlagParam::Bool(b) => b.to_string(),
            FlagParam::Text(s) => s.clone(),
            FlagParam::Other(v) => v.to_string(),
        }
    }
}

impl StatusListParam {
    /// Keeps every token that is a valid status code and silently drops the rest.
    pub fn codes(&self) -> Vec<u16> {
        match self {
            StatusListParam::List(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                })
                .collect(),
            StatusListParam::Text(text) => text
                .split(',')
                .filter_map(|token| token.trim().parse().ok())
                .collect(),
            StatusListParam::Other(Value::Number(n)) => {
                n.as_u64().and_then(|n| u16::try_from(n).ok()).into_iter().collect()
            }
            StatusListParam::Other(_) => Vec::new(),
        }
    }
}

impl From<Vec<u16>> for StatusListParam {
    fn from(codes: Vec<u16>) -> Self {
        StatusListParam::List(codes.into_iter().map(Value::from).collect())
    }
}

impl KeyValueParam {
    /// Parses `k=v` pairs joined by `separator`; pairs without `=` are skipped.
    pub fn pairs(&self, separator: char) -> BTreeMap<String, String> {
        match self {
            KeyValueParam::Map(map) => map.clone(),
            KeyValueParam::Text(text) => text
                .split(separator)
                .filter_map(|item| {
                    let (key, value) = item.split_once('=')?;
                    let key = key.trim();
                    if key.is_empty() {
                        return None;
                    }
                    Some((key.to_string(), value.trim().to_string()))
                })
                .collect(),
            KeyValueParam::Other(Value::Object(map)) => map
                .iter()
                .filter_map(|(key, value)| match value {
                    Value::String(s) => Some((key.clone(), s.clone())),
                    Value::Number(_) | Value::Bool(_) => Some((key.clone(), value.to_string())),
                    _ => None,
                })
                .collect(),
            KeyValueParam::Other(_) => BTreeMap::new(),
        }
    }
}

impl NumberParam {
    pub fn value(&self) -> Option<u64> {
        match self {
            NumberParam::Number(n) => Some(*n),
            NumberParam::Text(s) => s.trim().parse().ok(),
            NumberParam::Other(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            NumberParam::Number(n) => n.to_string(),
            NumberParam::Text(s) => s.clone(),
            NumberParam::Other(v) => v.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_drops_garbage() {
        let param = StatusListParam::Text("404, abc,500,,99999".to_string());
        assert_eq!(param.codes(), vec![404, 500]);
    }

    #[test]
    fn test_status_list_accepts_mixed_values() {
        let param: StatusListParam = serde_json::from_str(r#"[404, "302", true, "x"]"#).unwrap();
        assert_eq!(param.codes(), vec![404, 302]);
    }

    #[test]
    fn test_cookie_string() {
        let param = KeyValueParam::Text("session=abc; theme=dark;broken".to_string());
        let cookies = param.pairs(';');
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["session"], "abc");
        assert_eq!(cookies["theme"], "dark");
    }

    #[test]
    fn test_params_from_json_body() {
        let params: ScanParams = serde_json::from_str(
            r#"{
                "target_url": "http://example.test/FUZZ",
                "word_list": ["a", "b"],
                "hide_status": "404",
                "filter_by_content_length": 12,
                "depth": "",
                "show_results": false
            }"#,
        )
        .unwrap();

        assert_eq!(params.target_url.as_deref(), Some("http://example.test/FUZZ"));
        assert_eq!(
            params.word_list,
            Some(WordListParam::List(vec!["a".to_string(), "b".to_string()]))
        );
        assert_eq!(params.filter_by_content_length.unwrap().value(), Some(12));
        assert_eq!(params.depth.unwrap().value(), None);
        assert_eq!(params.show_results.and_then(|f| f.value()), Some(false));
    }

    #[test]
    fn test_url_alias() {
        let params: ScanParams = serde_json::from_str(r#"{"url": "http://example.test/"}"#).unwrap();
        assert_eq!(params.target_url.as_deref(), Some("http://example.test/"));
    }

    #[test]
    fn test_wrong_json_types_never_abort() {
        let params: ScanParams = serde_json::from_str(
            r#"{
                "target_url": "http://example.test/",
                "timeout": "abc",
                "show_results": "true",
                "depth": -1,
                "max_pages": 2.5,
                "proxy": 8080,
                "word_list": 7,
                "cookies": {"sid": 1, "nested": [1]},
                "hide_status": 404,
                "output_dir": ["x"]
            }"#,
        )
        .unwrap();

        assert_eq!(params.timeout.as_ref().and_then(NumberParam::value), None);
        assert_eq!(params.show_results.as_ref().and_then(FlagParam::value), Some(true));
        assert_eq!(params.depth.as_ref().and_then(NumberParam::value), None);
        assert_eq!(params.depth.unwrap().as_text(), "-1");
        assert_eq!(params.max_pages.as_ref().and_then(NumberParam::value), None);
        assert_eq!(params.proxy.as_deref(), Some("8080"));
        assert!(params.word_list.unwrap().is_malformed());
        assert_eq!(params.cookies.unwrap().pairs(';').get("sid").map(String::as_str), Some("1"));
        assert_eq!(params.hide_status.unwrap().codes(), vec![404]);
        assert_eq!(params.output_dir, None);
    }

    #[test]
    fn test_null_fields_are_absent() {
        let params: ScanParams =
            serde_json::from_str(r#"{"url": "http://example.test/", "proxy": null, "timeout": null}"#).unwrap();
        assert_eq!(params.proxy, None);
        assert_eq!(params.timeout, None);
    }

    #[test]
    fn test_flag_spellings() {
        assert_eq!(FlagParam::Text(" Yes ".to_string()).value(), Some(true));
        assert_eq!(FlagParam::Text("off".to_string()).value(), Some(false));
        assert_eq!(FlagParam::Other(Value::from(0)).value(), Some(false));
        assert_eq!(FlagParam::Text("maybe".to_string()).value(), None);
    }
}
