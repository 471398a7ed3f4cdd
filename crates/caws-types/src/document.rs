//! Document parsing
//!
//! Specs, policies and waivers are authored as YAML or JSON. Both are
//! parsed into a `serde_json::Value` tree so that structural validation
//! can report exact field paths before typed deserialization runs.

use crate::error::{DocumentError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};
use std::path::Path;

/// Source format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension. Anything that is not `.json`
    /// is read as YAML, which is a superset of JSON anyway.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parse document text into a JSON value tree.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Value> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(text).map_err(|e| DocumentError::Json(e.to_string()))
        }
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| DocumentError::Yaml(e.to_string()))?;
            yaml_to_json(yaml, "$")
        }
    }
}

fn yaml_to_json(value: serde_yaml::Value, path: &str) -> Result<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                Value::Number(
                    Number::from_f64(f)
                        .ok_or_else(|| DocumentError::NonFiniteNumber(path.to_string()))?,
                )
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| yaml_to_json(item, &format!("{path}[{idx}]")))
                .collect::<Result<Vec<_>>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut out = Map::new();
            for (key, item) in mapping {
                let key = mapping_key(key)?;
                let child = format!("{path}.{key}");
                out.insert(key, yaml_to_json(item, &child)?);
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value, path)?,
    })
}

// Tier tables are keyed by integers in YAML (`1:`, `2:`), JSON objects need strings.
fn mapping_key(key: serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(DocumentError::UnsupportedKey(format!("{other:?}"))),
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`2026-01-31T12:00:00Z`, offsets allowed), a naive
/// date-time which is taken as UTC, or a bare date meaning midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_yaml_integer_keys_become_strings() {
        let doc = "risk_tiers:\n  1:\n    max_files: 25\n  2:\n    max_files: 50\n";
        let value = parse_document(doc, DocumentFormat::Yaml).unwrap();
        assert_eq!(value["risk_tiers"]["1"]["max_files"], 25);
        assert_eq!(value["risk_tiers"]["2"]["max_files"], 50);
    }

    #[test]
    fn test_yaml_timestamps_stay_strings() {
        let doc = "expires_at: 2026-12-01T00:00:00Z\n";
        let value = parse_document(doc, DocumentFormat::Yaml).unwrap();
        assert_eq!(value["expires_at"], "2026-12-01T00:00:00Z");
    }

    #[test]
    fn test_json_parse_error() {
        let err = parse_document("{not json", DocumentFormat::Json).unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn test_yaml_parse_error() {
        let err = parse_document("a: [1, 2", DocumentFormat::Yaml).unwrap_err();
        assert!(matches!(err, DocumentError::Yaml(_)));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("policy.json")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("policy.yaml")),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("WV-0001")),
            DocumentFormat::Yaml
        );
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let rfc = parse_timestamp("2026-03-01T10:30:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let naive = parse_timestamp("2026-03-01T10:30:00").unwrap();
        assert_eq!(naive.hour(), 10);

        let date = parse_timestamp("2026-03-01").unwrap();
        assert_eq!(date.day(), 1);
        assert_eq!(date.hour(), 0);

        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("2026-13-01").is_none());
    }
}
