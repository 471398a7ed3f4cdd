//! Structural validation of waiver documents

use caws_types::ids::WAIVER_ID_FORMAT;
use caws_types::{is_valid_waiver_id, parse_timestamp, WaiverReason, WaiverStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structural problem in a waiver document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiverViolation {
    pub field: String,
    pub message: String,
}

impl WaiverViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a parsed waiver document. An empty list means the document can be
/// deserialized into a `Waiver`.
pub fn validate_waiver_document(doc: &Value) -> Vec<WaiverViolation> {
    let mut out = Vec::new();

    let Some(root) = doc.as_object() else {
        out.push(WaiverViolation::new("$", "waiver must be a mapping"));
        return out;
    };

    match root.get("id").and_then(Value::as_str) {
        Some(id) if is_valid_waiver_id(id) => {}
        Some(_) => out.push(WaiverViolation::new(
            "id",
            format!("id must match {WAIVER_ID_FORMAT}"),
        )),
        None => out.push(WaiverViolation::new("id", "id is required")),
    }

    match root.get("title").and_then(Value::as_str) {
        Some(title) if !title.trim().is_empty() => {}
        _ => out.push(WaiverViolation::new("title", "title is required")),
    }

    check_enum(root, "reason", &mut out, |raw| WaiverReason::parse(raw).is_some(), || {
        WaiverReason::ALL.iter().map(|r| r.as_str()).collect()
    });
    check_enum(root, "status", &mut out, |raw| WaiverStatus::parse(raw).is_some(), || {
        WaiverStatus::ALL.iter().map(|s| s.as_str()).collect()
    });

    check_string_list(root, "gates", &mut out);
    check_string_list(root, "approvers", &mut out);

    match root.get("expires_at") {
        Some(Value::String(raw)) if parse_timestamp(raw).is_some() => {}
        Some(Value::String(_)) => out.push(WaiverViolation::new(
            "expires_at",
            "expires_at must be an ISO-8601 timestamp",
        )),
        Some(_) => out.push(WaiverViolation::new(
            "expires_at",
            "expires_at must be an ISO-8601 timestamp string",
        )),
        None => out.push(WaiverViolation::new("expires_at", "expires_at is required")),
    }

    if let Some(created) = root.get("created_at").filter(|v| !v.is_null()) {
        if created.as_str().and_then(parse_timestamp).is_none() {
            out.push(WaiverViolation::new(
                "created_at",
                "created_at must be an ISO-8601 timestamp",
            ));
        }
    }

    check_delta(root, &mut out);

    out
}

fn check_enum(
    root: &Map<String, Value>,
    field: &str,
    out: &mut Vec<WaiverViolation>,
    is_known: impl Fn(&str) -> bool,
    allowed: impl Fn() -> Vec<&'static str>,
) {
    match root.get(field).and_then(Value::as_str) {
        Some(raw) if is_known(raw) => {}
        Some(raw) => out.push(WaiverViolation::new(
            field,
            format!("{field} '{raw}' must be one of: {}", allowed().join(", ")),
        )),
        None => out.push(WaiverViolation::new(field, format!("{field} is required"))),
    }
}

fn check_string_list(root: &Map<String, Value>, field: &str, out: &mut Vec<WaiverViolation>) {
    let items = match root.get(field) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Array(_)) => {
            out.push(WaiverViolation::new(field, format!("{field} must not be empty")));
            return;
        }
        Some(_) => {
            out.push(WaiverViolation::new(field, format!("{field} must be a list")));
            return;
        }
        None => {
            out.push(WaiverViolation::new(field, format!("{field} is required")));
            return;
        }
    };

    for (i, item) in items.iter().enumerate() {
        let ok = item.as_str().is_some_and(|s| !s.trim().is_empty());
        if !ok {
            out.push(WaiverViolation::new(
                format!("{field}[{i}]"),
                "entry must be a non-empty string",
            ));
        }
    }
}

fn check_delta(root: &Map<String, Value>, out: &mut Vec<WaiverViolation>) {
    let delta = match root.get("delta") {
        None | Some(Value::Null) => return,
        Some(Value::Object(delta)) => delta,
        Some(_) => {
            out.push(WaiverViolation::new("delta", "delta must be a mapping"));
            return;
        }
    };

    for field in ["max_files", "max_loc"] {
        if let Some(v) = delta.get(field).filter(|v| !v.is_null()) {
            let ok = v.as_u64().is_some_and(|n| n <= u64::from(u32::MAX));
            if !ok {
                out.push(WaiverViolation::new(
                    format!("delta.{field}"),
                    format!("{field} must be a non-negative integer"),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "id": "WV-0001",
            "title": "Vendor SDK migration",
            "reason": "third_party_constraint",
            "status": "active",
            "gates": ["budget_limit"],
            "approvers": ["tech-lead"],
            "expires_at": "2030-06-30T00:00:00Z",
            "delta": { "max_files": 10 }
        })
    }

    fn fields(doc: &Value) -> Vec<String> {
        validate_waiver_document(doc)
            .into_iter()
            .map(|v| v.field)
            .collect()
    }

    #[test]
    fn test_valid_waiver() {
        assert!(validate_waiver_document(&valid()).is_empty());
    }

    #[test]
    fn test_bad_id_and_status() {
        let mut doc = valid();
        doc["id"] = json!("WV-12");
        doc["status"] = json!("paused");
        assert_eq!(fields(&doc), vec!["id", "status"]);
    }

    #[test]
    fn test_empty_lists() {
        let mut doc = valid();
        doc["gates"] = json!([]);
        doc["approvers"] = json!(["ok", ""]);
        assert_eq!(fields(&doc), vec!["gates", "approvers[1]"]);
    }

    #[test]
    fn test_unparseable_expiry() {
        let mut doc = valid();
        doc["expires_at"] = json!("next tuesday");
        assert_eq!(fields(&doc), vec!["expires_at"]);
    }

    #[test]
    fn test_negative_delta() {
        let mut doc = valid();
        doc["delta"] = json!({ "max_files": -1, "max_loc": 200 });
        assert_eq!(fields(&doc), vec!["delta.max_files"]);
    }

    #[test]
    fn test_unknown_reason_lists_allowed_values() {
        let mut doc = valid();
        doc["reason"] = json!("convenience");
        let violations = validate_waiver_document(&doc);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("emergency_hotfix"));
    }
}
