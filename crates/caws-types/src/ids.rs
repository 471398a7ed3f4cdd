//! Identifier patterns for specs and waivers

use regex::Regex;
use std::sync::OnceLock;

/// `TYPE-NNNN`, e.g. `FEAT-1234`
fn spec_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]+-\d+$").expect("spec id regex must compile"))
}

/// `WV-NNNN`, exactly four digits
fn waiver_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^WV-\d{4}$").expect("waiver id regex must compile"))
}

/// Human-readable form of the spec id pattern, used in suggestions
pub const SPEC_ID_FORMAT: &str = "TYPE-NNNN (e.g. FEAT-0001)";

/// Human-readable form of the waiver id pattern, used in suggestions
pub const WAIVER_ID_FORMAT: &str = "WV-NNNN (e.g. WV-0001)";

pub fn is_valid_spec_id(id: &str) -> bool {
    spec_id_re().is_match(id)
}

pub fn is_valid_waiver_id(id: &str) -> bool {
    waiver_id_re().is_match(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_ids() {
        assert!(is_valid_spec_id("FEAT-0001"));
        assert!(is_valid_spec_id("FIX-42"));
        assert!(!is_valid_spec_id("feat-0001"));
        assert!(!is_valid_spec_id("FEAT0001"));
        assert!(!is_valid_spec_id("FEAT-"));
        assert!(!is_valid_spec_id(" FEAT-0001"));
    }

    #[test]
    fn test_waiver_ids() {
        assert!(is_valid_waiver_id("WV-0001"));
        assert!(!is_valid_waiver_id("WV-001"));
        assert!(!is_valid_waiver_id("WV-00001"));
        assert!(!is_valid_waiver_id("wv-0001"));
    }
}
