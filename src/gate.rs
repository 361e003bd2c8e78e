//! Submission gate: decides whether the submit action is permitted.
//!
//! Recomputed synchronously on every checkbox change and on every ink
//! transition reported by the stroke path; there is no polling timer.

pub const MSG_AGREE_TERMS: &str = "Please agree to the terms and conditions";
pub const MSG_NEED_SIGNATURE: &str = "Please provide your signature";

/// Submit is permitted only with the agreement checked and ink present.
pub fn submit_enabled(agreed: bool, has_ink: bool) -> bool {
    agreed && has_ink
}

/// Pre-flight check run before any network call. The agreement is
/// validated before the signature, so a missing checkbox always wins.
pub fn precondition_failure(agreed: bool, has_ink: bool) -> Option<&'static str> {
    if !agreed {
        return Some(MSG_AGREE_TERMS);
    }
    if !has_ink {
        return Some(MSG_NEED_SIGNATURE);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_only_when_agreed_with_ink() {
        assert!(submit_enabled(true, true));
        assert!(!submit_enabled(true, false));
        assert!(!submit_enabled(false, true));
        assert!(!submit_enabled(false, false));
    }

    #[test]
    fn agreement_is_checked_before_the_signature() {
        assert_eq!(precondition_failure(false, true), Some(MSG_AGREE_TERMS));
        assert_eq!(precondition_failure(false, false), Some(MSG_AGREE_TERMS));
        assert_eq!(precondition_failure(true, false), Some(MSG_NEED_SIGNATURE));
        assert_eq!(precondition_failure(true, true), None);
    }
}
