//! Content-policy classification of job failures.
//!
//! The video service reports moderation rejections only as free text, so the
//! classification is a case-insensitive substring match against a fixed
//! marker set (including the Chinese equivalents the service localizes to).

/// Markers that identify a moderation rejection in an error message.
pub const POLICY_MARKERS: &[&str] = &["safety", "sensitive", "policy", "review", "審核", "敏感"];

/// How a failed job should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Automated content moderation rejected the request.
    PolicyRejection,
    /// Anything else; never retried.
    Terminal,
}

/// Check whether an error message indicates a content-policy rejection.
pub fn is_policy_rejection(message: &str) -> bool {
    let lower = message.to_lowercase();
    POLICY_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub fn classify(message: &str) -> ErrorClass {
    if is_policy_rejection(message) {
        ErrorClass::PolicyRejection
    } else {
        ErrorClass::Terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_match_case_insensitively() {
        assert!(is_policy_rejection("Blocked by SAFETY settings"));
        assert!(is_policy_rejection("prompt contains Sensitive words"));
        assert!(is_policy_rejection("usage POLICY violation"));
        assert!(is_policy_rejection("flagged for manual review"));
    }

    #[test]
    fn test_localized_markers_match() {
        assert!(is_policy_rejection("內容審核未通過"));
        assert!(is_policy_rejection("包含敏感內容"));
    }

    #[test]
    fn test_other_errors_are_terminal() {
        assert_eq!(classify("Internal error encountered."), ErrorClass::Terminal);
        assert_eq!(classify("quota exceeded"), ErrorClass::Terminal);
        assert_eq!(classify(""), ErrorClass::Terminal);
    }

    #[test]
    fn test_classify_policy() {
        assert_eq!(
            classify("The prompt could not be submitted: safety filter"),
            ErrorClass::PolicyRejection
        );
    }
}
