// Request and decision records exchanged with the HTTP layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A piece of user-submitted text to validate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    /// Opaque caller identifier, used only as the rate-limit key
    pub user_id: String,
    pub input: String,
    /// Caller-supplied context tag. Carried through, not used for thresholds.
    pub category: String,
}

/// Why a request was blocked.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    EmptyInput,
    RateLimitExceeded,
    /// The classifier could not be consulted (error, timeout, bad response).
    ModerationServiceUnavailable,
    /// The classifier scored a category above the threshold.
    ContentFlagged { category: String, score: f64 },
}

impl BlockReason {
    /// Confidence reported for this block: the category score for flagged
    /// content (two decimals), zero for structural rejections.
    pub fn confidence(&self) -> f64 {
        match self {
            BlockReason::ContentFlagged { score, .. } => round2(*score),
            _ => 0.0,
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::EmptyInput => f.write_str("Input cannot be empty"),
            BlockReason::RateLimitExceeded => f.write_str("Rate limit exceeded"),
            BlockReason::ModerationServiceUnavailable => {
                f.write_str("Moderation service unavailable")
            }
            BlockReason::ContentFlagged { category, .. } => write!(f, "Blocked due to {category}"),
        }
    }
}

pub const PASSED_REASON: &str = "Input passed all security checks";

/// The gateway's answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDecision {
    pub blocked: bool,
    pub reason: String,
    /// The original input, verbatim, when not blocked
    pub sanitized_output: Option<String>,
    /// 0.0 to 1.0: see `BlockReason::confidence`, or 1.0 when passed
    pub confidence: f64,
}

impl ValidationDecision {
    pub fn blocked(reason: &BlockReason) -> Self {
        Self {
            blocked: true,
            reason: reason.to_string(),
            sanitized_output: None,
            confidence: reason.confidence(),
        }
    }

    pub fn passed(input: &str) -> Self {
        Self {
            blocked: false,
            reason: PASSED_REASON.to_string(),
            sanitized_output: Some(input.to_string()),
            confidence: 1.0,
        }
    }
}

/// Round to two decimal places from the exact binary value, so 0.945
/// (stored as 0.94499…) goes to 0.94. Scaling by 100 first would not.
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(BlockReason::EmptyInput.to_string(), "Input cannot be empty");
        assert_eq!(BlockReason::RateLimitExceeded.to_string(), "Rate limit exceeded");
        assert_eq!(
            BlockReason::ModerationServiceUnavailable.to_string(),
            "Moderation service unavailable"
        );
        let flagged = BlockReason::ContentFlagged {
            category: "self-harm/intent".to_string(),
            score: 0.97,
        };
        assert_eq!(flagged.to_string(), "Blocked due to self-harm/intent");
    }

    #[test]
    fn test_flagged_confidence_rounds_to_two_decimals() {
        let flagged = BlockReason::ContentFlagged {
            category: "violence".to_string(),
            score: 0.98765,
        };
        assert_eq!(flagged.confidence(), 0.99);

        let flagged = BlockReason::ContentFlagged {
            category: "violence".to_string(),
            score: 0.9012,
        };
        assert_eq!(flagged.confidence(), 0.9);
    }

    #[test]
    fn test_flagged_confidence_rounds_from_exact_binary_value() {
        // Each of these is stored just below the half
        for (score, expected) in [(0.945, 0.94), (0.965, 0.96), (0.985, 0.98)] {
            let flagged = BlockReason::ContentFlagged {
                category: "violence".to_string(),
                score,
            };
            assert_eq!(flagged.confidence(), expected, "score={score}");
        }
    }

    #[test]
    fn test_structural_blocks_have_zero_confidence() {
        for reason in [
            BlockReason::EmptyInput,
            BlockReason::RateLimitExceeded,
            BlockReason::ModerationServiceUnavailable,
        ] {
            assert_eq!(ValidationDecision::blocked(&reason).confidence, 0.0);
        }
    }

    #[test]
    fn test_decision_serializes_camel_case_with_null_output() {
        let decision = ValidationDecision::blocked(&BlockReason::RateLimitExceeded);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "blocked": true,
                "reason": "Rate limit exceeded",
                "sanitizedOutput": null,
                "confidence": 0.0
            })
        );
    }

    #[test]
    fn test_passed_decision_echoes_input() {
        let decision = ValidationDecision::passed("  hello  ");
        assert!(!decision.blocked);
        assert_eq!(decision.sanitized_output.as_deref(), Some("  hello  "));
        assert_eq!(decision.confidence, 1.0);
        assert_eq!(decision.reason, PASSED_REASON);
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: ValidationRequest = serde_json::from_str(
            r#"{"userId": "u-1", "input": "hi", "category": "chat"}"#,
        )
        .unwrap();
        assert_eq!(request.user_id, "u-1");
        assert_eq!(request.category, "chat");
    }

    #[test]
    fn test_request_missing_field_is_rejected() {
        let result: Result<ValidationRequest, _> =
            serde_json::from_str(r#"{"userId": "u-1", "input": "hi"}"#);
        assert!(result.is_err());
    }
}
