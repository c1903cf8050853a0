// Moderation client trait — the seam between the pipeline and the classifier.

use anyhow::Result;
use async_trait::async_trait;

/// One category's confidence score from the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub category: String,
    /// Confidence from 0.0 (absent) to 1.0 (certain)
    pub score: f64,
}

/// Per-category scores for a single input text.
///
/// Categories keep the order the classifier returned them in; the
/// pipeline's first-match policy depends on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModerationResult {
    pub scores: Vec<CategoryScore>,
}

impl ModerationResult {
    /// Build a result from `(category, score)` pairs, preserving order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            scores: pairs
                .into_iter()
                .map(|(category, score)| CategoryScore {
                    category: category.into(),
                    score,
                })
                .collect(),
        }
    }

    /// The first category scoring strictly above `threshold`, in response order.
    pub fn first_exceeding(&self, threshold: f64) -> Option<&CategoryScore> {
        self.scores.iter().find(|entry| entry.score > threshold)
    }

    /// The highest-scoring category, if any. Used for diagnostics only.
    pub fn top_category(&self) -> Option<&CategoryScore> {
        self.scores
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Trait for classifying text. Implementations must be async because
/// the real classifier is an HTTP API.
///
/// Any failure (transport, status, response shape) is reported as a plain
/// error; callers don't distinguish between them.
#[async_trait]
pub trait ModerationClient: Send + Sync {
    /// Score a single text against every category the classifier knows.
    async fn classify(&self, text: &str) -> Result<ModerationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_exceeding_respects_response_order() {
        let result = ModerationResult::from_pairs([
            ("harassment", 0.2),
            ("hate", 0.93),
            ("violence", 0.99),
        ]);
        let hit = result.first_exceeding(0.9).unwrap();
        assert_eq!(hit.category, "hate");
        assert_eq!(hit.score, 0.93);
    }

    #[test]
    fn test_first_exceeding_is_strict() {
        let result = ModerationResult::from_pairs([("violence", 0.9)]);
        assert!(result.first_exceeding(0.9).is_none());
    }

    #[test]
    fn test_first_exceeding_empty_result() {
        assert!(ModerationResult::default().first_exceeding(0.9).is_none());
    }

    #[test]
    fn test_top_category_picks_max() {
        let result = ModerationResult::from_pairs([
            ("harassment", 0.2),
            ("hate", 0.93),
            ("violence", 0.99),
        ]);
        assert_eq!(result.top_category().unwrap().category, "violence");
    }
}
