// Decision engine — the per-request validation pipeline.
//
// Stages run in a fixed order and each can end the request early:
//   1. empty input      → blocked, no rate budget spent
//   2. rate limit       → blocked, classifier not called
//   3. classifier call  → blocked if it fails in any way (fail closed)
//   4. score check      → blocked on the first category over the threshold
//   5. otherwise        → passed, input echoed back verbatim
//
// The classifier call is the only await point and runs under a timeout.
// Every request gets a well-formed decision; nothing here returns an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::decision::{BlockReason, ValidationDecision, ValidationRequest};
use crate::config::Config;
use crate::moderation::traits::{ModerationClient, ModerationResult};
use crate::rate_limit::RateLimiter;

/// Tracing target for security events; the security log file only sees this.
pub const SECURITY_TARGET: &str = "contentgate::security";

/// Interpretation settings for classifier output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    /// A category must score strictly above this to block.
    pub confidence_threshold: f64,
    /// Upper bound on the classifier call.
    pub moderation_timeout: Duration,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            confidence_threshold: crate::config::DEFAULT_CONFIDENCE_THRESHOLD,
            moderation_timeout: Duration::from_secs(
                crate::config::DEFAULT_MODERATION_TIMEOUT_SECS,
            ),
        }
    }
}

impl DecisionPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            moderation_timeout: config.moderation_timeout,
        }
    }
}

/// Orchestrates rate limiting, classification and score interpretation.
pub struct DecisionEngine {
    limiter: Arc<RateLimiter>,
    client: Arc<dyn ModerationClient>,
    policy: DecisionPolicy,
}

impl DecisionEngine {
    pub fn new(
        limiter: Arc<RateLimiter>,
        client: Arc<dyn ModerationClient>,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            limiter,
            client,
            policy,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Run one request through the pipeline.
    pub async fn decide(&self, request: &ValidationRequest) -> ValidationDecision {
        self.decide_at(request, Instant::now()).await
    }

    /// Same as `decide`, with the rate-limit clock supplied by the caller.
    pub async fn decide_at(&self, request: &ValidationRequest, now: Instant) -> ValidationDecision {
        match self.evaluate(request, now).await {
            Ok(()) => ValidationDecision::passed(&request.input),
            Err(reason) => ValidationDecision::blocked(&reason),
        }
    }

    async fn evaluate(&self, request: &ValidationRequest, now: Instant) -> Result<(), BlockReason> {
        if is_blank(&request.input) {
            debug!(user_id = %request.user_id, "Rejected empty input");
            return Err(BlockReason::EmptyInput);
        }

        let admission = self.limiter.admit(&request.user_id, now);
        if !admission.allowed {
            info!(user_id = %request.user_id, "Rate limit exceeded");
            return Err(BlockReason::RateLimitExceeded);
        }

        let result = self.classify(request).await?;

        match interpret(&result, self.policy.confidence_threshold) {
            Some(reason) => {
                warn!(
                    target: SECURITY_TARGET,
                    user_id = %request.user_id,
                    category = %request.category,
                    reason = %reason,
                    "Blocked content from user {} | reason={}",
                    request.user_id,
                    reason,
                );
                Err(reason)
            }
            None => {
                debug!(
                    user_id = %request.user_id,
                    remaining = admission.remaining,
                    "Input passed"
                );
                Ok(())
            }
        }
    }

    /// Call the classifier under the policy timeout. Any failure becomes
    /// `ModerationServiceUnavailable`; the detail only goes to the log.
    async fn classify(&self, request: &ValidationRequest) -> Result<ModerationResult, BlockReason> {
        let call = self.client.classify(&request.input);
        match tokio::time::timeout(self.policy.moderation_timeout, call).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                warn!(user_id = %request.user_id, error = %e, "Moderation call failed");
                Err(BlockReason::ModerationServiceUnavailable)
            }
            Err(_) => {
                warn!(
                    user_id = %request.user_id,
                    timeout_secs = self.policy.moderation_timeout.as_secs_f64(),
                    "Moderation call timed out"
                );
                Err(BlockReason::ModerationServiceUnavailable)
            }
        }
    }
}

/// True when `input` is only whitespace. The ASCII information separators
/// U+001C..U+001F count as whitespace too.
pub fn is_blank(input: &str) -> bool {
    input
        .trim_matches(|c: char| c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c))
        .is_empty()
}

/// Map classifier scores to a block reason, if any category trips the threshold.
///
/// First match in response order wins; a later, higher score doesn't
/// override it.
pub fn interpret(result: &ModerationResult, threshold: f64) -> Option<BlockReason> {
    result
        .first_exceeding(threshold)
        .map(|hit| BlockReason::ContentFlagged {
            category: hit.category.clone(),
            score: hit.score,
        })
}
