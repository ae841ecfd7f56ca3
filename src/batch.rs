//! Sequential batch processing with pacing between items

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Delay applied between items once a batch has at least `min_items` inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingTier {
    pub min_items: usize,
    pub delay: Duration,
}

/// Step function from batch size to the pause between consecutive items
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RateLimitPolicy {
    tiers: Vec<PacingTier>,
}

impl RateLimitPolicy {
    pub fn new(mut tiers: Vec<PacingTier>) -> Self {
        tiers.sort_by_key(|tier| tier.min_items);
        Self { tiers }
    }

    /// Spread `requests` evenly over `interval` regardless of batch size
    pub fn per_interval(requests: u32, interval: Duration) -> Self {
        let delay = interval / requests.max(1);
        Self::new(vec![PacingTier { min_items: 0, delay }])
    }

    /// No pause between items
    pub fn none() -> Self {
        Self::default()
    }

    /// Pause for a batch of `batch_size` items: the tier with the largest `min_items <= batch_size`
    pub fn delay_for(&self, batch_size: usize) -> Duration {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.min_items <= batch_size)
            .map(|tier| tier.delay)
            .unwrap_or(Duration::ZERO)
    }
}

/// Result for one batch input
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome<T> {
    Success(T),
    Failed { input: String, error: String },
}

impl<T> BatchOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Runs one operation per input, strictly in order, never aborting on a failed item
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    policy: RateLimitPolicy,
}

impl BatchProcessor {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Process every input and return one outcome per input in input order
    pub async fn run<T, E, F, Fut>(&self, inputs: &[String], mut operation: F) -> Vec<BatchOutcome<T>>
    where
        E: Display,
        F: FnMut(&str) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let total = inputs.len();
        let delay = self.policy.delay_for(total);
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(total);

        info!("🚀 Processing batch of {} items ({:?} between items)", total, delay);

        for (index, input) in inputs.iter().enumerate() {
            info!("🎬 [{}/{}] {}", index + 1, total, input);

            let outcome = match operation(input).await {
                Ok(value) => BatchOutcome::Success(value),
                Err(e) => {
                    warn!("❌ [{}/{}] {} failed: {}", index + 1, total, input, e);
                    BatchOutcome::Failed {
                        input: input.clone(),
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);

            if index + 1 < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(
            "✅ Batch complete: {} succeeded, {} failed in {:.1}s",
            succeeded,
            total - succeeded,
            started.elapsed().as_secs_f64()
        );

        outcomes
    }
}
