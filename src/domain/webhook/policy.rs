//! Retry/backoff policy for webhook delivery attempts.

use rand::Rng;
use std::time::Duration;

use crate::config::WebhooksConfig;

/// Backoff policy: exponential doubling from a base delay, capped, with
/// randomized jitter so simultaneous failures do not retry in lockstep.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl DeliveryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            attempt_timeout,
        }
    }

    /// Builds the policy from configuration.
    pub fn from_config(config: &WebhooksConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.attempt_timeout(),
        )
    }

    /// Deterministic backoff for the given completed attempt count:
    /// `base * 2^(attempts - 1)`, capped at `max_delay`.
    pub fn backoff(&self, attempts_so_far: u32) -> Duration {
        let exponent = attempts_so_far.saturating_sub(1).min(20);
        let factor = 2u64.saturating_pow(exponent);
        let millis = (self.base_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(millis).min(self.max_delay)
    }

    /// Backoff with multiplicative jitter in [0.5, 1.5).
    pub fn backoff_with_jitter(&self, attempts_so_far: u32) -> Duration {
        let base = self.backoff(attempts_so_far);
        let factor: f64 = rand::thread_rng().gen_range(0.5..1.5);
        Duration::from_millis((base.as_millis() as f64 * factor) as u64)
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::from_config(&WebhooksConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> DeliveryPolicy {
        DeliveryPolicy::new(
            5,
            Duration::from_millis(1_000),
            Duration::from_millis(60_000),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let p = policy();
        assert_eq!(p.backoff(1), Duration::from_millis(1_000));
        assert_eq!(p.backoff(2), Duration::from_millis(2_000));
        assert_eq!(p.backoff(3), Duration::from_millis(4_000));
        assert_eq!(p.backoff(4), Duration::from_millis(8_000));
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let p = policy();
        assert_eq!(p.backoff(30), Duration::from_millis(60_000));
    }

    #[test]
    fn jitter_stays_within_half_to_one_and_a_half() {
        let p = policy();
        for _ in 0..50 {
            let jittered = p.backoff_with_jitter(3).as_millis();
            assert!((2_000..6_000).contains(&jittered), "jittered = {}", jittered);
        }
    }

    #[test]
    fn default_policy_matches_config_defaults() {
        let p = DeliveryPolicy::default();
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.attempt_timeout, Duration::from_secs(30));
    }
}
