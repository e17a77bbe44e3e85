//! # Receipt Rate Limiter Module
//!
//! Sliding-window limit on receipt submissions per user. The limiter is a
//! pure decision over a user's submission timestamps; pruning and recording
//! the timestamps is the content store's job.

use crate::config::ReceiptLimits;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The submission may proceed
    Allowed,
    /// The cap is reached; retry after this many whole minutes
    Limited { wait_minutes: u64 },
}

/// Sliding-window limiter for receipt submissions
///
/// # Behavior
///
/// - Only timestamps strictly younger than the window count
/// - When `max_receipts` of them remain, the submission is refused and the
///   wait is measured until the oldest one ages out, rounded up to minutes
#[derive(Debug, Clone)]
pub struct ReceiptRateLimiter {
    limits: ReceiptLimits,
}

impl ReceiptRateLimiter {
    pub fn new(limits: ReceiptLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &ReceiptLimits {
        &self.limits
    }

    pub fn window_secs(&self) -> f64 {
        self.limits.window_secs as f64
    }

    /// Decide whether a submission at `now` is allowed given earlier submissions
    pub fn check(&self, history: &[f64], now: f64) -> RateDecision {
        let window = self.window_secs();
        let recent: Vec<f64> = history.iter().copied().filter(|ts| now - ts < window).collect();

        if recent.len() < self.limits.max_receipts {
            return RateDecision::Allowed;
        }

        let oldest = recent.iter().copied().fold(f64::INFINITY, f64::min);
        let remaining = (window - (now - oldest)).max(0.0);
        RateDecision::Limited {
            wait_minutes: (remaining / 60.0).ceil() as u64,
        }
    }
}

impl Default for ReceiptRateLimiter {
    fn default() -> Self {
        Self::new(ReceiptLimits::default())
    }
}
