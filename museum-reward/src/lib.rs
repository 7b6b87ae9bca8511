//! Reward engine for The Stoned Museum backend.
//!
//! Pure calculators for the mining and staking economies. All database
//! access stays with the callers (`museum-web-api`, `museum-reward-service`);
//! this crate only maps rows that were already read into currency deltas.

pub mod error;
pub mod mining;
pub mod staking;

pub use error::RewardError;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Fractional days between two epoch-second timestamps.
///
/// Clock skew can make `now` lag a freshly written `started_at`; clamp to
/// zero instead of producing a negative reward period.
pub fn days_elapsed(started_at: i64, now: i64) -> f64 {
    if now <= started_at {
        return 0.0;
    }
    (now - started_at) as f64 / SECONDS_PER_DAY as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_elapsed_is_fractional() {
        assert_eq!(days_elapsed(0, SECONDS_PER_DAY), 1.0);
        assert_eq!(days_elapsed(0, SECONDS_PER_DAY / 2), 0.5);
        assert_eq!(days_elapsed(0, 365 * SECONDS_PER_DAY), 365.0);
    }

    #[test]
    fn days_elapsed_clamps_negative_spans() {
        assert_eq!(days_elapsed(100, 50), 0.0);
        assert_eq!(days_elapsed(100, 100), 0.0);
    }
}
