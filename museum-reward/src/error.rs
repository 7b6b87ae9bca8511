use thiserror::Error;

/// Rejection reasons surfaced by the reward engine.
///
/// None of these are retried automatically; each carries a human-readable
/// reason that is handed back to the caller as-is.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RewardError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Insufficient $MUSEUM balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },
}

impl RewardError {
    pub fn validation(reason: impl Into<String>) -> Self {
        RewardError::Validation(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        RewardError::NotFound(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        RewardError::Conflict(reason.into())
    }

    /// Response code used by the web boundary when serializing the rejection.
    pub fn response_code(&self) -> u16 {
        match self {
            RewardError::Validation(_) => 400,
            RewardError::NotFound(_) => 404,
            RewardError::Conflict(_) => 409,
            RewardError::InsufficientBalance { .. } => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_codes() {
        assert_eq!(RewardError::validation("bad input").response_code(), 400);
        assert_eq!(RewardError::not_found("no such slot").response_code(), 404);
        assert_eq!(RewardError::conflict("already staked").response_code(), 409);
        assert_eq!(
            RewardError::InsufficientBalance {
                required: 1000,
                available: 500
            }
            .response_code(),
            400
        );
    }

    #[test]
    fn insufficient_balance_names_both_amounts() {
        let message = RewardError::InsufficientBalance {
            required: 1000,
            available: 500,
        }
        .to_string();
        assert!(message.contains("1000"));
        assert!(message.contains("500"));
    }
}
