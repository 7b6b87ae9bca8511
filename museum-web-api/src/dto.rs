use museum_reward::staking::StakingPool;
use museum_reward::RewardError;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ResponseData<T> {
    pub code: Option<u16>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ResponseData<T> {
    pub fn new(code: u16, message: String, data: Option<T>) -> ResponseData<T> {
        ResponseData {
            code: Some(code),
            status_code: None,
            message,
            data,
        }
    }

    /// Envelope for an operation the reward engine rejected.
    pub fn rejected(error: &RewardError) -> ResponseData<T> {
        ResponseData::new(error.response_code(), error.to_string(), None)
    }
}

pub const RESPONSE_OK: u16 = 200;
pub const RESPONSE_BAD_REQUEST: u16 = 400;
pub const RESPONSE_UNAUTHORIZED: u16 = 401;
pub const RESPONSE_NOT_FOUND: u16 = 404;
pub const RESPONSE_CONFLICT: u16 = 409;
pub const RESPONSE_INTERNAL_ERROR: u16 = 500;

pub const DB_ERROR_MESSAGE: &str = "System error. Please contact administrator!";

#[derive(Debug)]
pub struct AuthToken<'r>(&'r str);

#[derive(Debug)]
pub enum ApiKeyError {
    Missing,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken<'r> {
    type Error = ApiKeyError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.headers().get_one("Authorization") {
            None => Outcome::Error((Status::BadRequest, ApiKeyError::Missing)),
            Some(key) => Outcome::Success(AuthToken(key)),
        }
    }
}

impl<'r> AuthToken<'r> {
    /// The raw JWT, with any `Bearer ` prefix stripped.
    pub fn token(&self) -> &str {
        match self.0.strip_prefix("Bearer ") {
            Some(token) => token,
            None => self.0,
        }
    }
}

impl<'r> fmt::Display for AuthToken<'r> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.token())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ProfileDetails {
    pub wallet_address: String,
    pub museum_pass_mint: Option<String>,
    pub level: i32,
    pub xp: i32,
    pub museum_balance: i64,
    pub stoned_balance: i64,
    pub staking_pool: String,
    pub staking_amount: i64,
    pub staking_started_at: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct MiningRateDetails {
    pub hourly_rate: i64,
    pub artworks_count: usize,
    pub level_bonus: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct MiningRewardsDetails {
    pub total_rewards: i64,
    pub hourly_rate: i64,
    pub artworks_count: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ClaimRequest {
    pub wallet: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ClaimOutcome {
    pub rewards: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PoolStats {
    pub pool: StakingPool,
    pub apy: f64,
    pub lock_days: i64,
    pub penalty: f64,
    pub tvl: i64,
    pub user_count: i64,
    pub user_staked: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StakingRewardsDetails {
    pub pool: StakingPool,
    pub staked_amount: i64,
    pub rewards: i64,
    pub days_staked: i64,
    pub lock_days: i64,
    pub can_unstake_without_penalty: bool,
    pub penalty: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StakeRequest {
    pub wallet: String,
    pub amount: i64,
    pub pool: StakingPool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UnstakeRequest {
    pub wallet: String,
    pub pool: StakingPool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct UnstakeDetails {
    pub staked_amount: i64,
    pub rewards: i64,
    pub penalty: i64,
    pub total_return: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ArtworkDetails {
    pub mint: String,
    pub name: String,
    pub rarity: String,
    pub gp: i32,
    pub artist: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SlotDetails {
    pub slot_number: i32,
    pub artwork: Option<ArtworkDetails>,
    pub unlocked_at: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct AssignArtworkRequest {
    pub wallet: String,
    pub slot_number: i32,
    pub artwork_mint: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SlotNumberRequest {
    pub wallet: String,
    pub slot_number: i32,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ConvertRequest {
    pub wallet: String,
    pub museum_amount: i64,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ConvertOutcome {
    pub museum_amount: i64,
    pub stoned_amount: i64,
    pub rate: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_envelope_carries_engine_code_and_reason() {
        let response: ResponseData<String> =
            ResponseData::rejected(&RewardError::conflict("already staked"));
        assert_eq!(response.code, Some(RESPONSE_CONFLICT));
        assert_eq!(response.message, "already staked");
        assert!(response.data.is_none());
    }
}
