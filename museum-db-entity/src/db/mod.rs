pub mod artwork;
pub mod conversion;
pub mod mining_reward;
pub mod museum_slot;
pub mod user_data;
