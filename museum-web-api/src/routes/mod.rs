use crate::dto::{DB_ERROR_MESSAGE, RESPONSE_INTERNAL_ERROR, RESPONSE_NOT_FOUND};
use museum_db_entity::db::user_data::{Column as UserColumn, Entity as User, Model as UserModel};
use rocket::fairing::AdHoc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{error, warn};

pub mod convert;
pub mod mining;
pub mod profile;
pub mod slots;
pub mod staking;
pub mod wallet_auth;

pub fn mount() -> AdHoc {
    AdHoc::on_ignite("Attaching Routes", |rocket| async {
        rocket.mount(
            "/",
            routes![
                convert::convert,
                mining::get_rate,
                mining::get_rewards,
                mining::claim,
                profile::get_profile,
                slots::get_slots,
                slots::assign_artwork,
                slots::remove_artwork,
                slots::unlock_slot,
                staking::get_pool_stats,
                staking::get_rewards,
                staking::stake,
                staking::unstake,
                staking::claim,
                wallet_auth::login,
                wallet_auth::verify
            ],
        )
    })
}

/// Looks up a user row by wallet. Failures come back as a ready-to-send
/// (code, message) pair.
pub async fn find_user(
    db: &DatabaseConnection,
    wallet: &str,
) -> Result<UserModel, (u16, String)> {
    match User::find()
        .filter(UserColumn::WalletAddress.eq(wallet))
        .one(db)
        .await
    {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            let message = format!("User not found: {}", wallet);
            warn!("{}", message);
            Err((RESPONSE_NOT_FOUND, message))
        }
        Err(error) => {
            error!("Error fetching user {}: {:?}", wallet, error);
            Err((RESPONSE_INTERNAL_ERROR, DB_ERROR_MESSAGE.to_owned()))
        }
    }
}
