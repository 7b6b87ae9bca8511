use crate::dto::{
    AuthToken, ClaimOutcome, ClaimRequest, MiningRateDetails, MiningRewardsDetails, ResponseData,
    DB_ERROR_MESSAGE, RESPONSE_INTERNAL_ERROR, RESPONSE_OK,
};
use crate::pool::{Db, MuseumConfig};
use museum_reward::mining::{self, Rarity, SlottedArtwork};
use rocket::{serde::json::Json, State};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Statement,
    TransactionTrait,
};
use sea_orm_rocket::Connection;
use museum_db_entity::db::artwork::Entity as Artwork;
use museum_db_entity::db::museum_slot::{Column as SlotColumn, Entity as MuseumSlot};
use std::str::FromStr;
use tracing::{error, warn};

#[get("/mining/rate?<wallet>", format = "application/json")]
pub async fn get_rate(
    conn: Connection<'_, Db>,
    wallet: String,
) -> Json<ResponseData<MiningRateDetails>> {
    let db = conn.into_inner();
    let user = match super::find_user(db, &wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let pieces = match load_slotted_artworks(db, user.id).await {
        Ok(pieces) => pieces,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let details = MiningRateDetails {
        hourly_rate: mining::hourly_rate(&pieces, user.level),
        artworks_count: pieces.len(),
        level_bonus: mining::level_bonus(user.level),
    };
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), Some(details)))
}

#[get("/mining/rewards?<wallet>", format = "application/json")]
pub async fn get_rewards(
    conn: Connection<'_, Db>,
    wallet: String,
) -> Json<ResponseData<MiningRewardsDetails>> {
    let db = conn.into_inner();
    let user = match super::find_user(db, &wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let pieces = match load_slotted_artworks(db, user.id).await {
        Ok(pieces) => pieces,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let total_rewards = match db
        .query_one(Statement::from_sql_and_values(
            crate::sql_stmt::DB_BACKEND,
            crate::sql_stmt::UNCLAIMED_MINING_TOTAL,
            vec![user.id.into()],
        ))
        .await
    {
        Ok(Some(row)) => match row.try_get::<sea_orm::prelude::Decimal>("", "total_rewards") {
            Ok(total) => total.to_string().parse::<i64>().unwrap_or(0),
            Err(error) => {
                warn!("Could not parse total_rewards: {:?}", error);
                0
            }
        },
        Ok(None) => 0,
        Err(error) => {
            error!("Error fetching unclaimed rewards: {:?}", error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };

    let details = MiningRewardsDetails {
        total_rewards,
        hourly_rate: mining::hourly_rate(&pieces, user.level),
        artworks_count: pieces.len(),
    };
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), Some(details)))
}

/// Claims every unclaimed ledger row in one transaction: the rows are
/// marked and summed by a single UPDATE .. RETURNING, so a duplicate claim
/// racing this one finds nothing left to mark.
#[post("/mining/claim", format = "application/json", data = "<claim_request>")]
pub async fn claim(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    auth_token: AuthToken<'_>,
    claim_request: Json<ClaimRequest>,
) -> Json<ResponseData<ClaimOutcome>> {
    if let Err((code, message)) =
        super::wallet_auth::authorize(&museum_config.jwt_key, &claim_request.wallet, &auth_token)
            .await
    {
        return Json(ResponseData::new(code, message, None));
    }

    let db = conn.into_inner();
    let user = match super::find_user(db, &claim_request.wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(error) => {
            error!("Error opening claim transaction: {:?}", error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };

    let now = chrono::Utc::now().timestamp();
    let claimed_rows = match txn
        .query_all(Statement::from_sql_and_values(
            crate::sql_stmt::DB_BACKEND,
            crate::sql_stmt::CLAIM_MINING_REWARDS,
            vec![user.id.into(), now.into()],
        ))
        .await
    {
        Ok(rows) => rows,
        Err(error) => {
            error!("Error marking rewards claimed: {:?}", error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };

    let amounts: Vec<i64> = claimed_rows
        .iter()
        .filter_map(|row| row.try_get::<i64>("", "amount").ok())
        .collect();

    let total = match mining::claimable_total(&amounts) {
        Ok(total) => total,
        Err(rejection) => {
            // nothing marked, nothing to roll back, but end the transaction
            if let Err(error) = txn.rollback().await {
                warn!("Rollback failed: {:?}", error);
            }
            return Json(ResponseData::rejected(&rejection));
        }
    };

    if let Err(error) = txn
        .execute(Statement::from_sql_and_values(
            crate::sql_stmt::DB_BACKEND,
            crate::sql_stmt::CREDIT_MUSEUM_BALANCE,
            vec![user.id.into(), total.into()],
        ))
        .await
    {
        error!("Error crediting claimed rewards: {:?}", error);
        if let Err(error) = txn.rollback().await {
            warn!("Rollback failed: {:?}", error);
        }
        return Json(ResponseData::new(
            RESPONSE_INTERNAL_ERROR,
            DB_ERROR_MESSAGE.to_owned(),
            None,
        ));
    }

    if let Err(error) = txn.commit().await {
        error!("Error committing claim: {:?}", error);
        return Json(ResponseData::new(
            RESPONSE_INTERNAL_ERROR,
            DB_ERROR_MESSAGE.to_owned(),
            None,
        ));
    }

    Json(ResponseData::new(
        RESPONSE_OK,
        format!("Successfully claimed {} $MUSEUM", total),
        Some(ClaimOutcome { rewards: total }),
    ))
}

/// Reads the artworks sitting in a user's occupied slots, reduced to the
/// (gp, rarity) pairs the rate calculation needs.
pub async fn load_slotted_artworks(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<SlottedArtwork>, (u16, String)> {
    let occupied = MuseumSlot::find()
        .filter(SlotColumn::UserId.eq(user_id))
        .filter(SlotColumn::ArtworkMint.is_not_null())
        .all(db)
        .await
        .map_err(|error| {
            error!("Error fetching slots for user {}: {:?}", user_id, error);
            (RESPONSE_INTERNAL_ERROR, DB_ERROR_MESSAGE.to_owned())
        })?;

    let mut pieces = Vec::with_capacity(occupied.len());
    for slot in occupied {
        let mint = match slot.artwork_mint {
            Some(ref mint) => mint.to_owned(),
            None => continue,
        };
        let artwork = Artwork::find_by_id(mint.to_owned())
            .one(db)
            .await
            .map_err(|error| {
                error!("Error fetching artwork {}: {:?}", mint, error);
                (RESPONSE_INTERNAL_ERROR, DB_ERROR_MESSAGE.to_owned())
            })?;
        let artwork = match artwork {
            Some(artwork) => artwork,
            None => {
                warn!("Slot {} references missing artwork {}", slot.id, mint);
                continue;
            }
        };
        let rarity = match Rarity::from_str(&artwork.rarity) {
            Ok(rarity) => rarity,
            Err(_) => {
                warn!("Unknown rarity '{}' on artwork {}", artwork.rarity, mint);
                Rarity::Common
            }
        };
        pieces.push(SlottedArtwork {
            gp: artwork.gp,
            rarity,
        });
    }
    Ok(pieces)
}
