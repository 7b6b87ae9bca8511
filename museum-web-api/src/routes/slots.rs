use crate::dto::{
    ArtworkDetails, AssignArtworkRequest, AuthToken, ResponseData, SlotDetails, SlotNumberRequest,
    DB_ERROR_MESSAGE, RESPONSE_INTERNAL_ERROR, RESPONSE_OK,
};
use crate::pool::{Db, MuseumConfig};
use museum_db_entity::db::artwork::Entity as Artwork;
use museum_db_entity::db::museum_slot::{
    ActiveModel as SlotActiveModel, Column as SlotColumn, Entity as MuseumSlot, Model as SlotModel,
};
use museum_reward::RewardError;
use rocket::{serde::json::Json, State};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder,
};
use sea_orm_rocket::Connection;
use tracing::{error, info};

/// Gallery capacity grows with the curator's level.
pub(crate) fn max_slots_for_level(level: i32) -> i32 {
    if level >= 10 {
        30
    } else if level >= 5 {
        20
    } else {
        10
    }
}

fn required_level_for_slot(slot_number: i32) -> i32 {
    if slot_number > 20 {
        10
    } else if slot_number > 10 {
        5
    } else {
        1
    }
}

/// A write that tripped one of the museum_slot unique indexes lost a race
/// with a concurrent request; it is answered like the sequential conflict.
fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    error
        .to_string()
        .contains("duplicate key value violates unique constraint")
}

#[get("/slots?<wallet>", format = "application/json")]
pub async fn get_slots(
    conn: Connection<'_, Db>,
    wallet: String,
) -> Json<ResponseData<Vec<SlotDetails>>> {
    let db = conn.into_inner();
    let user = match super::find_user(db, &wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let slots = match MuseumSlot::find()
        .filter(SlotColumn::UserId.eq(user.id))
        .order_by_asc(SlotColumn::SlotNumber)
        .all(db)
        .await
    {
        Ok(slots) => slots,
        Err(error) => {
            error!("Error fetching slots for {}: {:?}", user.id, error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };

    let mut details = Vec::with_capacity(slots.len());
    for slot in slots {
        let artwork = match slot.artwork_mint {
            Some(ref mint) => match Artwork::find_by_id(mint.to_owned()).one(db).await {
                Ok(Some(artwork)) => Some(ArtworkDetails {
                    mint: artwork.mint,
                    name: artwork.name,
                    rarity: artwork.rarity,
                    gp: artwork.gp,
                    artist: artwork.artist,
                }),
                Ok(None) => None,
                Err(error) => {
                    error!("Error fetching artwork {}: {:?}", mint, error);
                    return Json(ResponseData::new(
                        RESPONSE_INTERNAL_ERROR,
                        DB_ERROR_MESSAGE.to_owned(),
                        None,
                    ));
                }
            },
            None => None,
        };
        details.push(SlotDetails {
            slot_number: slot.slot_number,
            artwork,
            unlocked_at: slot.unlocked_at,
        });
    }
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), Some(details)))
}

async fn find_slot(
    db: &DatabaseConnection,
    user_id: i32,
    slot_number: i32,
) -> Result<Option<SlotModel>, (u16, String)> {
    MuseumSlot::find()
        .filter(SlotColumn::UserId.eq(user_id))
        .filter(SlotColumn::SlotNumber.eq(slot_number))
        .one(db)
        .await
        .map_err(|error| {
            error!("Error fetching slot {}: {:?}", slot_number, error);
            (RESPONSE_INTERNAL_ERROR, DB_ERROR_MESSAGE.to_owned())
        })
}

/// Hangs an owned artwork in an unlocked slot. One artwork can hang in at
/// most one slot across the whole museum.
#[post("/slots/assign", format = "application/json", data = "<assign_request>")]
pub async fn assign_artwork(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    auth_token: AuthToken<'_>,
    assign_request: Json<AssignArtworkRequest>,
) -> Json<ResponseData<String>> {
    if let Err((code, message)) =
        super::wallet_auth::authorize(&museum_config.jwt_key, &assign_request.wallet, &auth_token)
            .await
    {
        return Json(ResponseData::new(code, message, None));
    }

    let db = conn.into_inner();
    let user = match super::find_user(db, &assign_request.wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let artwork = match Artwork::find_by_id(assign_request.artwork_mint.to_owned())
        .one(db)
        .await
    {
        Ok(Some(artwork)) => artwork,
        Ok(None) => {
            return Json(ResponseData::rejected(&RewardError::not_found(format!(
                "Artwork not found: {}",
                assign_request.artwork_mint
            ))))
        }
        Err(error) => {
            error!(
                "Error fetching artwork {}: {:?}",
                assign_request.artwork_mint, error
            );
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };
    if artwork.owner_wallet.as_deref() != Some(assign_request.wallet.as_str()) {
        return Json(ResponseData::rejected(&RewardError::validation(
            "You don't own this artwork",
        )));
    }

    let occupied = match MuseumSlot::find()
        .filter(SlotColumn::ArtworkMint.eq(assign_request.artwork_mint.to_owned()))
        .one(db)
        .await
    {
        Ok(occupied) => occupied,
        Err(error) => {
            error!("Error checking artwork assignment: {:?}", error);
            return Json(ResponseData::new(
                RESPONSE_INTERNAL_ERROR,
                DB_ERROR_MESSAGE.to_owned(),
                None,
            ));
        }
    };
    if let Some(occupied) = occupied {
        if occupied.user_id != user.id || occupied.slot_number != assign_request.slot_number {
            return Json(ResponseData::rejected(&RewardError::conflict(
                "Artwork is already assigned to another slot",
            )));
        }
        // already hanging exactly where requested
        return Json(ResponseData::new(RESPONSE_OK, "".to_owned(), None));
    }

    let slot = match find_slot(db, user.id, assign_request.slot_number).await {
        Ok(Some(slot)) => slot,
        Ok(None) => {
            return Json(ResponseData::rejected(&RewardError::not_found(format!(
                "Slot {} is not unlocked",
                assign_request.slot_number
            ))))
        }
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let mut active = slot.into_active_model();
    active.artwork_mint = ActiveValue::Set(Some(assign_request.artwork_mint.to_owned()));
    if let Err(error) = active.update(db).await {
        if is_unique_violation(&error) {
            return Json(ResponseData::rejected(&RewardError::conflict(
                "Artwork is already assigned to another slot",
            )));
        }
        error!("Error assigning artwork: {:?}", error);
        return Json(ResponseData::new(
            RESPONSE_INTERNAL_ERROR,
            DB_ERROR_MESSAGE.to_owned(),
            None,
        ));
    }

    info!(
        "User {} hung {} in slot {}",
        user.id, assign_request.artwork_mint, assign_request.slot_number
    );
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), None))
}

#[post("/slots/remove", format = "application/json", data = "<remove_request>")]
pub async fn remove_artwork(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    auth_token: AuthToken<'_>,
    remove_request: Json<SlotNumberRequest>,
) -> Json<ResponseData<String>> {
    if let Err((code, message)) =
        super::wallet_auth::authorize(&museum_config.jwt_key, &remove_request.wallet, &auth_token)
            .await
    {
        return Json(ResponseData::new(code, message, None));
    }

    let db = conn.into_inner();
    let user = match super::find_user(db, &remove_request.wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    let slot = match find_slot(db, user.id, remove_request.slot_number).await {
        Ok(Some(slot)) => slot,
        Ok(None) => {
            return Json(ResponseData::rejected(&RewardError::not_found(format!(
                "Slot {} is not unlocked",
                remove_request.slot_number
            ))))
        }
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };
    if slot.artwork_mint.is_none() {
        return Json(ResponseData::rejected(&RewardError::validation(
            "Slot is already empty",
        )));
    }

    let mut active = slot.into_active_model();
    active.artwork_mint = ActiveValue::Set(None);
    if let Err(error) = active.update(db).await {
        error!("Error clearing slot: {:?}", error);
        return Json(ResponseData::new(
            RESPONSE_INTERNAL_ERROR,
            DB_ERROR_MESSAGE.to_owned(),
            None,
        ));
    }
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), None))
}

#[post("/slots/unlock", format = "application/json", data = "<unlock_request>")]
pub async fn unlock_slot(
    conn: Connection<'_, Db>,
    museum_config: &State<MuseumConfig>,
    auth_token: AuthToken<'_>,
    unlock_request: Json<SlotNumberRequest>,
) -> Json<ResponseData<String>> {
    if let Err((code, message)) =
        super::wallet_auth::authorize(&museum_config.jwt_key, &unlock_request.wallet, &auth_token)
            .await
    {
        return Json(ResponseData::new(code, message, None));
    }

    let db = conn.into_inner();
    let user = match super::find_user(db, &unlock_request.wallet).await {
        Ok(user) => user,
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    };

    if unlock_request.slot_number < 1 {
        return Json(ResponseData::rejected(&RewardError::validation(
            "Invalid slot number",
        )));
    }
    if unlock_request.slot_number > max_slots_for_level(user.level) {
        let required = required_level_for_slot(unlock_request.slot_number);
        return Json(ResponseData::rejected(&RewardError::validation(format!(
            "Slot {} requires level {}",
            unlock_request.slot_number, required
        ))));
    }

    match find_slot(db, user.id, unlock_request.slot_number).await {
        Ok(Some(_)) => {
            return Json(ResponseData::rejected(&RewardError::conflict(
                "Slot is already unlocked",
            )))
        }
        Ok(None) => {}
        Err((code, message)) => return Json(ResponseData::new(code, message, None)),
    }

    let slot = SlotActiveModel {
        id: ActiveValue::NotSet,
        user_id: ActiveValue::Set(user.id),
        slot_number: ActiveValue::Set(unlock_request.slot_number),
        artwork_mint: ActiveValue::Set(None),
        unlocked_at: ActiveValue::Set(chrono::Utc::now().timestamp()),
    };
    // the unique (user_id, slot_number) index catches a concurrent unlock
    if let Err(error) = slot.insert(db).await {
        if is_unique_violation(&error) {
            return Json(ResponseData::rejected(&RewardError::conflict(
                "Slot is already unlocked",
            )));
        }
        error!("Error unlocking slot: {:?}", error);
        return Json(ResponseData::new(
            RESPONSE_INTERNAL_ERROR,
            DB_ERROR_MESSAGE.to_owned(),
            None,
        ));
    }

    info!(
        "User {} unlocked slot {}",
        user.id, unlock_request.slot_number
    );
    Json(ResponseData::new(RESPONSE_OK, "".to_owned(), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_grows_with_level() {
        assert_eq!(max_slots_for_level(1), 10);
        assert_eq!(max_slots_for_level(4), 10);
        assert_eq!(max_slots_for_level(5), 20);
        assert_eq!(max_slots_for_level(9), 20);
        assert_eq!(max_slots_for_level(10), 30);
        assert_eq!(max_slots_for_level(42), 30);
    }

    #[test]
    fn required_level_matches_capacity_tiers() {
        assert_eq!(required_level_for_slot(10), 1);
        assert_eq!(required_level_for_slot(11), 5);
        assert_eq!(required_level_for_slot(20), 5);
        assert_eq!(required_level_for_slot(21), 10);
        assert_eq!(required_level_for_slot(30), 10);
    }

    #[test]
    fn unique_index_errors_are_conflicts() {
        let raced = sea_orm::DbErr::Query(sea_orm::RuntimeErr::Internal(
            "error returned from database: duplicate key value violates unique constraint \
             \"uq_museum_slot_artwork_mint\""
                .to_owned(),
        ));
        assert!(is_unique_violation(&raced));

        let unrelated = sea_orm::DbErr::Query(sea_orm::RuntimeErr::Internal(
            "connection closed".to_owned(),
        ));
        assert!(!is_unique_violation(&unrelated));
    }
}
