use museum_db_entity::db::artwork::Entity as Artwork;
use museum_db_entity::db::museum_slot::{Column as SlotColumn, Entity as MuseumSlot};
use museum_db_entity::db::user_data::{self, Model as UserModel};
use museum_reward::mining::{self, Rarity, SlottedArtwork};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, Statement, TransactionTrait,
};
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub total: u64,
    pub minted: i64,
}

impl CycleSummary {
    /// Folds one user's outcome into the counters.
    fn record(&mut self, outcome: &Result<Option<i64>, DbErr>) {
        self.total += 1;
        match outcome {
            Ok(Some(rate)) => {
                self.processed += 1;
                self.minted += rate;
            }
            Ok(None) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// A zero-rate gallery earns nothing this cycle and gets no ledger row.
fn earning_rate(pieces: &[SlottedArtwork], level: i32) -> Option<i64> {
    let rate = mining::hourly_rate(pieces, level);
    if rate > 0 {
        Some(rate)
    } else {
        None
    }
}

/// One mining cycle: walks every museum-pass holder, recomputes the hourly
/// rate from the artworks hanging in their slots, and credits each earning
/// user. A failure for one user is logged and the cycle moves on.
pub async fn process_mining_rewards(
    db: &DatabaseConnection,
    batch_size: u64,
) -> Result<CycleSummary, DbErr> {
    info!("Mining cycle started");
    let mut summary = CycleSummary::default();
    // mining requires a museum pass
    let mut pages = user_data::Entity::find()
        .filter(user_data::Column::MuseumPassMint.is_not_null())
        .paginate(db, batch_size);

    while let Some(users) = pages.fetch_and_next().await? {
        for user in users {
            let outcome = credit_user(db, &user).await;
            summary.record(&outcome);
            match outcome {
                Ok(Some(rate)) => info!("User {} mined {} $MUSEUM", user.id, rate),
                Ok(None) => {}
                Err(error) => warn!("Mining failed for user {}: {:?}", user.id, error),
            }
        }
    }

    info!(
        "Mining cycle completed: {} credited, {} skipped, {} failed of {}, {} $MUSEUM minted",
        summary.processed, summary.skipped, summary.failed, summary.total, summary.minted
    );
    Ok(summary)
}

/// Credits the hourly rate onto the user's balance and writes the matching
/// unclaimed ledger row in one transaction, so the ledger never shows an
/// accrual the balance is missing.
async fn credit_user(db: &DatabaseConnection, user: &UserModel) -> Result<Option<i64>, DbErr> {
    let pieces = load_slotted_artworks(db, user.id).await?;
    let rate = match earning_rate(&pieces, user.level) {
        Some(rate) => rate,
        None => return Ok(None),
    };

    let txn = db.begin().await?;
    txn.execute(Statement::from_sql_and_values(
        crate::sql_stmt::DB_BACKEND,
        crate::sql_stmt::CREDIT_MUSEUM_BALANCE,
        vec![user.id.into(), rate.into()],
    ))
    .await?;

    let reward = museum_db_entity::db::mining_reward::ActiveModel {
        id: ActiveValue::NotSet,
        user_id: ActiveValue::Set(user.id),
        amount: ActiveValue::Set(rate),
        mining_rate: ActiveValue::Set(rate),
        claimed: ActiveValue::Set(false),
        claimed_at: ActiveValue::Set(None),
        created_at: ActiveValue::Set(chrono::Utc::now().timestamp()),
    };
    reward.insert(&txn).await?;

    txn.commit().await?;
    Ok(Some(rate))
}

async fn load_slotted_artworks(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<SlottedArtwork>, DbErr> {
    let occupied = MuseumSlot::find()
        .filter(SlotColumn::UserId.eq(user_id))
        .filter(SlotColumn::ArtworkMint.is_not_null())
        .all(db)
        .await?;

    let mut pieces = Vec::with_capacity(occupied.len());
    for slot in occupied {
        let mint = match slot.artwork_mint {
            Some(ref mint) => mint.to_owned(),
            None => continue,
        };
        let artwork = match Artwork::find_by_id(mint.to_owned()).one(db).await? {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_gallery_earns_nothing() {
        assert_eq!(earning_rate(&[], 10), None);
    }

    #[test]
    fn occupied_gallery_earns_its_hourly_rate() {
        let pieces = [SlottedArtwork {
            gp: 100,
            rarity: Rarity::Epic,
        }];
        assert_eq!(earning_rate(&pieces, 1), Some(400));
    }

    #[test]
    fn summary_counts_each_outcome() {
        let mut summary = CycleSummary::default();
        summary.record(&Ok(Some(500)));
        summary.record(&Ok(Some(25)));
        summary.record(&Ok(None));
        summary.record(&Err(DbErr::Custom("connection reset".to_owned())));

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.minted, 525);
    }

    #[test]
    fn skipped_users_mint_nothing() {
        let mut summary = CycleSummary::default();
        summary.record(&Ok(None));
        summary.record(&Err(DbErr::Custom("timeout".to_owned())));
        assert_eq!(summary.minted, 0);
        assert_eq!(summary.processed, 0);
    }
}
