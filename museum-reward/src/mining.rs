//! Passive mining economy: gallery points in occupied slots turn into an
//! hourly $MUSEUM accrual rate.

use crate::error::RewardError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Artwork rarity tier. The string forms match the values stored in the
/// `artwork.rarity` column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub fn multiplier(&self) -> i64 {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 2,
            Rarity::Epic => 4,
            Rarity::Legendary => 8,
            Rarity::Mythic => 16,
        }
    }
}

/// One artwork sitting in a museum slot, reduced to what mining cares about.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlottedArtwork {
    pub gp: i32,
    pub rarity: Rarity,
}

/// Level bonus: +5% for every 5 full levels, uncapped.
pub fn level_bonus(level: i32) -> f64 {
    let bonus_levels = level / 5;
    1.0 + bonus_levels as f64 * 0.05
}

/// Mining weight of a single artwork before the level bonus.
pub fn contribution(gp: i32, rarity: Rarity) -> i64 {
    gp as i64 * rarity.multiplier()
}

/// Hourly $MUSEUM accrual for a set of slotted artworks.
///
/// An empty set yields 0, not an error: a user with no occupied slots
/// simply mines nothing this hour.
pub fn hourly_rate(pieces: &[SlottedArtwork], level: i32) -> i64 {
    if pieces.is_empty() {
        return 0;
    }
    let total_power: i64 = pieces
        .iter()
        .map(|piece| contribution(piece.gp, piece.rarity))
        .sum();
    (total_power as f64 * level_bonus(level)).floor() as i64
}

/// Total of the unclaimed ledger rows a claim would consume.
///
/// Claiming an empty (or non-positive) ledger is a rejected operation, so
/// a claim executed twice in a row credits exactly once.
pub fn claimable_total(unclaimed_amounts: &[i64]) -> Result<i64, RewardError> {
    let total: i64 = unclaimed_amounts.iter().sum();
    if unclaimed_amounts.is_empty() || total <= 0 {
        return Err(RewardError::validation("No rewards to claim"));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rarity_multiplier_table() {
        assert_eq!(Rarity::Common.multiplier(), 1);
        assert_eq!(Rarity::Rare.multiplier(), 2);
        assert_eq!(Rarity::Epic.multiplier(), 4);
        assert_eq!(Rarity::Legendary.multiplier(), 8);
        assert_eq!(Rarity::Mythic.multiplier(), 16);
    }

    #[test]
    fn rarity_round_trips_through_column_value() {
        assert_eq!(Rarity::from_str("Mythic").unwrap(), Rarity::Mythic);
        assert_eq!(Rarity::Legendary.to_string(), "Legendary");
        assert!(Rarity::from_str("Artifact").is_err());
    }

    #[test]
    fn level_bonus_steps_every_five_levels() {
        assert_eq!(level_bonus(1), 1.0);
        assert_eq!(level_bonus(4), 1.0);
        assert_eq!(level_bonus(5), 1.05);
        assert_eq!(level_bonus(9), 1.05);
        assert_eq!(level_bonus(10), 1.10);
        // uncapped
        assert_eq!(level_bonus(100), 2.0);
    }

    #[test]
    fn contribution_is_gp_times_multiplier() {
        assert_eq!(contribution(100, Rarity::Epic), 400);
        assert_eq!(contribution(1, Rarity::Mythic), 16);
        assert_eq!(contribution(50, Rarity::Common), 50);
    }

    #[test]
    fn hourly_rate_with_no_occupied_slots_is_zero() {
        assert_eq!(hourly_rate(&[], 10), 0);
    }

    #[test]
    fn hourly_rate_sums_contributions_then_applies_bonus() {
        let pieces = [
            SlottedArtwork {
                gp: 100,
                rarity: Rarity::Epic,
            },
            SlottedArtwork {
                gp: 50,
                rarity: Rarity::Rare,
            },
        ];
        // (400 + 100) * 1.0
        assert_eq!(hourly_rate(&pieces, 1), 500);
        // (400 + 100) * 1.05
        assert_eq!(hourly_rate(&pieces, 5), 525);
        // (400 + 100) * 1.10
        assert_eq!(hourly_rate(&pieces, 10), 550);
    }

    #[test]
    fn hourly_rate_floors_fractional_results() {
        let pieces = [SlottedArtwork {
            gp: 3,
            rarity: Rarity::Common,
        }];
        // 3 * 1.05 = 3.15
        assert_eq!(hourly_rate(&pieces, 5), 3);
    }

    #[test]
    fn claimable_total_sums_ledger_rows() {
        assert_eq!(claimable_total(&[100, 250, 40]).unwrap(), 390);
    }

    #[test]
    fn claim_with_nothing_unclaimed_is_rejected() {
        assert!(claimable_total(&[]).is_err());
        assert!(claimable_total(&[0]).is_err());
    }

    #[test]
    fn claiming_twice_without_new_accrual_credits_once() {
        let mut ledger = vec![120i64, 80];
        let first = claimable_total(&ledger).unwrap();
        assert_eq!(first, 200);
        // the claim marks every summed row, leaving nothing behind
        ledger.clear();
        assert!(claimable_total(&ledger).is_err());
    }
}
