//! Currency ledger: credits, debits, premium conversion and shop purchases.

use crate::rpg::catalog::{self, CatalogEntry};
use crate::rpg::errors::RpgError;
use crate::rpg::types::{Economy, Item, UserRecord};

/// BMN spent per BB gained.
pub const CONVERSION_RATE: u64 = 100;

// ============================================================================
// Balances
// ============================================================================

pub fn credit_bb(economy: &mut Economy, amount: u64) {
    economy.baddie_bucks = economy.baddie_bucks.saturating_add(amount);
}

/// Debit BB, refusing to go below zero.
pub fn debit_bb(economy: &mut Economy, amount: u64) -> Result<(), RpgError> {
    if economy.baddie_bucks < amount {
        return Err(RpgError::InsufficientFunds {
            needed: amount,
            available: economy.baddie_bucks,
        });
    }
    economy.baddie_bucks -= amount;
    Ok(())
}

pub fn credit_bmn(economy: &mut Economy, amount: u64) {
    economy.black_musical_notes = economy.black_musical_notes.saturating_add(amount);
}

// ============================================================================
// Conversion
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub bmn_spent: u64,
    pub bb_gained: u64,
}

/// Convert premium notes to BB at [`CONVERSION_RATE`]. Only whole multiples
/// of the rate are spent; the remainder stays in the BMN balance.
pub fn convert_bmn(economy: &mut Economy, amount: i64) -> Result<Conversion, RpgError> {
    if amount <= 0 {
        return Err(RpgError::InvalidInput(
            "you have to convert at least 1 BMN".to_string(),
        ));
    }
    let amount = amount as u64;
    if economy.black_musical_notes < amount {
        return Err(RpgError::InsufficientFunds {
            needed: amount,
            available: economy.black_musical_notes,
        });
    }

    let bb_gained = amount / CONVERSION_RATE;
    if bb_gained == 0 {
        return Err(RpgError::InvalidInput(format!(
            "you need at least {} BMN to get 1 BB",
            CONVERSION_RATE
        )));
    }

    let bmn_spent = bb_gained * CONVERSION_RATE;
    economy.black_musical_notes -= bmn_spent;
    credit_bb(economy, bb_gained);
    Ok(Conversion { bmn_spent, bb_gained })
}

// ============================================================================
// Shop
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub item_name: &'static str,
    pub amount: u64,
    pub total_cost: u64,
}

/// Buy `amount` copies of a shop or equipment entry.
///
/// Checks run in order: listing, amount, funds, level. Each copy is a fresh
/// full-quality instance worth half the unit price.
pub fn buy_item(record: &mut UserRecord, item_id: &str, amount: i64) -> Result<Purchase, RpgError> {
    let entry = catalog::lookup_item(item_id)
        .filter(|e| matches!(e, CatalogEntry::Shop(_) | CatalogEntry::Equipment(_)))
        .ok_or_else(|| RpgError::NotFound(format!("{} is not for sale", item_id)))?;
    if amount <= 0 {
        return Err(RpgError::InvalidInput("you must buy at least 1 item".to_string()));
    }
    let amount = amount as u64;

    let unit_cost = entry
        .cost()
        .ok_or_else(|| RpgError::Internal(format!("{} has no price", item_id)))?;
    let total_cost = unit_cost
        .checked_mul(amount)
        .ok_or_else(|| RpgError::InvalidInput("that is far too many".to_string()))?;
    if record.economy.baddie_bucks < total_cost {
        return Err(RpgError::InsufficientFunds {
            needed: total_cost,
            available: record.economy.baddie_bucks,
        });
    }
    if let Some(required) = entry.level_req() {
        if record.rpg.level < required {
            return Err(RpgError::InsufficientLevel {
                required,
                current: record.rpg.level,
            });
        }
    }

    debit_bb(&mut record.economy, total_cost)?;
    let minted: Item = entry.mint();
    record
        .inventory
        .items
        .extend(std::iter::repeat(minted).take(amount as usize));

    Ok(Purchase {
        item_name: entry.name(),
        amount,
        total_cost,
    })
}

/// Shop listing text: consumables first, then equipment.
pub fn format_shop(balance: u64) -> String {
    let mut out = format!("Black Market Shop. You have {} BB.\n", balance);
    out.push_str("-- Consumables & Utility --\n");
    for d in catalog::SHOP_ITEMS {
        out.push_str(&format!(
            "[{}] {} `{}` {} BB\n  {}\n",
            d.rarity.name(),
            d.name,
            d.id,
            d.cost,
            d.description
        ));
    }
    out.push_str("-- Permanent Equipment --\n");
    for d in catalog::EQUIPMENT_ITEMS {
        out.push_str(&format!(
            "[{}] {} `{}` {} BB (Lv. {}+)\n",
            d.rarity.name(),
            d.name,
            d.id,
            d.cost,
            d.level_req
        ));
    }
    out.push_str("All sales are final.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(bb: u64) -> UserRecord {
        let mut record = UserRecord::new("tester", 0);
        record.economy.baddie_bucks = bb;
        record
    }

    #[test]
    fn test_convert_keeps_remainder() {
        let mut economy = Economy { baddie_bucks: 0, black_musical_notes: 250 };
        let c = convert_bmn(&mut economy, 250).unwrap();
        assert_eq!(c, Conversion { bmn_spent: 200, bb_gained: 2 });
        assert_eq!(economy.baddie_bucks, 2);
        assert_eq!(economy.black_musical_notes, 50);
    }

    #[test]
    fn test_convert_rejections() {
        let mut economy = Economy { baddie_bucks: 0, black_musical_notes: 150 };
        assert!(matches!(convert_bmn(&mut economy, 0), Err(RpgError::InvalidInput(_))));
        assert!(matches!(convert_bmn(&mut economy, -5), Err(RpgError::InvalidInput(_))));
        assert!(matches!(
            convert_bmn(&mut economy, 151),
            Err(RpgError::InsufficientFunds { needed: 151, available: 150 })
        ));
        assert!(matches!(convert_bmn(&mut economy, 99), Err(RpgError::InvalidInput(_))));
        assert_eq!(economy.black_musical_notes, 150);
    }

    #[test]
    fn test_debit_never_goes_negative() {
        let mut economy = Economy { baddie_bucks: 10, black_musical_notes: 0 };
        assert!(debit_bb(&mut economy, 11).is_err());
        assert_eq!(economy.baddie_bucks, 10);
        debit_bb(&mut economy, 10).unwrap();
        assert_eq!(economy.baddie_bucks, 0);
    }

    #[test]
    fn test_buy_multiple_consumables() {
        let mut record = funded(2_000);
        let p = buy_item(&mut record, "vivi_serum", 3).unwrap();
        assert_eq!(p.total_cost, 1_500);
        assert_eq!(record.economy.baddie_bucks, 500);
        assert_eq!(record.count_item("vivi_serum"), 3);
        assert!(record.inventory.items.iter().all(|i| i.value == 250 && i.quality == 100));
    }

    #[test]
    fn test_buy_checks_listing_funds_and_level() {
        let mut record = funded(20_000);
        assert!(matches!(buy_item(&mut record, "slime_gel", 1), Err(RpgError::NotFound(_))));
        assert!(matches!(buy_item(&mut record, "vivi_serum", 0), Err(RpgError::InvalidInput(_))));
        assert!(matches!(
            buy_item(&mut record, "zaki_choker", 1),
            Err(RpgError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            buy_item(&mut record, "yoshi_dual_gun", 1),
            Err(RpgError::InsufficientLevel { required: 10, current: 1 })
        ));
        assert_eq!(record.economy.baddie_bucks, 20_000);
        assert!(record.inventory.items.is_empty());

        record.rpg.level = 10;
        buy_item(&mut record, "yoshi_dual_gun", 1).unwrap();
        assert_eq!(record.economy.baddie_bucks, 5_000);
        assert_eq!(record.inventory.items[0].value, 7_500);
    }
}
