//! Inventory management: adding, selling, equipping and item suggestions.

use std::collections::BTreeMap;

use crate::rpg::errors::RpgError;
use crate::rpg::economy::credit_bb;
use crate::rpg::types::{EquipSlot, Item, StatBonus, UserRecord};

/// Maximum suggestions returned to an autocomplete request.
pub const MAX_SUGGESTIONS: usize = 25;

/// Maximum item lines shown by [`format_inventory`].
pub const INVENTORY_PAGE: usize = 25;

/// Gacha ticket item id.
pub const GACHA_TICKET_ID: &str = "gacha_ticket_basic";

// ============================================================================
// Inventory Operations
// ============================================================================

pub fn add_items(record: &mut UserRecord, items: impl IntoIterator<Item = Item>) {
    record.inventory.items.extend(items);
}

/// Remove the first item with exactly this id.
pub fn take_first(record: &mut UserRecord, item_id: &str) -> Option<Item> {
    let pos = record.inventory.items.iter().position(|i| i.id == item_id)?;
    Some(record.inventory.items.remove(pos))
}

/// Remove exactly `count` items with this id, newest first. Fails without
/// touching the inventory when fewer are owned.
pub fn remove_count(record: &mut UserRecord, item_id: &str, count: usize) -> Result<(), RpgError> {
    let owned = record.count_item(item_id);
    if owned < count {
        return Err(RpgError::InvalidInput(format!(
            "need {} {} but only have {}",
            count, item_id, owned
        )));
    }
    let mut left = count;
    let items = &mut record.inventory.items;
    let mut idx = items.len();
    while left > 0 && idx > 0 {
        idx -= 1;
        if items[idx].id == item_id {
            items.remove(idx);
            left -= 1;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleOutcome {
    pub items_sold: usize,
    pub total_value: u64,
    /// Display name of the sold items, when anything sold.
    pub item_name: Option<String>,
}

/// Sell every item matching `needle` by id or case-insensitive name.
///
/// Selling something not owned sells nothing and leaves balances alone.
pub fn sell_items(record: &mut UserRecord, needle: &str) -> SaleOutcome {
    let needle = needle.trim();
    let mut outcome = SaleOutcome {
        items_sold: 0,
        total_value: 0,
        item_name: None,
    };

    record.inventory.items.retain(|item| {
        if item.matches(needle) {
            outcome.items_sold += 1;
            outcome.total_value += item.value;
            outcome.item_name = Some(item.name.clone());
            false
        } else {
            true
        }
    });

    credit_bb(&mut record.economy, outcome.total_value);
    outcome
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipOutcome {
    pub slot: EquipSlot,
    pub equipped: String,
    pub unequipped: Option<String>,
}

/// Move the first inventory item with exactly `item_id` into its slot.
///
/// Any item already in the slot goes back to the end of the inventory, so the
/// item count across inventory and equipment never changes.
pub fn equip_item(record: &mut UserRecord, item_id: &str) -> Result<EquipOutcome, RpgError> {
    if !record.rpg.stats.has_class() {
        return Err(RpgError::InvalidInput(
            "choose a class before equipping gear".to_string(),
        ));
    }
    let pos = record
        .inventory
        .items
        .iter()
        .position(|i| i.id == item_id)
        .ok_or_else(|| RpgError::NotFound(format!("{} is not in your inventory", item_id)))?;

    let candidate = &record.inventory.items[pos];
    let slot = candidate.slot().ok_or_else(|| {
        RpgError::InvalidInput(format!("{} is not equippable", candidate.name))
    })?;
    if let Some(required) = candidate.level_req {
        if record.rpg.level < required {
            return Err(RpgError::InsufficientLevel {
                required,
                current: record.rpg.level,
            });
        }
    }

    let item = record.inventory.items.remove(pos);
    let equipped = item.name.clone();
    let previous = record.rpg.equipment.slot_mut(slot).replace(item);
    let unequipped = previous.map(|old| {
        let name = old.name.clone();
        record.inventory.items.push(old);
        name
    });

    Ok(EquipOutcome {
        slot,
        equipped,
        unequipped,
    })
}

/// Base stats plus every equipped bonus.
pub fn total_stats(record: &UserRecord) -> StatBonus {
    let base = &record.rpg.stats;
    let mut total = StatBonus {
        hp: base.hp,
        mana: base.mana,
        luck: base.luck,
        spirit_bond: base.spirit_bond,
        corruption: base.corruption,
        atk: 0,
        def: 0,
    };
    for bonus in record.rpg.equipment.iter().filter_map(|i| i.stats) {
        total.hp += bonus.hp;
        total.mana += bonus.mana;
        total.luck += bonus.luck;
        total.spirit_bond += bonus.spirit_bond;
        total.corruption += bonus.corruption;
        total.atk += bonus.atk;
        total.def += bonus.def;
    }
    total
}

// ============================================================================
// Display
// ============================================================================

/// One autocomplete choice: label shown to the user, value submitted back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub value: String,
}

/// Distinct owned item ids whose label contains `partial`, capped at
/// [`MAX_SUGGESTIONS`]. Order follows first appearance in the inventory.
pub fn suggest_items(record: &UserRecord, partial: &str) -> Vec<Suggestion> {
    let partial = partial.trim().to_lowercase();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut firsts: Vec<&Item> = Vec::new();
    for item in &record.inventory.items {
        let count = counts.entry(item.id.as_str()).or_insert(0);
        if *count == 0 {
            firsts.push(item);
        }
        *count += 1;
    }

    firsts
        .into_iter()
        .map(|item| Suggestion {
            label: format!(
                "({}) {} (You have: {})",
                item.rarity.name(),
                item.name,
                counts[item.id.as_str()]
            ),
            value: item.id.clone(),
        })
        .filter(|s| s.label.to_lowercase().contains(&partial))
        .take(MAX_SUGGESTIONS)
        .collect()
}

pub fn format_inventory(record: &UserRecord, owner: &str) -> String {
    let economy = &record.economy;
    let items = &record.inventory.items;
    let mut out = format!(
        "{}'s Inventory\nBB: {} | BMN: {} | Gacha Tickets: {}\n",
        owner,
        economy.baddie_bucks,
        economy.black_musical_notes,
        record.count_item(GACHA_TICKET_ID)
    );
    if items.is_empty() {
        out.push_str("Your inventory is empty. Go hunt or fish, lazybones.");
        return out;
    }
    for item in items.iter().take(INVENTORY_PAGE) {
        out.push_str(&format!(
            "[{}] {} (Q: {}%) - {} BB\n",
            item.rarity.name(),
            item.name,
            item.quality,
            item.value
        ));
    }
    if items.len() > INVENTORY_PAGE {
        out.push_str(&format!("...and {} more items.", items.len() - INVENTORY_PAGE));
    }
    out.trim_end().to_string()
}
