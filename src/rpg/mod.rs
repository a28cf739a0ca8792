//! RPG game layer: data model, static catalog, progression engine, economy
//! ledger, quest state machine and the `/rpg` command processor.
//!
//! Everything below `commands` is synchronous and operates on a single
//! [`UserRecord`]; `commands` owns the load/mutate/save cycle against the
//! user store.

pub mod activities;
pub mod catalog;
pub mod commands;
pub mod economy;
pub mod errors;
pub mod inventory;
pub mod progression;
pub mod quest;
pub mod types;

pub use activities::{choose_class, explore, fish, hunt, pull_gacha};
pub use catalog::{lookup_item, Activity, CatalogEntry};
pub use commands::{format_level_up, RpgCommand, RpgService};
pub use economy::{buy_item, convert_bmn, credit_bb, credit_bmn, debit_bb, CONVERSION_RATE};
pub use errors::RpgError;
pub use inventory::{equip_item, sell_items, suggest_items, Suggestion};
pub use progression::{
    apply_account_level_ups, apply_rpg_level_ups, area_for_level, cooldown_remaining,
    generate_loot, roll_gacha, CooldownKind, LevelUpReport,
};
pub use quest::{accept_quest, complete_quest, record_activity};
pub use types::*;
