//! Persisted user records and the value types they are built from.
//!
//! Field names follow the on-disk JSON layout (`profile`, `account`, `rpg`,
//! `economy`, `inventory`, `meta`) so stores written by earlier bot versions
//! load unchanged. Quest fields added later default when absent.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::rpg::catalog::{self, RarityInfo};

/// Opaque platform user identifier.
pub type UserId = String;

/// Whole user store keyed by user id.
pub type UserMap = HashMap<UserId, UserRecord>;

/// Class id stored for characters that have not picked a class yet.
pub const NO_CLASS: &str = "none";

/// Account XP needed to leave `level`.
pub fn account_xp_required(level: u32) -> u64 {
    level as u64 * 100
}

/// RPG XP needed to leave `level`.
pub fn rpg_xp_required(level: u32) -> u64 {
    level as u64 * 250
}

// ============================================================================
// Rarity
// ============================================================================

/// Ordered rarity tiers; declaration order is the drop-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Divine,
}

impl Rarity {
    pub const ALL: [Rarity; 7] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
        Rarity::Divine,
    ];

    pub fn info(self) -> &'static RarityInfo {
        catalog::rarity_info(self)
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Floor of `base * value_mult`.
    pub fn scale_value(self, base: u64) -> u64 {
        (base as f64 * self.info().value_mult).floor() as u64
    }
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Weapon,
    Armor,
    Accessory,
    // Older stores carry the shop's finer-grained labels.
    #[serde(alias = "potion", alias = "bomb", alias = "utility", alias = "buff")]
    Consumable,
    Material,
}

/// Equipment slot an item occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipSlot {
    Weapon,
    Armor,
}

impl EquipSlot {
    pub fn name(self) -> &'static str {
        match self {
            EquipSlot::Weapon => "weapon",
            EquipSlot::Armor => "armor",
        }
    }
}

impl ItemType {
    /// Accessories share the armor slot.
    pub fn slot(self) -> Option<EquipSlot> {
        match self {
            ItemType::Weapon => Some(EquipSlot::Weapon),
            ItemType::Armor | ItemType::Accessory => Some(EquipSlot::Armor),
            ItemType::Consumable | ItemType::Material => None,
        }
    }
}

/// Stat bonus bundle carried by equipment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonus {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub hp: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub mana: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub luck: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub spirit_bond: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub corruption: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub atk: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub def: u32,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

/// A concrete owned item instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    /// Percentage, 0..=100.
    pub quality: u8,
    pub value: u64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatBonus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_req: Option<u32>,
}

impl Item {
    /// Matches an exact id or a case-insensitive display name.
    pub fn matches(&self, needle: &str) -> bool {
        self.id == needle || self.name.eq_ignore_ascii_case(needle)
    }

    pub fn slot(&self) -> Option<EquipSlot> {
        self.item_type.and_then(ItemType::slot)
    }
}

// ============================================================================
// User record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub title: String,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub fav_song: Option<String>,
    #[serde(default)]
    pub badges: BTreeSet<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            title: "Newbie Punk".to_string(),
            custom_name: None,
            fav_song: None,
            badges: BTreeSet::from(["new_user".to_string()]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub level: u32,
    pub xp: u64,
}

impl Default for Account {
    fn default() -> Self {
        Self { level: 1, xp: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterStats {
    /// Class id, or [`NO_CLASS`].
    #[serde(default = "default_class")]
    pub class: String,
    pub hp: u32,
    pub mana: u32,
    pub luck: u32,
    pub spirit_bond: u32,
    pub corruption: u32,
}

fn default_class() -> String {
    NO_CLASS.to_string()
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            class: default_class(),
            hp: 100,
            mana: 50,
            luck: 5,
            spirit_bond: 0,
            corruption: 0,
        }
    }
}

impl CharacterStats {
    pub fn has_class(&self) -> bool {
        !self.class.eq_ignore_ascii_case(NO_CLASS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default)]
    pub weapon: Option<Item>,
    #[serde(default)]
    pub armor: Option<Item>,
}

impl Equipment {
    pub fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Item> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.weapon.iter().chain(self.armor.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpgState {
    pub level: u32,
    pub xp: u64,
    #[serde(default)]
    pub stats: CharacterStats,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub active_quest_id: Option<String>,
    #[serde(default)]
    pub completed_quests: BTreeSet<String>,
    #[serde(default)]
    pub quest_progress: u32,
}

impl Default for RpgState {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            stats: CharacterStats::default(),
            equipment: Equipment::default(),
            active_quest_id: None,
            completed_quests: BTreeSet::new(),
            quest_progress: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Economy {
    #[serde(default)]
    pub baddie_bucks: u64,
    #[serde(default)]
    pub black_musical_notes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub first_seen: i64,
    #[serde(default)]
    pub last_seen: i64,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub monsters_hunted: u64,
    #[serde(default)]
    pub fish_caught: u64,
    /// Command key -> last use, milliseconds since the Unix epoch.
    #[serde(default)]
    pub cooldowns: HashMap<String, i64>,
}

/// Everything the bot remembers about one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub account: Account,
    #[serde(default)]
    pub rpg: RpgState,
    #[serde(default)]
    pub economy: Economy,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub meta: Meta,
}

impl UserRecord {
    pub fn new(username: &str, now_ms: i64) -> Self {
        Self {
            username: username.to_string(),
            profile: Profile::default(),
            account: Account::default(),
            rpg: RpgState::default(),
            economy: Economy::default(),
            inventory: Inventory::default(),
            meta: Meta {
                first_seen: now_ms,
                last_seen: now_ms,
                ..Meta::default()
            },
        }
    }

    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.profile
            .custom_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(if self.username.is_empty() { fallback } else { self.username.as_str() })
    }

    /// Count of inventory items with exactly this id.
    pub fn count_item(&self, item_id: &str) -> usize {
        self.inventory.items.iter().filter(|i| i.id == item_id).count()
    }
}

/// Back-fill quest fields for records written before quests existed and
/// repair a dangling active quest id.
///
/// Serde defaults already cover absent fields; this also clears an active id
/// that is unknown or already completed so the record satisfies the quest
/// invariant after load.
pub fn ensure_quest_data(record: &mut UserRecord) {
    let rpg = &mut record.rpg;
    if let Some(active) = rpg.active_quest_id.as_deref() {
        if catalog::quest(active).is_none() || rpg.completed_quests.contains(active) {
            rpg.active_quest_id = None;
            rpg.quest_progress = 0;
        }
    }
    if rpg.active_quest_id.is_none() {
        rpg.quest_progress = 0;
    }
}
