//! Static game tables: classes, rarities, areas, enemies, loot, shop,
//! equipment, gacha pool and quests.
//!
//! Everything here is immutable and lives for the whole process. Ids are the
//! same strings stored in user records, so renaming an entry orphans items.

use crate::rpg::types::{Item, ItemType, Rarity, StatBonus};

// ============================================================================
// Definitions
// ============================================================================

#[derive(Debug)]
pub struct RarityInfo {
    pub rarity: Rarity,
    pub name: &'static str,
    pub value_mult: f64,
    /// Percentage of the 0..100 gacha roll space.
    pub drop_chance: f64,
}

/// The five stats a class sets and grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassStats {
    pub hp: u32,
    pub mana: u32,
    pub luck: u32,
    pub spirit_bond: u32,
    pub corruption: u32,
}

#[derive(Debug)]
pub struct ClassDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub base_stats: ClassStats,
    pub stat_gains: ClassStats,
}

#[derive(Debug)]
pub struct AreaDef {
    pub id: &'static str,
    pub name: &'static str,
    pub level_req: u32,
    pub bb_mult: f64,
    /// The two rarities a drop slot picks between before any luck upgrade.
    pub rarity_range: [Rarity; 2],
}

#[derive(Debug)]
pub struct EnemyDef {
    pub name: &'static str,
    pub kind: &'static str,
    pub hp: u32,
    pub base_bb_drop: u64,
    pub base_xp_drop: u64,
    pub drop_slots: u32,
}

#[derive(Debug)]
pub struct LootTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: Rarity,
    pub base_value: u64,
}

#[derive(Debug)]
pub struct ShopItemDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u64,
    pub rarity: Rarity,
}

#[derive(Debug)]
pub struct EquipmentDef {
    pub id: &'static str,
    pub name: &'static str,
    pub item_type: ItemType,
    pub level_req: u32,
    pub cost: u64,
    pub rarity: Rarity,
    pub stats: StatBonus,
}

#[derive(Debug)]
pub struct GachaTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: Rarity,
    pub item_type: ItemType,
    pub base_value: u64,
    pub stats: StatBonus,
}

/// Repeatable action that activity quests count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Hunt,
    Fish,
    Explore,
}

impl Activity {
    pub fn name(self) -> &'static str {
        match self {
            Activity::Hunt => "hunt",
            Activity::Fish => "fish",
            Activity::Explore => "explore",
        }
    }
}

#[derive(Debug)]
pub enum QuestObjective {
    Activity { activity: Activity, count: u32 },
    Collection { item_id: &'static str, count: u32 },
}

#[derive(Debug)]
pub struct RewardItem {
    pub id: &'static str,
    pub count: u32,
}

#[derive(Debug)]
pub struct QuestRewards {
    pub xp: u64,
    pub bb: u64,
    pub items: &'static [RewardItem],
}

#[derive(Debug)]
pub struct QuestDef {
    pub id: &'static str,
    pub title: &'static str,
    pub giver: &'static str,
    pub level_req: u32,
    pub description: &'static str,
    pub objective: QuestObjective,
    pub rewards: QuestRewards,
}

// ============================================================================
// Tables
// ============================================================================

const fn stats(hp: u32, mana: u32, luck: u32, spirit_bond: u32, corruption: u32) -> ClassStats {
    ClassStats { hp, mana, luck, spirit_bond, corruption }
}

const fn bonus() -> StatBonus {
    StatBonus { hp: 0, mana: 0, luck: 0, spirit_bond: 0, corruption: 0, atk: 0, def: 0 }
}

pub static CLASSES: &[ClassDef] = &[
    ClassDef {
        id: "bully",
        name: "The Bully",
        description: "Focuses on HP and defense.",
        base_stats: stats(150, 30, 5, 0, 5),
        stat_gains: stats(15, 2, 0, 0, 0),
    },
    ClassDef {
        id: "revenant",
        name: "The Revenant",
        description: "A tank that soaks up darkness. High HP, feeds on corruption.",
        base_stats: stats(140, 40, 3, 0, 15),
        stat_gains: stats(14, 3, 0, 0, 1),
    },
    ClassDef {
        id: "punk",
        name: "The Punk",
        description: "Focuses on attack and speed.",
        base_stats: stats(100, 50, 7, 0, 10),
        stat_gains: stats(10, 5, 0, 0, 1),
    },
    ClassDef {
        id: "pumpkin_night",
        name: "The Pumpkin Night",
        description: "A wicked fighter who relies on tricks and corruption.",
        base_stats: stats(100, 50, 10, 0, 12),
        stat_gains: stats(10, 5, 1, 0, 1),
    },
    ClassDef {
        id: "dreamer",
        name: "The Dreamer",
        description: "Focuses on mana and spirit.",
        base_stats: stats(80, 100, 5, 10, 0),
        stat_gains: stats(7, 10, 0, 1, 0),
    },
    ClassDef {
        id: "muse",
        name: "The Muse",
        description: "A pure caster devoted to spirit bond and mana.",
        base_stats: stats(90, 120, 5, 15, 0),
        stat_gains: stats(8, 12, 0, 1, 0),
    },
    ClassDef {
        id: "jester",
        name: "The Jester",
        description: "A mad gambler. Luck drives every critical hit.",
        base_stats: stats(80, 60, 20, 0, 10),
        stat_gains: stats(7, 7, 2, 0, 0),
    },
    ClassDef {
        id: "imp",
        name: "The Imp",
        description: "Pure luck, tuned for finding rare items.",
        base_stats: stats(90, 50, 18, 5, 5),
        stat_gains: stats(8, 5, 2, 0, 0),
    },
    ClassDef {
        id: "idol",
        name: "The Idol",
        description: "Spirit bond and charm in a support role.",
        base_stats: stats(100, 70, 5, 18, 0),
        stat_gains: stats(10, 7, 0, 2, 0),
    },
    ClassDef {
        id: "alter_ego",
        name: "The Alter Ego",
        description: "Unpredictable. Balanced stats with a little luck and spirit.",
        base_stats: stats(90, 90, 12, 5, 5),
        stat_gains: stats(9, 9, 1, 1, 0),
    },
];

pub static RARITIES: [RarityInfo; 7] = [
    RarityInfo { rarity: Rarity::Common, name: "Common", value_mult: 1.0, drop_chance: 65.0 },
    RarityInfo { rarity: Rarity::Uncommon, name: "Uncommon", value_mult: 1.5, drop_chance: 22.5 },
    RarityInfo { rarity: Rarity::Rare, name: "Rare", value_mult: 2.0, drop_chance: 8.5 },
    RarityInfo { rarity: Rarity::Epic, name: "Epic", value_mult: 3.0, drop_chance: 2.5 },
    RarityInfo { rarity: Rarity::Legendary, name: "Legendary", value_mult: 5.0, drop_chance: 0.75 },
    RarityInfo { rarity: Rarity::Mythic, name: "Mythic", value_mult: 8.0, drop_chance: 0.2 },
    RarityInfo { rarity: Rarity::Divine, name: "Divine", value_mult: 10.0, drop_chance: 0.05 },
];

/// Ascending by `level_req`.
pub static AREAS: &[AreaDef] = &[
    AreaDef {
        id: "tier1",
        name: "Whispering Marsh",
        level_req: 1,
        bb_mult: 1.0,
        rarity_range: [Rarity::Common, Rarity::Uncommon],
    },
    AreaDef {
        id: "tier2",
        name: "Crystal Vale",
        level_req: 10,
        bb_mult: 1.2,
        rarity_range: [Rarity::Uncommon, Rarity::Rare],
    },
];

static TIER1_ENEMIES: &[EnemyDef] = &[
    EnemyDef {
        name: "Marsh Slime",
        kind: "Normal Monster",
        hp: 30,
        base_bb_drop: 30,
        base_xp_drop: 20,
        drop_slots: 1,
    },
    EnemyDef {
        name: "Shadow Stalker",
        kind: "Elite Monster",
        hp: 80,
        base_bb_drop: 100,
        base_xp_drop: 50,
        drop_slots: 2,
    },
];

static TIER1_LOOT: &[LootTemplate] = &[
    LootTemplate { id: "slime_gel", name: "Slime Gel", rarity: Rarity::Common, base_value: 5 },
    LootTemplate { id: "marsh_weed", name: "Marsh Weed", rarity: Rarity::Common, base_value: 3 },
    LootTemplate { id: "sturdy_stick", name: "Sturdy Stick", rarity: Rarity::Uncommon, base_value: 15 },
    LootTemplate { id: "tattered_cloth", name: "Tattered Cloth", rarity: Rarity::Uncommon, base_value: 12 },
    LootTemplate { id: "marsh_crystal", name: "Marsh Crystal", rarity: Rarity::Rare, base_value: 50 },
];

pub static FISHING_LOOT: &[LootTemplate] = &[
    LootTemplate { id: "glassfin", name: "Glassfin", rarity: Rarity::Common, base_value: 25 },
    LootTemplate { id: "rusty_can", name: "Rusty Can", rarity: Rarity::Common, base_value: 5 },
    LootTemplate { id: "whisper_koi", name: "Whisper Koi", rarity: Rarity::Uncommon, base_value: 45 },
    LootTemplate { id: "ember_eel", name: "Ember Eel", rarity: Rarity::Rare, base_value: 120 },
];

pub static SHOP_ITEMS: &[ShopItemDef] = &[
    ShopItemDef {
        id: "vivi_serum",
        name: "Vivi's Recovery Serum",
        description: "Restores 150 HP and removes one random negative status.",
        cost: 500,
        rarity: Rarity::Epic,
    },
    ShopItemDef {
        id: "ryu_grenade",
        name: "Ryu's Experimental Grenade",
        description: "Deals heavy area damage in combat.",
        cost: 800,
        rarity: Rarity::Epic,
    },
    ShopItemDef {
        id: "gacha_ticket_basic",
        name: "Gacha Ticket (Basic)",
        description: "Spent by the gacha command. Standard loot pool.",
        cost: 1000,
        rarity: Rarity::Rare,
    },
    ShopItemDef {
        id: "lucky_charm",
        name: "Lucky Charm (30m)",
        description: "Raises luck by 5% for 30 minutes.",
        cost: 5000,
        rarity: Rarity::Epic,
    },
];

pub static EQUIPMENT_ITEMS: &[EquipmentDef] = &[
    EquipmentDef {
        id: "yoshi_dual_gun",
        name: "Yoshi's Dual Gun",
        item_type: ItemType::Weapon,
        level_req: 10,
        cost: 15000,
        rarity: Rarity::Legendary,
        stats: StatBonus { atk: 25, luck: 5, corruption: 5, ..bonus() },
    },
    EquipmentDef {
        id: "zaki_choker",
        name: "Zaki's Choker",
        item_type: ItemType::Accessory,
        level_req: 15,
        cost: 30000,
        rarity: Rarity::Mythic,
        stats: StatBonus { hp: 30, mana: 200, spirit_bond: 20, corruption: 50, ..bonus() },
    },
];

pub static GACHA_LOOT: &[GachaTemplate] = &[
    GachaTemplate {
        id: "rusty_dagger",
        name: "Rusty Dagger",
        rarity: Rarity::Common,
        item_type: ItemType::Weapon,
        base_value: 50,
        stats: StatBonus { atk: 5, ..bonus() },
    },
    GachaTemplate {
        id: "broken_armor",
        name: "Broken Armor",
        rarity: Rarity::Common,
        item_type: ItemType::Armor,
        base_value: 70,
        stats: StatBonus { def: 5, ..bonus() },
    },
    GachaTemplate {
        id: "steel_knife",
        name: "Steel Knife",
        rarity: Rarity::Uncommon,
        item_type: ItemType::Weapon,
        base_value: 150,
        stats: StatBonus { atk: 10, ..bonus() },
    },
    GachaTemplate {
        id: "leather_vest",
        name: "Leather Vest",
        rarity: Rarity::Uncommon,
        item_type: ItemType::Armor,
        base_value: 200,
        stats: StatBonus { def: 10, ..bonus() },
    },
    GachaTemplate {
        id: "silver_ring",
        name: "Silver Ring",
        rarity: Rarity::Rare,
        item_type: ItemType::Accessory,
        base_value: 500,
        stats: StatBonus { luck: 3, ..bonus() },
    },
    GachaTemplate {
        id: "shadow_boots",
        name: "Shadow Boots",
        rarity: Rarity::Epic,
        item_type: ItemType::Armor,
        base_value: 1500,
        stats: StatBonus { def: 15, corruption: 5, ..bonus() },
    },
];

pub static QUESTS: &[QuestDef] = &[
    QuestDef {
        id: "q01_ruins",
        title: "Mission: Ancient Ruins",
        giver: "Mawamori Yoshida",
        level_req: 1,
        description: "Yoshida sends Team Four to survey the ancient ruins at the edge of the Archipelago Zone. Observe and report.",
        objective: QuestObjective::Activity { activity: Activity::Explore, count: 3 },
        rewards: QuestRewards { xp: 200, bb: 500, items: &[] },
    },
    QuestDef {
        id: "q02_lab_assist",
        title: "Lab Assistance: \"Volunteers\"",
        giver: "Prof. Ryu",
        level_req: 5,
        description: "Ryu needs \"volunteers\" to test his new grenade prototype. He also needs materials that might explode.",
        objective: QuestObjective::Collection { item_id: "marsh_crystal", count: 5 },
        rewards: QuestRewards {
            xp: 400,
            bb: 1000,
            items: &[RewardItem { id: "ryu_grenade", count: 1 }],
        },
    },
    QuestDef {
        id: "q03_serum_run",
        title: "Clinic Duty: Serum Run",
        giver: "Dr. Vivi",
        level_req: 8,
        description: "Dr. Vivi is running low on angel-light magic. Bring her 10 spirit-infused Marsh Weed.",
        objective: QuestObjective::Collection { item_id: "marsh_weed", count: 10 },
        rewards: QuestRewards {
            xp: 300,
            bb: 800,
            items: &[RewardItem { id: "vivi_serum", count: 2 }],
        },
    },
    QuestDef {
        id: "q04_choker_polish",
        title: "Aesthetic Maintenance",
        giver: "Zaki",
        level_req: 9,
        description: "Zaki complains the gems on his choker have gone dull. He needs rare Marsh materials to polish them.",
        objective: QuestObjective::Collection { item_id: "marsh_crystal", count: 3 },
        rewards: QuestRewards {
            xp: 500,
            bb: 1200,
            items: &[RewardItem { id: "gacha_ticket_basic", count: 1 }],
        },
    },
];

// ============================================================================
// Lookups
// ============================================================================

pub fn rarity_info(rarity: Rarity) -> &'static RarityInfo {
    &RARITIES[rarity as usize]
}

/// Class by id or display name, case-insensitive. Older records stored the
/// display name.
pub fn class(key: &str) -> Option<&'static ClassDef> {
    let key = key.trim();
    CLASSES
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(key) || c.name.eq_ignore_ascii_case(key))
}

pub fn area(id: &str) -> Option<&'static AreaDef> {
    AREAS.iter().find(|a| a.id == id)
}

pub fn quest(id: &str) -> Option<&'static QuestDef> {
    QUESTS.iter().find(|q| q.id == id)
}

/// Enemy roster for an area. Areas without their own roster borrow the
/// closest lower area's.
pub fn enemies_for(area: &AreaDef) -> &'static [EnemyDef] {
    fallback_by_area(area, |id| match id {
        "tier1" => Some(TIER1_ENEMIES),
        _ => None,
    })
}

/// Hunting loot table for an area, with the same fallback as [`enemies_for`].
pub fn loot_table_for(area: &AreaDef) -> &'static [LootTemplate] {
    fallback_by_area(area, |id| match id {
        "tier1" => Some(TIER1_LOOT),
        _ => None,
    })
}

fn fallback_by_area<T: 'static>(
    area: &AreaDef,
    table: impl Fn(&str) -> Option<&'static [T]>,
) -> &'static [T] {
    AREAS
        .iter()
        .filter(|a| a.level_req <= area.level_req)
        .rev()
        .find_map(|a| table(a.id))
        .unwrap_or(&[])
}

/// One resolved catalog entry, tagged by the table it came from.
#[derive(Debug, Clone, Copy)]
pub enum CatalogEntry {
    Shop(&'static ShopItemDef),
    Equipment(&'static EquipmentDef),
    Gacha(&'static GachaTemplate),
    Loot(&'static LootTemplate),
    Fish(&'static LootTemplate),
}

impl CatalogEntry {
    pub fn id(&self) -> &'static str {
        match self {
            CatalogEntry::Shop(d) => d.id,
            CatalogEntry::Equipment(d) => d.id,
            CatalogEntry::Gacha(d) => d.id,
            CatalogEntry::Loot(d) | CatalogEntry::Fish(d) => d.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CatalogEntry::Shop(d) => d.name,
            CatalogEntry::Equipment(d) => d.name,
            CatalogEntry::Gacha(d) => d.name,
            CatalogEntry::Loot(d) | CatalogEntry::Fish(d) => d.name,
        }
    }

    /// Shop price, for entries that can be bought.
    pub fn cost(&self) -> Option<u64> {
        match self {
            CatalogEntry::Shop(d) => Some(d.cost),
            CatalogEntry::Equipment(d) => Some(d.cost),
            _ => None,
        }
    }

    pub fn level_req(&self) -> Option<u32> {
        match self {
            CatalogEntry::Equipment(d) => Some(d.level_req),
            _ => None,
        }
    }

    /// A fresh full-quality instance. Purchasable entries are worth half
    /// their price; drops are worth their base value.
    pub fn mint(&self) -> Item {
        let (rarity, value, item_type, stats, level_req) = match self {
            CatalogEntry::Shop(d) => (d.rarity, d.cost / 2, Some(ItemType::Consumable), None, None),
            CatalogEntry::Equipment(d) => (
                d.rarity,
                d.cost / 2,
                Some(d.item_type),
                Some(d.stats),
                Some(d.level_req),
            ),
            CatalogEntry::Gacha(d) => (d.rarity, d.base_value, Some(d.item_type), Some(d.stats), None),
            CatalogEntry::Loot(d) | CatalogEntry::Fish(d) => {
                (d.rarity, d.base_value, Some(ItemType::Material), None, None)
            }
        };
        Item {
            id: self.id().to_string(),
            name: self.name().to_string(),
            rarity,
            quality: 100,
            value,
            item_type,
            stats,
            level_req,
        }
    }
}

/// Single lookup across every item table. Ids are unique across tables, so
/// the search order never shadows an entry.
pub fn lookup_item(id: &str) -> Option<CatalogEntry> {
    SHOP_ITEMS
        .iter()
        .find(|d| d.id == id)
        .map(CatalogEntry::Shop)
        .or_else(|| EQUIPMENT_ITEMS.iter().find(|d| d.id == id).map(CatalogEntry::Equipment))
        .or_else(|| GACHA_LOOT.iter().find(|d| d.id == id).map(CatalogEntry::Gacha))
        .or_else(|| TIER1_LOOT.iter().find(|d| d.id == id).map(CatalogEntry::Loot))
        .or_else(|| FISHING_LOOT.iter().find(|d| d.id == id).map(CatalogEntry::Fish))
}

/// Entries the shop sells, in display order.
pub fn purchasable() -> impl Iterator<Item = CatalogEntry> {
    SHOP_ITEMS
        .iter()
        .map(CatalogEntry::Shop)
        .chain(EQUIPMENT_ITEMS.iter().map(CatalogEntry::Equipment))
}
