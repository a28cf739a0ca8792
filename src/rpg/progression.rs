//! Progression engine: cooldowns, area resolution, loot and gacha rolls,
//! level-up cascades.
//!
//! All randomness comes in through a caller-supplied [`rand::Rng`] so tests
//! can pin outcomes with a seeded generator.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::rpg::catalog::{self, AreaDef, ClassStats, EnemyDef, GachaTemplate, LootTemplate};
use crate::rpg::types::{
    account_xp_required, rpg_xp_required, Account, Item, ItemType, Meta, Rarity, RpgState,
};

// ============================================================================
// Cooldowns
// ============================================================================

/// Commands with a fixed cooldown window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownKind {
    Hunt,
    Fish,
    Explore,
    Convert,
}

impl CooldownKind {
    /// Key under `meta.cooldowns`.
    pub fn key(self) -> &'static str {
        match self {
            CooldownKind::Hunt => "hunt",
            CooldownKind::Fish => "fish",
            CooldownKind::Explore => "explore",
            CooldownKind::Convert => "convert",
        }
    }

    pub fn duration_secs(self) -> u64 {
        cooldown_secs_for(self.key())
    }
}

/// Cooldown window for a command key; unknown keys get the 60 second default.
pub fn cooldown_secs_for(key: &str) -> u64 {
    match key {
        "hunt" | "fish" => 300,
        "explore" => 600,
        "convert" => 0,
        _ => 60,
    }
}

/// Seconds until `kind` may run again, rounded up. Zero when never used or
/// when the window has passed.
pub fn cooldown_remaining(meta: &Meta, kind: CooldownKind, now: DateTime<Utc>) -> u64 {
    let Some(&last_used) = meta.cooldowns.get(kind.key()) else {
        return 0;
    };
    let window_ms = kind.duration_secs() as i64 * 1000;
    let left_ms = last_used + window_ms - now.timestamp_millis();
    if left_ms <= 0 {
        0
    } else {
        ((left_ms + 999) / 1000) as u64
    }
}

pub fn set_cooldown(meta: &mut Meta, kind: CooldownKind, now: DateTime<Utc>) {
    meta.cooldowns
        .insert(kind.key().to_string(), now.timestamp_millis());
}

// ============================================================================
// Areas
// ============================================================================

/// Highest area the level qualifies for. `None` below the first tier.
pub fn area_for_level(level: u32) -> Option<&'static AreaDef> {
    let mut current = None;
    for area in catalog::AREAS {
        if level >= area.level_req {
            current = Some(area);
        } else {
            break;
        }
    }
    current
}

// ============================================================================
// Loot
// ============================================================================

/// Roll `enemy.drop_slots` independent drops for a kill in `area`.
///
/// Each slot picks a rarity from the area's range, may step up once when
/// `roll < luck * 0.5` (so luck of 200 or more always upgrades), then picks a
/// template of that rarity. Slots whose rarity has no template drop nothing.
pub fn generate_loot<R: Rng + ?Sized>(
    area: &AreaDef,
    enemy: &EnemyDef,
    luck: u32,
    rng: &mut R,
) -> Vec<Item> {
    generate_loot_from(area, catalog::loot_table_for(area), enemy.drop_slots, luck, rng)
}

pub(crate) fn generate_loot_from<R: Rng + ?Sized>(
    area: &AreaDef,
    table: &[LootTemplate],
    drop_slots: u32,
    luck: u32,
    rng: &mut R,
) -> Vec<Item> {
    let range = area.rarity_range;
    let luck_bonus = luck as f64 * 0.5;
    let mut drops = Vec::new();

    for _ in 0..drop_slots {
        let mut idx = rng.gen_range(0..range.len());
        let upgrade_roll: f64 = rng.gen_range(0.0..100.0);
        if upgrade_roll < luck_bonus && idx + 1 < range.len() {
            idx += 1;
        }
        let rarity = range[idx];

        let candidates: Vec<&LootTemplate> = table.iter().filter(|t| t.rarity == rarity).collect();
        let Some(template) = candidates.choose(rng) else {
            continue;
        };

        let base_quality: f64 = rng.gen_range(50.0..75.0);
        let quality = (base_quality + luck_bonus).floor().min(100.0) as u8;

        drops.push(Item {
            id: template.id.to_string(),
            name: template.name.to_string(),
            rarity,
            quality,
            value: rarity.scale_value(template.base_value),
            item_type: Some(ItemType::Material),
            stats: None,
            level_req: None,
        });
    }
    drops
}

// ============================================================================
// Gacha
// ============================================================================

/// Walk the rarity table accumulating drop chances and return the first tier
/// whose running total exceeds `draw` and which `has_entries` accepts.
///
/// Draws that land past the last accepted tier resolve to `None`.
pub fn resolve_gacha_rarity(draw: f64, has_entries: impl Fn(Rarity) -> bool) -> Option<Rarity> {
    let mut cumulative = 0.0;
    for info in catalog::RARITIES.iter() {
        cumulative += info.drop_chance;
        if draw < cumulative && has_entries(info.rarity) {
            return Some(info.rarity);
        }
    }
    None
}

/// One pull from `pool`. Quality lands in 50..=99.
pub fn roll_gacha<R: Rng + ?Sized>(pool: &[GachaTemplate], rng: &mut R) -> Option<Item> {
    let draw: f64 = rng.gen_range(0.0..100.0);
    let rarity = resolve_gacha_rarity(draw, |r| pool.iter().any(|t| t.rarity == r))?;
    let candidates: Vec<&GachaTemplate> = pool.iter().filter(|t| t.rarity == rarity).collect();
    let template = candidates.choose(rng)?;

    Some(Item {
        id: template.id.to_string(),
        name: template.name.to_string(),
        rarity,
        quality: rng.gen_range(50..100),
        value: rarity.scale_value(template.base_value),
        item_type: Some(template.item_type),
        stats: Some(template.stats),
        level_req: None,
    })
}

// ============================================================================
// Level ups
// ============================================================================

/// What a level-up cascade changed, for the caller to announce.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpReport {
    pub from_level: u32,
    pub to_level: u32,
    /// Summed per-level gains; `None` without a class.
    pub gains: Option<ClassStats>,
    /// Set when the new level resolves to a different area than the old one.
    pub unlocked_area: Option<&'static str>,
}

impl LevelUpReport {
    pub fn levels_gained(&self) -> u32 {
        self.to_level - self.from_level
    }
}

/// Spend RPG XP on as many levels as it covers.
///
/// Leaves `rpg.xp < rpg.level * 250`. Each level adds the class's stat gains;
/// classless characters still level but gain no stats.
pub fn apply_rpg_level_ups(rpg: &mut RpgState) -> Option<LevelUpReport> {
    let from_level = rpg.level;
    let class = catalog::class(&rpg.stats.class);
    let mut total = ClassStats { hp: 0, mana: 0, luck: 0, spirit_bond: 0, corruption: 0 };

    while rpg.xp >= rpg_xp_required(rpg.level) {
        rpg.xp -= rpg_xp_required(rpg.level);
        rpg.level += 1;
        if let Some(class) = class {
            let g = class.stat_gains;
            rpg.stats.hp += g.hp;
            rpg.stats.mana += g.mana;
            rpg.stats.luck += g.luck;
            rpg.stats.spirit_bond += g.spirit_bond;
            rpg.stats.corruption += g.corruption;
            total.hp += g.hp;
            total.mana += g.mana;
            total.luck += g.luck;
            total.spirit_bond += g.spirit_bond;
            total.corruption += g.corruption;
        }
    }

    if rpg.level == from_level {
        return None;
    }

    let old_area = area_for_level(from_level).map(|a| a.id);
    let unlocked_area = area_for_level(rpg.level)
        .filter(|a| Some(a.id) != old_area)
        .map(|a| a.name);

    Some(LevelUpReport {
        from_level,
        to_level: rpg.level,
        gains: class.map(|_| total),
        unlocked_area,
    })
}

/// Spend account XP on as many levels as it covers. Returns the new level
/// when it changed.
pub fn apply_account_level_ups(account: &mut Account) -> Option<u32> {
    let from = account.level;
    while account.xp >= account_xp_required(account.level) {
        account.xp -= account_xp_required(account.level);
        account.level += 1;
    }
    (account.level != from).then_some(account.level)
}
