//! Repeatable earning actions (hunt, fish, explore), class selection and
//! gacha pulls.
//!
//! Each action checks its cooldown first, mutates the record, stamps the
//! cooldown, counts toward an activity quest and runs the level-up cascade
//! when it grants XP.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::rpg::catalog::{self, Activity, ClassDef};
use crate::rpg::economy::credit_bb;
use crate::rpg::errors::RpgError;
use crate::rpg::inventory::{take_first, GACHA_TICKET_ID};
use crate::rpg::progression::{
    apply_rpg_level_ups, area_for_level, cooldown_remaining, generate_loot, roll_gacha,
    set_cooldown, CooldownKind, LevelUpReport,
};
use crate::rpg::quest::record_activity;
use crate::rpg::types::{Item, ItemType, UserRecord};

/// XP granted per catch.
pub const FISH_XP: u64 = 10;

fn check_cooldown(record: &UserRecord, kind: CooldownKind, now: DateTime<Utc>) -> Result<(), RpgError> {
    match cooldown_remaining(&record.meta, kind, now) {
        0 => Ok(()),
        seconds => Err(RpgError::Cooldown { seconds }),
    }
}

fn require_class(record: &UserRecord) -> Result<(), RpgError> {
    if record.rpg.stats.has_class() {
        Ok(())
    } else {
        Err(RpgError::InvalidInput(
            "you need to pick a class first".to_string(),
        ))
    }
}

// ============================================================================
// Class
// ============================================================================

/// One-time class choice. Copies the class's base stats over the defaults;
/// level and XP are kept.
pub fn choose_class(record: &mut UserRecord, choice: &str) -> Result<&'static ClassDef, RpgError> {
    if record.rpg.stats.has_class() {
        let current = catalog::class(&record.rpg.stats.class)
            .map(|c| c.name)
            .unwrap_or(record.rpg.stats.class.as_str());
        return Err(RpgError::InvalidInput(format!(
            "you're already {}; you can't change your fate now",
            current
        )));
    }
    let class = catalog::class(choice)
        .ok_or_else(|| RpgError::InvalidInput(format!("{} is not a class", choice)))?;

    let base = class.base_stats;
    let stats = &mut record.rpg.stats;
    stats.class = class.id.to_string();
    stats.hp = base.hp;
    stats.mana = base.mana;
    stats.luck = base.luck;
    stats.spirit_bond = base.spirit_bond;
    stats.corruption = base.corruption;
    Ok(class)
}

// ============================================================================
// Hunt
// ============================================================================

#[derive(Debug, Clone)]
pub struct HuntOutcome {
    pub area_name: &'static str,
    pub enemy_name: &'static str,
    pub bb_gained: u64,
    pub xp_gained: u64,
    pub loot: Vec<Item>,
    pub monsters_hunted: u64,
    pub quest_progress: Option<(u32, u32)>,
    pub level_up: Option<LevelUpReport>,
}

pub fn hunt<R: Rng + ?Sized>(
    record: &mut UserRecord,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<HuntOutcome, RpgError> {
    require_class(record)?;
    check_cooldown(record, CooldownKind::Hunt, now)?;

    let area = area_for_level(record.rpg.level)
        .ok_or_else(|| RpgError::NotFound("no hunting ground at your level".to_string()))?;
    let enemy = catalog::enemies_for(area)
        .choose(rng)
        .ok_or_else(|| RpgError::Internal(format!("{} has no enemies", area.id)))?;

    let bb_gained = (enemy.base_bb_drop as f64 * area.bb_mult).floor() as u64;
    let xp_gained = enemy.base_xp_drop;
    let loot = generate_loot(area, enemy, record.rpg.stats.luck, rng);

    credit_bb(&mut record.economy, bb_gained);
    record.rpg.xp += xp_gained;
    record.meta.monsters_hunted += 1;
    set_cooldown(&mut record.meta, CooldownKind::Hunt, now);
    record.inventory.items.extend(loot.iter().cloned());

    let quest_progress = record_activity(record, Activity::Hunt);
    let level_up = apply_rpg_level_ups(&mut record.rpg);

    Ok(HuntOutcome {
        area_name: area.name,
        enemy_name: enemy.name,
        bb_gained,
        xp_gained,
        loot,
        monsters_hunted: record.meta.monsters_hunted,
        quest_progress,
        level_up,
    })
}

// ============================================================================
// Fish
// ============================================================================

#[derive(Debug, Clone)]
pub struct FishOutcome {
    pub catch: Item,
    pub bb_gained: u64,
    pub xp_gained: u64,
    pub fish_caught: u64,
    pub quest_progress: Option<(u32, u32)>,
    pub level_up: Option<LevelUpReport>,
}

/// Catch one random fishing entry. BB is the base value jittered by up to
/// five either way, floored at zero.
pub fn fish<R: Rng + ?Sized>(
    record: &mut UserRecord,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<FishOutcome, RpgError> {
    check_cooldown(record, CooldownKind::Fish, now)?;

    let loot = catalog::FISHING_LOOT
        .choose(rng)
        .ok_or_else(|| RpgError::Internal("fishing table is empty".to_string()))?;
    let jitter: f64 = rng.gen_range(-5.0..5.0);
    let bb_gained = (loot.base_value as f64 + jitter).floor().max(0.0) as u64;

    let catch = Item {
        id: loot.id.to_string(),
        name: loot.name.to_string(),
        rarity: loot.rarity,
        quality: rng.gen_range(50..100),
        value: loot.rarity.scale_value(loot.base_value),
        item_type: Some(ItemType::Material),
        stats: None,
        level_req: None,
    };

    credit_bb(&mut record.economy, bb_gained);
    record.rpg.xp += FISH_XP;
    record.meta.fish_caught += 1;
    set_cooldown(&mut record.meta, CooldownKind::Fish, now);
    record.inventory.items.push(catch.clone());

    let quest_progress = record_activity(record, Activity::Fish);
    let level_up = apply_rpg_level_ups(&mut record.rpg);

    Ok(FishOutcome {
        catch,
        bb_gained,
        xp_gained: FISH_XP,
        fish_caught: record.meta.fish_caught,
        quest_progress,
        level_up,
    })
}

// ============================================================================
// Explore
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ExploreOutcome {
    pub bb_gained: u64,
    pub quest_progress: Option<(u32, u32)>,
}

/// Wander for 10..=50 BB. Grants no XP.
pub fn explore<R: Rng + ?Sized>(
    record: &mut UserRecord,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<ExploreOutcome, RpgError> {
    check_cooldown(record, CooldownKind::Explore, now)?;

    let bb_gained = rng.gen_range(10..=50);
    let quest_progress = record_activity(record, Activity::Explore);
    credit_bb(&mut record.economy, bb_gained);
    set_cooldown(&mut record.meta, CooldownKind::Explore, now);

    Ok(ExploreOutcome {
        bb_gained,
        quest_progress,
    })
}

// ============================================================================
// Gacha
// ============================================================================

#[derive(Debug, Clone)]
pub struct GachaOutcome {
    /// `None` when the draw landed above the pool's highest tier; the ticket
    /// is still spent.
    pub item: Option<Item>,
    pub tickets_left: usize,
}

/// Spend one basic ticket on a pull from the standard pool.
pub fn pull_gacha<R: Rng + ?Sized>(record: &mut UserRecord, rng: &mut R) -> Result<GachaOutcome, RpgError> {
    if take_first(record, GACHA_TICKET_ID).is_none() {
        return Err(RpgError::NotFound(
            "you have no gacha tickets; buy some in the shop".to_string(),
        ));
    }
    let item = roll_gacha(catalog::GACHA_LOOT, rng);
    if let Some(item) = &item {
        record.inventory.items.push(item.clone());
    }
    Ok(GachaOutcome {
        item,
        tickets_left: record.count_item(GACHA_TICKET_ID),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpg::quest::{accept_quest, complete_quest};
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn punk() -> UserRecord {
        let mut record = UserRecord::new("tester", 0);
        choose_class(&mut record, "punk").unwrap();
        record
    }

    #[test]
    fn test_choose_class_is_one_time() {
        let mut record = UserRecord::new("tester", 0);
        record.rpg.level = 4;
        let class = choose_class(&mut record, "The Jester").unwrap();
        assert_eq!(class.id, "jester");
        assert_eq!(record.rpg.stats.class, "jester");
        assert_eq!(record.rpg.stats.luck, 20);
        assert_eq!(record.rpg.level, 4);
        assert!(matches!(choose_class(&mut record, "imp"), Err(RpgError::InvalidInput(_))));
        assert!(matches!(
            choose_class(&mut UserRecord::new("b", 0), "bard"),
            Err(RpgError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_first_hunt_in_tier1() {
        let mut record = punk();
        let mut rng = StdRng::seed_from_u64(5);
        let now = Utc::now();
        let out = hunt(&mut record, now, &mut rng).unwrap();

        let enemy = catalog::enemies_for(catalog::area("tier1").unwrap())
            .iter()
            .find(|e| e.name == out.enemy_name)
            .unwrap();
        assert_eq!(out.area_name, "Whispering Marsh");
        assert_eq!(record.economy.baddie_bucks, enemy.base_bb_drop);
        assert_eq!(record.rpg.xp, enemy.base_xp_drop);
        assert!(out.loot.len() <= enemy.drop_slots as usize);
        assert_eq!(record.inventory.items.len(), out.loot.len());
        assert_eq!(record.meta.monsters_hunted, 1);
        assert!(out.level_up.is_none());

        assert!(matches!(
            hunt(&mut record, now + Duration::seconds(10), &mut rng),
            Err(RpgError::Cooldown { seconds: 290 })
        ));
        assert!(hunt(&mut record, now + Duration::seconds(300), &mut rng).is_ok());
    }

    #[test]
    fn test_hunt_requires_class() {
        let mut record = UserRecord::new("tester", 0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(hunt(&mut record, Utc::now(), &mut rng), Err(RpgError::InvalidInput(_))));
        assert_eq!(record.meta.monsters_hunted, 0);
    }

    #[test]
    fn test_hunt_in_crystal_vale_scales_bb() {
        let mut record = punk();
        record.rpg.level = 10;
        let mut rng = StdRng::seed_from_u64(9);
        let out = hunt(&mut record, Utc::now(), &mut rng).unwrap();
        assert_eq!(out.area_name, "Crystal Vale");
        assert!(out.bb_gained == 36 || out.bb_gained == 120);
    }

    #[test]
    fn test_fish_bounds() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut now = Utc::now();
        let mut record = UserRecord::new("tester", 0);
        for n in 1..=50u64 {
            let before = record.economy.baddie_bucks;
            let out = fish(&mut record, now, &mut rng).unwrap();
            let base = catalog::FISHING_LOOT
                .iter()
                .find(|f| f.id == out.catch.id)
                .unwrap()
                .base_value;
            assert!(out.bb_gained + 5 >= base && out.bb_gained < base + 5);
            assert_eq!(record.economy.baddie_bucks, before + out.bb_gained);
            assert!((50..=99).contains(&out.catch.quality));
            assert_eq!(out.fish_caught, n);
            now += Duration::seconds(300);
        }
    }

    #[test]
    fn test_explore_range_and_cooldown() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut record = UserRecord::new("tester", 0);
        let now = Utc::now();
        let out = explore(&mut record, now, &mut rng).unwrap();
        assert!((10..=50).contains(&out.bb_gained));
        assert_eq!(record.rpg.xp, 0);
        assert!(matches!(
            explore(&mut record, now + Duration::seconds(599), &mut rng),
            Err(RpgError::Cooldown { seconds: 1 })
        ));
    }

    #[test]
    fn test_ruins_mission_through_explore() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut record = UserRecord::new("tester", 0);
        let mut now = Utc::now();
        accept_quest(&mut record, "q01_ruins").unwrap();

        let mut earned = 0;
        for i in 1..=3 {
            let out = explore(&mut record, now, &mut rng).unwrap();
            assert_eq!(out.quest_progress, Some((i, 3)));
            earned += out.bb_gained;
            now += Duration::seconds(600);
        }
        assert_eq!(record.rpg.quest_progress, 3);

        complete_quest(&mut record).unwrap();
        assert_eq!(record.economy.baddie_bucks, earned + 500);
        assert_eq!(record.rpg.xp, 200);
        assert_eq!(record.rpg.active_quest_id, None);
        assert!(record.rpg.completed_quests.contains("q01_ruins"));
    }

    #[test]
    fn test_gacha_spends_one_ticket() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut record = UserRecord::new("tester", 0);
        assert!(matches!(pull_gacha(&mut record, &mut rng), Err(RpgError::NotFound(_))));

        let ticket = catalog::lookup_item(GACHA_TICKET_ID).unwrap().mint();
        record.inventory.items.extend([ticket.clone(), ticket]);
        let out = pull_gacha(&mut record, &mut rng).unwrap();
        assert_eq!(out.tickets_left, 1);
        let expected_len = 1 + usize::from(out.item.is_some());
        assert_eq!(record.inventory.items.len(), expected_len);
    }
}
