//! Quest lifecycle: listing, accepting, tracking activity progress and
//! completing with reward payout.
//!
//! A user holds at most one active quest. Activity quests count successful
//! command uses in `quest_progress`; collection quests check the inventory
//! live and never touch the counter.

use crate::rpg::catalog::{self, Activity, QuestDef, QuestObjective};
use crate::rpg::economy::credit_bb;
use crate::rpg::errors::RpgError;
use crate::rpg::inventory::remove_count;
use crate::rpg::progression::{apply_rpg_level_ups, LevelUpReport};
use crate::rpg::types::UserRecord;

/// Quests the user could accept right now.
pub fn available_quests(record: &UserRecord) -> Vec<&'static QuestDef> {
    let rpg = &record.rpg;
    catalog::QUESTS
        .iter()
        .filter(|q| {
            rpg.level >= q.level_req
                && !rpg.completed_quests.contains(q.id)
                && rpg.active_quest_id.as_deref() != Some(q.id)
        })
        .collect()
}

pub fn active_quest(record: &UserRecord) -> Option<&'static QuestDef> {
    record
        .rpg
        .active_quest_id
        .as_deref()
        .and_then(catalog::quest)
}

/// Current and required amounts for the quest's objective.
pub fn objective_progress(record: &UserRecord, quest: &QuestDef) -> (u32, u32) {
    match quest.objective {
        QuestObjective::Activity { count, .. } => (record.rpg.quest_progress, count),
        QuestObjective::Collection { item_id, count } => {
            (record.count_item(item_id) as u32, count)
        }
    }
}

/// Start a quest. Fails when one is already active, the id is unknown, the
/// level is too low or the quest was already completed.
pub fn accept_quest(record: &mut UserRecord, quest_id: &str) -> Result<&'static QuestDef, RpgError> {
    if let Some(active) = record.rpg.active_quest_id.as_deref() {
        return Err(RpgError::AlreadyInProgress(format!(
            "finish or drop {} first",
            active
        )));
    }
    let quest = catalog::quest(quest_id)
        .ok_or_else(|| RpgError::NotFound(format!("no mission with id {}", quest_id)))?;
    if record.rpg.level < quest.level_req {
        return Err(RpgError::InsufficientLevel {
            required: quest.level_req,
            current: record.rpg.level,
        });
    }
    if record.rpg.completed_quests.contains(quest.id) {
        return Err(RpgError::InvalidInput(format!(
            "you already completed {}",
            quest.title
        )));
    }

    record.rpg.active_quest_id = Some(quest.id.to_string());
    record.rpg.quest_progress = 0;
    Ok(quest)
}

/// Count one successful use of `activity` toward the active quest.
///
/// Returns `(progress, required)` when the counter moved. Progress stops at
/// the required count.
pub fn record_activity(record: &mut UserRecord, activity: Activity) -> Option<(u32, u32)> {
    let quest = active_quest(record)?;
    match quest.objective {
        QuestObjective::Activity { activity: wanted, count }
            if wanted == activity && record.rpg.quest_progress < count =>
        {
            record.rpg.quest_progress += 1;
            Some((record.rpg.quest_progress, count))
        }
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct QuestCompletion {
    pub quest: &'static QuestDef,
    /// `(name, count)` for each reward item granted.
    pub reward_items: Vec<(&'static str, u32)>,
    pub level_up: Option<LevelUpReport>,
}

/// Turn in the active quest.
///
/// Collection quests consume exactly the required count. Rewards are paid,
/// the quest moves to the completed set, and the level-up cascade runs.
pub fn complete_quest(record: &mut UserRecord) -> Result<QuestCompletion, RpgError> {
    let active_id = record
        .rpg
        .active_quest_id
        .clone()
        .ok_or_else(|| RpgError::NotFound("you do not have an active mission".to_string()))?;
    let quest = catalog::quest(&active_id)
        .ok_or_else(|| RpgError::Internal(format!("active quest {} is not in the catalog", active_id)))?;

    let (have, need) = objective_progress(record, quest);
    if have < need {
        return Err(RpgError::InvalidInput(format!(
            "objective not met for {} ({}/{})",
            quest.title, have, need
        )));
    }

    // Resolve rewards before mutating anything.
    let mut reward_items = Vec::with_capacity(quest.rewards.items.len());
    let mut minted = Vec::new();
    for reward in quest.rewards.items {
        let entry = catalog::lookup_item(reward.id)
            .ok_or_else(|| RpgError::Internal(format!("reward item {} is not in the catalog", reward.id)))?;
        let item = entry.mint();
        minted.extend(std::iter::repeat(item).take(reward.count as usize));
        reward_items.push((entry.name(), reward.count));
    }

    if let QuestObjective::Collection { item_id, count } = quest.objective {
        remove_count(record, item_id, count as usize)?;
    }

    credit_bb(&mut record.economy, quest.rewards.bb);
    record.rpg.xp += quest.rewards.xp;
    record.inventory.items.extend(minted);

    record.rpg.completed_quests.insert(active_id);
    record.rpg.active_quest_id = None;
    record.rpg.quest_progress = 0;

    let level_up = apply_rpg_level_ups(&mut record.rpg);
    Ok(QuestCompletion {
        quest,
        reward_items,
        level_up,
    })
}

/// Objective line for a quest, with live progress when `record` holds it.
pub fn describe_objective(quest: &QuestDef, record: Option<&UserRecord>) -> String {
    match (&quest.objective, record) {
        (QuestObjective::Activity { activity, count }, Some(r)) => format!(
            "Use `{}` ({}/{} times).",
            activity.name(),
            r.rpg.quest_progress,
            count
        ),
        (QuestObjective::Activity { activity, count }, None) => {
            format!("Use `{}` {} times.", activity.name(), count)
        }
        (QuestObjective::Collection { item_id, count }, Some(r)) => {
            format!("Collect `{}` ({}/{}).", item_id, r.count_item(item_id), count)
        }
        (QuestObjective::Collection { item_id, count }, None) => {
            format!("Collect {}x `{}`.", count, item_id)
        }
    }
}

pub fn format_quest_board(record: &UserRecord) -> String {
    let mut out = String::from("Mission Board\n");
    if let Some(active) = active_quest(record) {
        out.push_str(&format!(
            "Active: {} (Giver: {})\n  {}\n  {}\n",
            active.title,
            active.giver,
            active.description,
            describe_objective(active, Some(record))
        ));
    }

    let available = available_quests(record);
    if available.is_empty() {
        out.push_str("Available: none. You are either too weak or finished them all.");
        return out;
    }
    out.push_str("Available:\n");
    for q in available {
        out.push_str(&format!(
            "[Lv. {}] {} (Giver: {}) id `{}`\n  {}\n",
            q.level_req,
            q.title,
            q.giver,
            q.id,
            describe_objective(q, None)
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpg::types::{Item, Rarity};

    fn crystal() -> Item {
        Item {
            id: "marsh_crystal".into(),
            name: "Marsh Crystal".into(),
            rarity: Rarity::Rare,
            quality: 70,
            value: 100,
            item_type: None,
            stats: None,
            level_req: None,
        }
    }

    #[test]
    fn test_accept_rejections() {
        let mut record = UserRecord::new("tester", 0);
        assert!(matches!(accept_quest(&mut record, "q99"), Err(RpgError::NotFound(_))));
        assert!(matches!(
            accept_quest(&mut record, "q02_lab_assist"),
            Err(RpgError::InsufficientLevel { required: 5, current: 1 })
        ));

        accept_quest(&mut record, "q01_ruins").unwrap();
        assert!(matches!(
            accept_quest(&mut record, "q01_ruins"),
            Err(RpgError::AlreadyInProgress(_))
        ));

        record.rpg.active_quest_id = None;
        record.rpg.completed_quests.insert("q01_ruins".into());
        assert!(matches!(accept_quest(&mut record, "q01_ruins"), Err(RpgError::InvalidInput(_))));
    }

    #[test]
    fn test_activity_progress_caps_and_ignores_other_activities() {
        let mut record = UserRecord::new("tester", 0);
        assert_eq!(record_activity(&mut record, Activity::Explore), None);

        accept_quest(&mut record, "q01_ruins").unwrap();
        assert_eq!(record_activity(&mut record, Activity::Hunt), None);
        assert_eq!(record_activity(&mut record, Activity::Explore), Some((1, 3)));
        record_activity(&mut record, Activity::Explore);
        record_activity(&mut record, Activity::Explore);
        assert_eq!(record_activity(&mut record, Activity::Explore), None);
        assert_eq!(record.rpg.quest_progress, 3);
    }

    #[test]
    fn test_complete_requires_objective() {
        let mut record = UserRecord::new("tester", 0);
        assert!(matches!(complete_quest(&mut record), Err(RpgError::NotFound(_))));
        accept_quest(&mut record, "q01_ruins").unwrap();
        assert!(matches!(complete_quest(&mut record), Err(RpgError::InvalidInput(_))));
        assert_eq!(record.rpg.active_quest_id.as_deref(), Some("q01_ruins"));
    }

    #[test]
    fn test_collection_quest_consumes_exact_count() {
        let mut record = UserRecord::new("tester", 0);
        record.rpg.level = 9;
        accept_quest(&mut record, "q04_choker_polish").unwrap();
        record.inventory.items.extend((0..5).map(|_| crystal()));

        let done = complete_quest(&mut record).unwrap();
        assert_eq!(done.quest.id, "q04_choker_polish");
        assert_eq!(record.count_item("marsh_crystal"), 2);
        assert_eq!(record.count_item("gacha_ticket_basic"), 1);
        assert_eq!(done.reward_items, vec![("Gacha Ticket (Basic)", 1)]);
        assert_eq!(record.economy.baddie_bucks, 1_200);
        assert!(record.rpg.completed_quests.contains("q04_choker_polish"));
        assert_eq!(record.rpg.active_quest_id, None);
        // 500 XP does not reach the 2250 needed at level 9.
        assert_eq!(record.rpg.xp, 500);
        assert!(done.level_up.is_none());
    }

    #[test]
    fn test_reward_xp_runs_level_up() {
        let mut record = UserRecord::new("tester", 0);
        record.rpg.xp = 100;
        accept_quest(&mut record, "q01_ruins").unwrap();
        record.rpg.quest_progress = 3;
        let done = complete_quest(&mut record).unwrap();
        assert_eq!(record.rpg.level, 2);
        assert_eq!(record.rpg.xp, 50);
        assert_eq!(done.level_up.map(|l| l.to_level), Some(2));
    }

    #[test]
    fn test_available_excludes_active_and_completed() {
        let mut record = UserRecord::new("tester", 0);
        record.rpg.level = 9;
        assert_eq!(available_quests(&record).len(), 4);
        accept_quest(&mut record, "q02_lab_assist").unwrap();
        record.rpg.completed_quests.insert("q01_ruins".into());
        let ids: Vec<&str> = available_quests(&record).iter().map(|q| q.id).collect();
        assert_eq!(ids, vec!["q03_serum_run", "q04_choker_polish"]);
    }
}
