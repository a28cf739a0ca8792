//! `/rpg` command parsing and execution.
//!
//! Every handler follows the same shape: load the user map, mutate one
//! record, save the map. Handlers that fail validation return before the
//! save, so a rejected command never writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;

use crate::bot::options::{parse_options, OptionKind, OptionSpec};
use crate::bot::Reply;
use crate::logutil::escape_log;
use crate::rpg::activities::{choose_class, explore, fish, hunt, pull_gacha};
use crate::rpg::catalog;
use crate::rpg::economy::{buy_item, convert_bmn, format_shop};
use crate::rpg::errors::RpgError;
use crate::rpg::inventory::{equip_item, format_inventory, sell_items, suggest_items, total_stats, Suggestion};
use crate::rpg::progression::LevelUpReport;
use crate::rpg::quest::{accept_quest, complete_quest, describe_objective, format_quest_board};
use crate::rpg::types::{rpg_xp_required, Item, UserMap, UserRecord};
use crate::storage::UserRepository;

/// Parsed `/rpg` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpgCommand {
    Account { user: Option<String> },
    SetClass { name: String },
    Hunt,
    Fish,
    Explore,
    Convert { amount: i64 },
    Inventory,
    Sell { item: String },
    Equip { item: String },
    ShopView,
    ShopBuy { item: String, amount: i64 },
    Gacha,
    QuestList,
    QuestAccept { id: String },
    QuestComplete,
}

const ACCOUNT_OPTS: &[OptionSpec] = &[OptionSpec::optional("user", OptionKind::User)];
const SETCLASS_OPTS: &[OptionSpec] = &[OptionSpec::required("name", OptionKind::String)];
const CONVERT_OPTS: &[OptionSpec] = &[OptionSpec::required("amount", OptionKind::Integer)];
const ITEM_OPTS: &[OptionSpec] = &[OptionSpec::required("item", OptionKind::String)];
const BUY_OPTS: &[OptionSpec] = &[
    OptionSpec::required("item", OptionKind::String),
    OptionSpec::optional("amount", OptionKind::Integer),
];
const QUEST_ACCEPT_OPTS: &[OptionSpec] = &[OptionSpec::required("id", OptionKind::String)];

fn no_options(sub: &str, rest: &[&str]) -> Result<(), RpgError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(RpgError::InvalidInput(format!("`{}` takes no options", sub)))
    }
}

impl RpgCommand {
    /// Parse the tokens following `/rpg`.
    pub fn parse(args: &[&str]) -> Result<Self, RpgError> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(RpgError::InvalidInput(
                "usage: /rpg <account|setclass|hunt|fish|explore|convert|inventory|sell|equip|shop|gacha|quest>"
                    .to_string(),
            ));
        };
        let sub = sub.to_lowercase();
        let cmd = match sub.as_str() {
            "account" => {
                let opts = parse_options(ACCOUNT_OPTS, rest)?;
                RpgCommand::Account { user: opts.user("user").map(str::to_string) }
            }
            "setclass" => RpgCommand::SetClass {
                name: parse_options(SETCLASS_OPTS, rest)?.require_string("name")?,
            },
            "hunt" => {
                no_options(&sub, rest)?;
                RpgCommand::Hunt
            }
            "fish" => {
                no_options(&sub, rest)?;
                RpgCommand::Fish
            }
            "explore" => {
                no_options(&sub, rest)?;
                RpgCommand::Explore
            }
            "convert" => RpgCommand::Convert {
                amount: parse_options(CONVERT_OPTS, rest)?.require_integer("amount")?,
            },
            "inventory" | "inv" => {
                no_options(&sub, rest)?;
                RpgCommand::Inventory
            }
            "sell" => RpgCommand::Sell {
                item: parse_options(ITEM_OPTS, rest)?.require_string("item")?,
            },
            "equip" => RpgCommand::Equip {
                item: parse_options(ITEM_OPTS, rest)?.require_string("item")?,
            },
            "gacha" => {
                no_options(&sub, rest)?;
                RpgCommand::Gacha
            }
            "shop" => match rest.split_first() {
                None => RpgCommand::ShopView,
                Some((group, rest)) => match group.to_lowercase().as_str() {
                    "view" => RpgCommand::ShopView,
                    "buy" => {
                        let opts = parse_options(BUY_OPTS, rest)?;
                        RpgCommand::ShopBuy {
                            item: opts.require_string("item")?,
                            amount: opts.integer("amount").unwrap_or(1),
                        }
                    }
                    other => {
                        return Err(RpgError::InvalidInput(format!("unknown shop command `{}`", other)))
                    }
                },
            },
            "quest" => match rest.split_first() {
                None => RpgCommand::QuestList,
                Some((group, rest)) => match group.to_lowercase().as_str() {
                    "list" => RpgCommand::QuestList,
                    "accept" => RpgCommand::QuestAccept {
                        id: parse_options(QUEST_ACCEPT_OPTS, rest)?.require_string("id")?,
                    },
                    "complete" => RpgCommand::QuestComplete,
                    other => {
                        return Err(RpgError::InvalidInput(format!("unknown quest command `{}`", other)))
                    }
                },
            },
            other => return Err(RpgError::InvalidInput(format!("unknown rpg command `{}`", other))),
        };
        Ok(cmd)
    }
}

/// Executes `/rpg` commands against a user repository.
pub struct RpgService {
    users: Arc<dyn UserRepository>,
}

impl RpgService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub fn execute(
        &self,
        user_id: &str,
        display_name: &str,
        cmd: RpgCommand,
        now: DateTime<Utc>,
    ) -> Result<Reply, RpgError> {
        self.execute_with_rng(user_id, display_name, cmd, now, &mut rand::thread_rng())
    }

    pub fn execute_with_rng<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        display_name: &str,
        cmd: RpgCommand,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Reply, RpgError> {
        debug!("rpg command user={} cmd={:?}", escape_log(user_id), cmd);
        match cmd {
            RpgCommand::Account { user } => self.account(user_id, display_name, user.as_deref()),
            RpgCommand::SetClass { name } => self.with_record(user_id, |record| {
                let class = choose_class(record, &name)?;
                info!("user {} chose class {}", escape_log(user_id), class.id);
                Ok(Reply::ephemeral(format!(
                    "Hmph. Fine. You are now {}.\n{}\nBase HP {} | Mana {} | Luck {}",
                    class.name,
                    class.description,
                    class.base_stats.hp,
                    class.base_stats.mana,
                    class.base_stats.luck
                )))
            }),
            RpgCommand::Hunt => self.with_record(user_id, |record| {
                let out = hunt(record, now, rng)?;
                let loot = if out.loot.is_empty() {
                    "None... how unlucky.".to_string()
                } else {
                    out.loot
                        .iter()
                        .map(|i| format!("[{}] {} (Q: {}%)", i.rarity.name(), i.name, i.quality))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                let mut text = format!(
                    "HUNT SUCCESSFUL\nYou went hunting in the {} and defeated a {}!\n+{} BB | +{} XP\nLoot:\n{}\nTotal monsters hunted: {}",
                    out.area_name, out.enemy_name, out.bb_gained, out.xp_gained, loot, out.monsters_hunted
                );
                push_progress(&mut text, out.quest_progress);
                Ok(with_level_up(Reply::public(text), display_name, out.level_up.as_ref()))
            }),
            RpgCommand::Fish => self.with_record(user_id, |record| {
                let out = fish(record, now, rng)?;
                let mut text = format!(
                    "FISHING SUCCESSFUL\nYou caught a {} [{}] (Q: {}%)!\n+{} BB | +{} XP\nTotal fish caught: {}",
                    out.catch.name,
                    out.catch.rarity.name(),
                    out.catch.quality,
                    out.bb_gained,
                    out.xp_gained,
                    out.fish_caught
                );
                push_progress(&mut text, out.quest_progress);
                Ok(with_level_up(Reply::public(text), display_name, out.level_up.as_ref()))
            }),
            RpgCommand::Explore => self.with_record(user_id, |record| {
                let out = explore(record, now, rng)?;
                let mut text = format!(
                    "EXPLORATION COMPLETE\nYou wandered around and found {} BB in spare change.",
                    out.bb_gained
                );
                push_progress(&mut text, out.quest_progress);
                Ok(Reply::public(text))
            }),
            RpgCommand::Convert { amount } => self.with_record(user_id, |record| {
                let c = convert_bmn(&mut record.economy, amount)?;
                Ok(Reply::ephemeral(format!(
                    "Fine. You converted {} BMN into {} BB. Don't waste it.",
                    c.bmn_spent, c.bb_gained
                )))
            }),
            RpgCommand::Inventory => {
                let users = self.users.load();
                let record = known(&users, user_id)?;
                Ok(Reply::public(format_inventory(record, display_name)))
            }
            RpgCommand::Sell { item } => self.with_record(user_id, |record| {
                let sale = sell_items(record, &item);
                match sale.item_name {
                    None => Err(RpgError::NotFound(format!(
                        "you don't even have any `{}` to sell",
                        item
                    ))),
                    Some(name) => Ok(Reply::ephemeral(format!(
                        "Hmph. You sold {}x {} for {} BB.",
                        sale.items_sold, name, sale.total_value
                    ))),
                }
            }),
            RpgCommand::Equip { item } => self.with_record(user_id, |record| {
                let out = equip_item(record, &item)?;
                let swapped = out
                    .unequipped
                    .map(|old| format!(" and unequipped {}", old))
                    .unwrap_or_default();
                Ok(Reply::ephemeral(format!(
                    "You equipped {} to your {} slot{}.",
                    out.equipped,
                    out.slot.name(),
                    swapped
                )))
            }),
            RpgCommand::ShopView => {
                let users = self.users.load();
                let balance = users.get(user_id).map(|r| r.economy.baddie_bucks).unwrap_or(0);
                Ok(Reply::public(format_shop(balance)))
            }
            RpgCommand::ShopBuy { item, amount } => self.with_record(user_id, |record| {
                let p = buy_item(record, &item, amount)?;
                info!(
                    "user {} bought {}x {} for {} BB",
                    escape_log(user_id),
                    p.amount,
                    escape_log(&item),
                    p.total_cost
                );
                Ok(Reply::ephemeral(format!(
                    "You bought {}x {} for {} BB. My profit.",
                    p.amount, p.item_name, p.total_cost
                )))
            }),
            RpgCommand::Gacha => self.with_record(user_id, |record| {
                let out = pull_gacha(record, rng)?;
                Ok(match out.item {
                    Some(item) => Reply::public(format!(
                        "GACHA ROLL\nYou spent 1 ticket and pulled [{}] {} (Q: {}%)!\nTickets remaining: {}",
                        item.rarity.name(),
                        item.name,
                        item.quality,
                        out.tickets_left
                    )),
                    None => {
                        log::error!("gacha draw for {} matched no tier in the pool", escape_log(user_id));
                        Reply::public(format!(
                            "Ugh. The machine jammed. You lose your ticket. Tickets remaining: {}",
                            out.tickets_left
                        ))
                    }
                })
            }),
            RpgCommand::QuestList => {
                let users = self.users.load();
                let record = known(&users, user_id)?;
                Ok(Reply::ephemeral(format_quest_board(record)))
            }
            RpgCommand::QuestAccept { id } => self.with_record(user_id, |record| {
                let quest = accept_quest(record, &id)?;
                Ok(Reply::ephemeral(format!(
                    "Mission Accepted: {}\nGiver: {}\nObjective: {}",
                    quest.title,
                    quest.giver,
                    describe_objective(quest, None)
                )))
            }),
            RpgCommand::QuestComplete => self.with_record(user_id, |record| {
                let done = complete_quest(record)?;
                let mut text = format!(
                    "MISSION COMPLETE: {}\nGiver: {}\nRewards:\n+ {} BB\n+ {} XP",
                    done.quest.title, done.quest.giver, done.quest.rewards.bb, done.quest.rewards.xp
                );
                for (name, count) in &done.reward_items {
                    text.push_str(&format!("\n+ {}x {}", count, name));
                }
                Ok(with_level_up(Reply::ephemeral(text), display_name, done.level_up.as_ref()))
            }),
        }
    }

    /// Autocomplete for `/rpg sell`.
    pub fn suggest_sell(&self, user_id: &str, partial: &str) -> Vec<Suggestion> {
        let users = self.users.load();
        users
            .get(user_id)
            .map(|record| suggest_items(record, partial))
            .unwrap_or_default()
    }

    /// Load, run `f` on the caller's record, save only when `f` succeeds.
    fn with_record<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserRecord) -> Result<T, RpgError>,
    ) -> Result<T, RpgError> {
        let mut users = self.users.load();
        let record = users.get_mut(user_id).ok_or_else(unknown_user)?;
        let out = f(record)?;
        self.users.save(&users);
        Ok(out)
    }

    fn account(&self, caller: &str, caller_name: &str, target: Option<&str>) -> Result<Reply, RpgError> {
        let users = self.users.load();
        let target_id = target.unwrap_or(caller);
        let record = users.get(target_id).ok_or_else(|| {
            RpgError::NotFound(format!(
                "{} hasn't started their punk journey yet. Tell them to chat first",
                target_id
            ))
        })?;
        let fallback = if target.is_some() { target_id } else { caller_name };
        Ok(Reply::public(format_account(record, record.display_name(fallback))))
    }
}

fn unknown_user() -> RpgError {
    RpgError::NotFound("I don't even know you. Chat first".to_string())
}

fn known<'a>(users: &'a UserMap, user_id: &str) -> Result<&'a UserRecord, RpgError> {
    users.get(user_id).ok_or_else(unknown_user)
}

fn push_progress(text: &mut String, progress: Option<(u32, u32)>) {
    if let Some((done, total)) = progress {
        text.push_str(&format!("\n[Quest Progress: {}/{}]", done, total));
    }
}

fn with_level_up(reply: Reply, name: &str, report: Option<&LevelUpReport>) -> Reply {
    match report {
        Some(report) => reply.with_followup(format_level_up(name, report)),
        None => reply,
    }
}

pub fn format_level_up(name: &str, report: &LevelUpReport) -> String {
    let mut text = format!(
        "ATTENTION! {} has leveled up! Don't get cocky. RPG Level {}.",
        name, report.to_level
    );
    if let Some(g) = report.gains {
        text.push_str(&format!(
            "\nStats increased: +{} HP, +{} Mana, +{} Luck, +{} Spirit, +{} Corruption",
            g.hp, g.mana, g.luck, g.spirit_bond, g.corruption
        ));
    }
    if let Some(area) = report.unlocked_area {
        text.push_str(&format!("\nNew Area Unlocked! You can now hunt in the {}.", area));
    }
    text
}

pub fn format_account(record: &UserRecord, name: &str) -> String {
    let rpg = &record.rpg;
    let class_name = catalog::class(&rpg.stats.class)
        .map(|c| c.name)
        .unwrap_or("None");
    let total = total_stats(record);
    let slot = |item: &Option<Item>| {
        item.as_ref()
            .map(|i| format!("{} [{}]", i.name, i.rarity.name()))
            .unwrap_or_else(|| "(empty)".to_string())
    };
    format!(
        "{}'s RPG Account\nClass: {} | Level {} ({}/{} XP)\nBB: {}\nHP {} | Mana {} | Luck {} | Spirit {} | Corruption {} | ATK {} | DEF {}\nWeapon: {}\nArmor: {}",
        name,
        class_name,
        rpg.level,
        rpg.xp,
        rpg_xp_required(rpg.level),
        record.economy.baddie_bucks,
        total.hp,
        total.mana,
        total.luck,
        total.spirit_bond,
        total.corruption,
        total.atk,
        total.def,
        slot(&rpg.equipment.weapon),
        slot(&rpg.equipment.armor)
    )
}
