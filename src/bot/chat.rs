//! Passive leveling from ordinary chat lines and the `/profile` card.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;

use crate::bot::Reply;
use crate::logutil::escape_log;
use crate::rpg::economy::credit_bmn;
use crate::rpg::errors::RpgError;
use crate::rpg::progression::apply_account_level_ups;
use crate::rpg::types::{account_xp_required, UserRecord};
use crate::storage::UserRepository;

const PROGRESS_SEGMENTS: u64 = 10;
const PRUNE_TTL: Duration = Duration::from_secs(30 * 60);

/// Grants account XP and BMN for chat activity, at most once per cooldown per user.
pub struct ChatLeveler {
    users: Arc<dyn UserRepository>,
    last_award: HashMap<String, Instant>,
    cooldown: Duration,
}

impl ChatLeveler {
    pub fn new(users: Arc<dyn UserRepository>, cooldown: Duration) -> Self {
        Self {
            users,
            last_award: HashMap::new(),
            cooldown,
        }
    }

    /// Handle one non-command chat line. Returns a public announcement on account level-up.
    pub fn on_message(&mut self, user_id: &str, username: &str) -> Option<Reply> {
        self.on_message_at(user_id, username, Utc::now(), Instant::now(), &mut rand::thread_rng())
    }

    pub fn on_message_at<R: Rng + ?Sized>(
        &mut self,
        user_id: &str,
        username: &str,
        now: DateTime<Utc>,
        tick: Instant,
        rng: &mut R,
    ) -> Option<Reply> {
        if !self.allow(user_id, tick) {
            debug!("chat xp for {} still cooling down", escape_log(user_id));
            return None;
        }

        let now_ms = now.timestamp_millis();
        let mut users = self.users.load();
        let record = users.entry(user_id.to_string()).or_insert_with(|| {
            info!("new user {} ({})", escape_log(user_id), escape_log(username));
            UserRecord::new(username, now_ms)
        });

        record.account.xp += rng.gen_range(15..=25);
        credit_bmn(&mut record.economy, rng.gen_range(100..=250));
        record.meta.message_count += 1;
        record.meta.last_seen = now_ms;
        let leveled = apply_account_level_ups(&mut record.account);
        let name = record.display_name(username).to_string();
        self.users.save(&users);

        leveled.map(|level| {
            info!("user {} reached account level {}", escape_log(user_id), level);
            Reply::public(format!(
                "Ugh, {} leveled up to {}. Whatever, don't let it go to your head.",
                name, level
            ))
        })
    }

    fn allow(&mut self, user_id: &str, tick: Instant) -> bool {
        let ttl = PRUNE_TTL.max(self.cooldown);
        self.last_award.retain(|_, t| tick.saturating_duration_since(*t) < ttl);
        match self.last_award.get(user_id) {
            Some(last) if tick.saturating_duration_since(*last) < self.cooldown => false,
            _ => {
                self.last_award.insert(user_id.to_string(), tick);
                true
            }
        }
    }
}

/// `/profile [user]`.
pub fn profile(
    users: &dyn UserRepository,
    caller: &str,
    caller_name: &str,
    target: Option<&str>,
) -> Result<Reply, RpgError> {
    let map = users.load();
    let target_id = target.unwrap_or(caller);
    let record = map.get(target_id).ok_or_else(|| {
        if target.is_some() {
            RpgError::NotFound(format!("{} hasn't said anything yet", target_id))
        } else {
            RpgError::NotFound("I don't even know you. Chat first".to_string())
        }
    })?;
    let fallback = if target.is_some() { record.username.as_str() } else { caller_name };
    Ok(Reply::public(format_profile(record, record.display_name(fallback))))
}

pub fn format_profile(record: &UserRecord, name: &str) -> String {
    let needed = account_xp_required(record.account.level);
    let mut text = format!(
        "{}\n{}\nLevel {} {} {}/{} XP\nBMN: {} | Messages: {}",
        name,
        record.profile.title,
        record.account.level,
        progress_bar(record.account.xp, needed),
        record.account.xp,
        needed,
        record.economy.black_musical_notes,
        record.meta.message_count
    );
    if let Some(song) = &record.profile.fav_song {
        text.push_str(&format!("\nFavorite song: {}", song));
    }
    if !record.profile.badges.is_empty() {
        let badges: Vec<&str> = record.profile.badges.iter().map(String::as_str).collect();
        text.push_str(&format!("\nBadges: {}", badges.join(", ")));
    }
    text
}

fn progress_bar(xp: u64, needed: u64) -> String {
    let filled = if needed == 0 {
        PROGRESS_SEGMENTS
    } else {
        (xp.saturating_mul(PROGRESS_SEGMENTS) / needed).min(PROGRESS_SEGMENTS)
    };
    format!(
        "[{}{}]",
        "#".repeat(filled as usize),
        "-".repeat((PROGRESS_SEGMENTS - filled) as usize)
    )
}
