//! Command routing and the error boundary.
//!
//! Every inbound line ends here as at most one [`Reply`]. Precondition
//! failures are shown to the caller as-is; anything else is logged and the
//! caller gets a generic failure message.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error};

use crate::bot::chat::{profile, ChatLeveler};
use crate::bot::options::{parse_options, OptionKind, OptionSpec};
use crate::bot::Reply;
use crate::config::Config;
use crate::logutil::escape_log;
use crate::music::commands::{execute as execute_music, MusicCommand};
use crate::music::errors::PlaybackError;
use crate::music::manager::PlaybackManager;
use crate::rpg::commands::{RpgCommand, RpgService};
use crate::rpg::errors::RpgError;
use crate::rpg::inventory::Suggestion;
use crate::storage::UserRepository;

const GENERIC_FAILURE: &str = "Something broke on my end. Try again later.";

/// Who sent a line and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub display_name: String,
    /// None for direct messages.
    pub guild_id: Option<String>,
    /// Voice channel the caller currently sits in.
    pub voice_channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Rpg(RpgCommand),
    Music(MusicCommand),
    Profile { user: Option<String> },
    Ping,
    /// Plain chat line, eligible for passive XP.
    Chat(String),
    Unknown(String),
}

const PROFILE_OPTS: &[OptionSpec] = &[OptionSpec::optional("user", OptionKind::User)];

impl BotCommand {
    pub fn parse(line: &str, prefix: &str) -> Result<Self, RpgError> {
        let trimmed = line.trim();
        let Some(body) = trimmed.strip_prefix(prefix) else {
            return Ok(BotCommand::Chat(trimmed.to_string()));
        };
        let tokens: Vec<&str> = body.split_whitespace().collect();
        let Some((name, args)) = tokens.split_first() else {
            return Ok(BotCommand::Unknown(String::new()));
        };
        match name.to_lowercase().as_str() {
            "rpg" => Ok(BotCommand::Rpg(RpgCommand::parse(args)?)),
            "music" => Ok(BotCommand::Music(MusicCommand::parse(args)?)),
            "profile" => {
                let opts = parse_options(PROFILE_OPTS, args)?;
                Ok(BotCommand::Profile {
                    user: opts.user("user").map(str::to_string),
                })
            }
            "ping" => Ok(BotCommand::Ping),
            other => Ok(BotCommand::Unknown(other.to_string())),
        }
    }
}

pub struct Router {
    prefix: String,
    users: Arc<dyn UserRepository>,
    rpg: RpgService,
    chat: ChatLeveler,
    music: Arc<PlaybackManager>,
}

impl Router {
    pub fn new(config: &Config, users: Arc<dyn UserRepository>, music: Arc<PlaybackManager>) -> Self {
        Self {
            prefix: config.bot.prefix().to_string(),
            rpg: RpgService::new(users.clone()),
            chat: ChatLeveler::new(users.clone(), config.bot.chat_cooldown()),
            users,
            music,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Route one line. Plain chat usually produces no reply.
    pub async fn handle(&mut self, caller: &Caller, line: &str) -> Option<Reply> {
        let command = match BotCommand::parse(line, &self.prefix) {
            Ok(command) => command,
            Err(e) => return Some(rpg_failure(caller, e)),
        };
        debug!("{} -> {:?}", escape_log(&caller.user_id), command);

        match command {
            BotCommand::Chat(text) => {
                if text.is_empty() {
                    return None;
                }
                self.chat.on_message(&caller.user_id, &caller.display_name)
            }
            BotCommand::Rpg(cmd) => Some(
                self.rpg
                    .execute(&caller.user_id, &caller.display_name, cmd, Utc::now())
                    .unwrap_or_else(|e| rpg_failure(caller, e)),
            ),
            BotCommand::Profile { user } => Some(
                profile(self.users.as_ref(), &caller.user_id, &caller.display_name, user.as_deref())
                    .unwrap_or_else(|e| rpg_failure(caller, e)),
            ),
            BotCommand::Music(cmd) => {
                let Some(guild) = caller.guild_id.as_deref() else {
                    return Some(Reply::ephemeral("Music only works inside a server."));
                };
                let result = execute_music(
                    &self.music,
                    guild,
                    caller.voice_channel.as_deref(),
                    &caller.display_name,
                    cmd,
                )
                .await;
                Some(result.unwrap_or_else(|e| playback_failure(caller, e)))
            }
            BotCommand::Ping => Some(Reply::public("Hmph. Pong! ... What are you looking at?")),
            BotCommand::Unknown(name) => Some(Reply::ephemeral(format!(
                "I don't know `{}{}`. Try {}rpg, {}music or {}profile.",
                self.prefix, name, self.prefix, self.prefix, self.prefix
            ))),
        }
    }

    /// Autocomplete for `/rpg sell`.
    pub fn suggest_sell(&self, caller: &Caller, partial: &str) -> Vec<Suggestion> {
        self.rpg.suggest_sell(&caller.user_id, partial)
    }
}

/// Caller-facing text for a precondition failure.
pub fn user_message(e: &RpgError) -> String {
    match e {
        RpgError::NotFound(m) | RpgError::InvalidInput(m) | RpgError::AlreadyInProgress(m) => capitalize(m),
        RpgError::InsufficientFunds { needed, available } => {
            format!("You're broke. You need {} but only have {}.", needed, available)
        }
        RpgError::InsufficientLevel { required, current } => {
            format!("You need to be level {} for that. You're level {}.", required, current)
        }
        RpgError::Cooldown { seconds } => format!("Chill out. Try again in {}s.", seconds),
        other => other.to_string(),
    }
}

fn capitalize(m: &str) -> String {
    let mut chars = m.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn rpg_failure(caller: &Caller, e: RpgError) -> Reply {
    if e.is_user_facing() {
        return Reply::ephemeral(user_message(&e));
    }
    error!("command from {} failed: {}", escape_log(&caller.user_id), e);
    Reply::ephemeral(GENERIC_FAILURE)
}

fn playback_failure(caller: &Caller, e: PlaybackError) -> Reply {
    if e.is_user_facing() {
        return Reply::ephemeral(capitalize(&e.to_string()));
    }
    error!("music command from {} failed: {}", escape_log(&caller.user_id), e);
    Reply::ephemeral(format!("Couldn't do that: {}", e))
}
