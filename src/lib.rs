//! # Punktune - RPG economy and music bot
//!
//! Punktune is the game layer of a chat bot: slash commands drive a
//! persistent per-user RPG (currencies, inventory, equipment, quests, gacha,
//! hunting and fishing) stored in one JSON file, and a per-guild music queue
//! streams links through `yt-dlp`.
//!
//! ## Features
//!
//! - **Progression Engine**: cooldowns, level-gated areas, luck-weighted loot rolls, gacha and level-up cascades.
//! - **Economy Ledger**: two currencies with a fixed conversion rate, a shop, selling and equipment slots.
//! - **Quests**: one active quest per user with activity counters or live inventory checks.
//! - **Music Queue**: FIFO per guild; failing tracks are reported and skipped without stopping the queue.
//! - **Console Front End**: drive every command from stdin for local play and debugging.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use punktune::config::Config;
//! use punktune::storage::JsonUserStore;
//! use punktune::rpg::{RpgCommand, RpgService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = Arc::new(JsonUserStore::new(config.storage.users_path()));
//!     let rpg = RpgService::new(store);
//!     let reply = rpg.execute("1234", "kuro", RpgCommand::Explore, chrono::Utc::now());
//!     println!("{:?}", reply);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - command routing, chat leveling and the console driver
//! - [`rpg`] - game data model, catalog, progression, economy and quests
//! - [`music`] - playback queues and the audio source / voice ports
//! - [`storage`] - the JSON user store
//! - [`config`] - configuration loading
//! - [`validation`] - input validation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Bot Router     │ ← parse, dispatch, error boundary
//! └─────────────────┘
//!     │         │
//! ┌────────┐ ┌──────────┐
//! │  RPG   │ │  Music   │ ← game rules / playback queues
//! └────────┘ └──────────┘
//!     │         │
//! ┌────────┐ ┌──────────┐
//! │Storage │ │ yt-dlp / │ ← user store / audio + voice
//! │        │ │ voice    │
//! └────────┘ └──────────┘
//! ```

pub mod bot;
pub mod config;
pub mod logutil;
pub mod music;
pub mod rpg;
pub mod storage;
pub mod validation;
