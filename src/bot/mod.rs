//! Bot front: command routing, chat leveling and the console driver.
//!
//! The router turns raw slash-command text into typed commands, runs them and
//! converts every failure into a reply. Nothing below the router talks to a
//! chat platform directly.

pub mod chat;
pub mod console;
pub mod options;
pub mod router;

pub use chat::ChatLeveler;
pub use router::{BotCommand, Caller, Router};

/// Text sent back to the invoking user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Only the invoking user sees it.
    pub ephemeral: bool,
    /// Public follow-up messages (level-up announcements).
    pub followups: Vec<String>,
}

impl Reply {
    pub fn public(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: false,
            followups: Vec::new(),
        }
    }

    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: true,
            followups: Vec::new(),
        }
    }

    pub fn with_followup(mut self, text: impl Into<String>) -> Self {
        self.followups.push(text.into());
        self
    }
}
