use thiserror::Error;

use crate::validation::UrlError;

/// Playback failures. All of them are reported to the requester; none of
/// them tear down a queue on their own.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("you need to be in a voice channel first")]
    NoVoiceChannel,

    #[error("{0}")]
    InvalidUrl(#[from] UrlError),

    #[error("audio source failed: {0}")]
    Source(String),

    #[error("voice connection failed: {0}")]
    Voice(String),

    #[error("nothing is playing right now")]
    NothingPlaying,
}

impl PlaybackError {
    /// Whether the message is meant for the requester as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            PlaybackError::NoVoiceChannel | PlaybackError::InvalidUrl(_) | PlaybackError::NothingPlaying
        )
    }
}
