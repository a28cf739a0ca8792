use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

pub type GuildId = String;

/// Continuous audio bytes handed to the voice session.
pub type AudioStream = Pin<Box<dyn AsyncRead + Send>>;

/// What the audio source knows about a link before any bytes flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    /// Channel or artist name.
    pub channel: String,
    /// Canonical page URL; streamed instead of the link the user pasted.
    pub url: String,
    pub thumbnail: Option<String>,
    pub duration_secs: u64,
}

impl TrackMetadata {
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub meta: TrackMetadata,
    pub requested_by: String,
}

/// `m:ss`; minutes are not wrapped into hours.
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Signal a voice session raises about the track it was told to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    pub guild: GuildId,
    /// Play token handed to `VoiceSession::play`; stale tokens are ignored.
    pub token: u64,
    pub kind: TrackEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEventKind {
    Finished,
    Errored(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3_725), "62:05");
    }
}
