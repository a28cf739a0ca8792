//! Collaborators the playback manager talks to.
//!
//! The audio source resolves links and produces bytes; the voice backend
//! owns connections and reports track completion through the event channel
//! it is given at join time. Both are swapped for fakes in tests.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::music::errors::PlaybackError;
use crate::music::types::{AudioStream, TrackEvent, TrackMetadata};

#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn metadata(&self, url: &str) -> Result<TrackMetadata, PlaybackError>;

    async fn open_stream(&self, url: &str) -> Result<AudioStream, PlaybackError>;
}

#[async_trait]
pub trait VoiceBackend: Send + Sync {
    /// Open a connection to `channel` in `guild`. The session reports on
    /// `events` whenever a track it plays ends or fails.
    async fn join(
        &self,
        guild: &str,
        channel: &str,
        events: UnboundedSender<TrackEvent>,
    ) -> Result<Box<dyn VoiceSession>, PlaybackError>;
}

#[async_trait]
pub trait VoiceSession: Send + Sync {
    /// Start streaming, replacing anything already playing. Completion is
    /// reported later as a `TrackEvent` carrying `token`.
    async fn play(&mut self, stream: AudioStream, token: u64) -> Result<(), PlaybackError>;

    /// Stop the current track. The session still emits `Finished` for it.
    async fn stop(&mut self);

    /// Release the connection. No events follow.
    async fn leave(&mut self);
}

/// Where "now playing" and failure notices for a guild go.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, guild: &str, message: &str);
}
