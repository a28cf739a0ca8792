//! Voice-channel music: one FIFO queue per guild, one streaming track at a time.

pub mod commands;
pub mod drain;
pub mod errors;
pub mod manager;
pub mod ports;
pub mod types;
pub mod ytdlp;

pub use commands::MusicCommand;
pub use drain::DrainVoiceBackend;
pub use errors::PlaybackError;
pub use manager::{EnqueueOutcome, PlaybackManager};
pub use ports::{AudioSource, NoticeSink, VoiceBackend, VoiceSession};
pub use types::{format_duration, AudioStream, GuildId, Track, TrackEvent, TrackEventKind, TrackMetadata};
pub use ytdlp::YtDlpSource;
