//! Test utilities & fixtures: fake audio/voice collaborators and store helpers.

#![allow(dead_code)] // Each test binary uses a different subset.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use punktune::music::{
    AudioSource, AudioStream, NoticeSink, PlaybackError, TrackEvent, TrackEventKind, TrackMetadata,
    VoiceBackend, VoiceSession,
};
use punktune::rpg::{UserMap, UserRecord};
use punktune::storage::{JsonUserStore, UserRepository};

/// Store in a fresh temp dir, seeded with `users`.
pub fn seeded_store(users: &[(&str, UserRecord)]) -> (tempfile::TempDir, Arc<JsonUserStore>) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(JsonUserStore::in_dir(tmp.path(), "users.json"));
    let map: UserMap = users
        .iter()
        .map(|(id, r)| (id.to_string(), r.clone()))
        .collect();
    store.save(&map);
    (tmp, store)
}

pub fn track_url(name: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", name)
}

pub fn allowed_hosts() -> Vec<String> {
    vec!["youtube.com".to_string(), "youtu.be".to_string()]
}

/// Audio source whose behaviour is keyed on the video id in the URL.
#[derive(Default)]
pub struct FakeSource {
    pub broken_streams: HashSet<String>,
    pub broken_metadata: HashSet<String>,
    pub metadata_calls: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_broken_streams(ids: &[&str]) -> Self {
        Self {
            broken_streams: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_broken_metadata(ids: &[&str]) -> Self {
        Self {
            broken_metadata: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.lock().unwrap().len()
    }
}

fn video_id(url: &str) -> String {
    url.rsplit(|c: char| c == '=' || c == '/').next().unwrap_or(url).to_string()
}

#[async_trait]
impl AudioSource for FakeSource {
    async fn metadata(&self, url: &str) -> Result<TrackMetadata, PlaybackError> {
        self.metadata_calls.lock().unwrap().push(url.to_string());
        let id = video_id(url);
        if self.broken_metadata.contains(&id) {
            return Err(PlaybackError::Source("video unavailable".to_string()));
        }
        Ok(TrackMetadata {
            title: format!("Song {}", id),
            channel: "Test Channel".to_string(),
            url: url.to_string(),
            thumbnail: None,
            duration_secs: 125,
        })
    }

    async fn open_stream(&self, url: &str) -> Result<AudioStream, PlaybackError> {
        let id = video_id(url);
        self.opened.lock().unwrap().push(id.clone());
        if self.broken_streams.contains(&id) {
            return Err(PlaybackError::Source("stream refused".to_string()));
        }
        Ok(Box::pin(std::io::Cursor::new(id.into_bytes())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCall {
    Join { guild: String, channel: String },
    Play { token: u64 },
    Stop,
    Leave,
}

/// Voice backend that records calls. Tracks never finish on their own;
/// tests send `TrackEvent`s themselves, except that `stop` emits
/// `Finished` for the current token like a real session.
#[derive(Clone, Default)]
pub struct FakeVoice {
    pub calls: Arc<Mutex<Vec<VoiceCall>>>,
}

impl FakeVoice {
    pub fn calls(&self) -> Vec<VoiceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Token of the most recent successful play call.
    pub fn last_token(&self) -> Option<u64> {
        self.calls().iter().rev().find_map(|c| match c {
            VoiceCall::Play { token } => Some(*token),
            _ => None,
        })
    }

    pub fn count(&self, wanted: &VoiceCall) -> usize {
        self.calls().iter().filter(|c| *c == wanted).count()
    }
}

#[async_trait]
impl VoiceBackend for FakeVoice {
    async fn join(
        &self,
        guild: &str,
        channel: &str,
        events: UnboundedSender<TrackEvent>,
    ) -> Result<Box<dyn VoiceSession>, PlaybackError> {
        self.calls.lock().unwrap().push(VoiceCall::Join {
            guild: guild.to_string(),
            channel: channel.to_string(),
        });
        Ok(Box::new(FakeSession {
            guild: guild.to_string(),
            calls: self.calls.clone(),
            events,
            current: None,
        }))
    }
}

struct FakeSession {
    guild: String,
    calls: Arc<Mutex<Vec<VoiceCall>>>,
    events: UnboundedSender<TrackEvent>,
    current: Option<u64>,
}

#[async_trait]
impl VoiceSession for FakeSession {
    async fn play(&mut self, _stream: AudioStream, token: u64) -> Result<(), PlaybackError> {
        self.calls.lock().unwrap().push(VoiceCall::Play { token });
        self.current = Some(token);
        Ok(())
    }

    async fn stop(&mut self) {
        self.calls.lock().unwrap().push(VoiceCall::Stop);
        if let Some(token) = self.current.take() {
            let _ = self.events.send(TrackEvent {
                guild: self.guild.clone(),
                token,
                kind: TrackEventKind::Finished,
            });
        }
    }

    async fn leave(&mut self) {
        self.calls.lock().unwrap().push(VoiceCall::Leave);
        self.current = None;
    }
}

#[derive(Default)]
pub struct RecordingNotices {
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotices {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl NoticeSink for RecordingNotices {
    fn notify(&self, guild: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((guild.to_string(), message.to_string()));
    }
}
