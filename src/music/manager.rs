//! Per-guild playback queues.
//!
//! A guild has a queue only while something is playing. The track at the
//! front of a queue is the one streaming; it is popped when its session
//! reports `Finished` or `Errored`, never by the command that caused it.
//! Skip therefore only stops the player and lets the event do the advance.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

use crate::logutil::escape_log;
use crate::music::errors::PlaybackError;
use crate::music::ports::{AudioSource, NoticeSink, VoiceBackend, VoiceSession};
use crate::music::types::{GuildId, Track, TrackEvent, TrackEventKind, TrackMetadata};
use crate::validation::validate_media_url;

struct GuildQueue {
    session: Box<dyn VoiceSession>,
    tracks: VecDeque<Track>,
    /// Token of the play call for `tracks.front()`.
    token: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    NowPlaying(TrackMetadata),
    /// Waiting behind `position` tracks (the playing one included).
    Queued { track: TrackMetadata, position: usize },
    /// The stream could not be opened; a failure notice was sent.
    Failed(TrackMetadata),
}

pub struct PlaybackManager {
    source: Arc<dyn AudioSource>,
    voice: Arc<dyn VoiceBackend>,
    notices: Arc<dyn NoticeSink>,
    allowed_hosts: Vec<String>,
    queues: Mutex<HashMap<GuildId, GuildQueue>>,
    events: UnboundedSender<TrackEvent>,
    next_token: AtomicU64,
}

impl PlaybackManager {
    /// Returns the manager and the receiver its voice sessions report on;
    /// feed the receiver to [`PlaybackManager::run_events`].
    pub fn new(
        source: Arc<dyn AudioSource>,
        voice: Arc<dyn VoiceBackend>,
        notices: Arc<dyn NoticeSink>,
        allowed_hosts: Vec<String>,
    ) -> (Arc<Self>, UnboundedReceiver<TrackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = Arc::new(Self {
            source,
            voice,
            notices,
            allowed_hosts,
            queues: Mutex::new(HashMap::new()),
            events: tx,
            next_token: AtomicU64::new(1),
        });
        (manager, rx)
    }

    /// Drain track events until every sender is gone.
    pub async fn run_events(self: Arc<Self>, mut rx: UnboundedReceiver<TrackEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(event).await;
        }
        debug!("track event channel closed");
    }

    /// Validate the link, resolve metadata, then queue it. A guild without a
    /// queue gets a voice connection first.
    pub async fn enqueue(
        &self,
        guild: &str,
        voice_channel: Option<&str>,
        url: &str,
        requested_by: &str,
    ) -> Result<EnqueueOutcome, PlaybackError> {
        let channel = voice_channel.ok_or(PlaybackError::NoVoiceChannel)?;
        let url = validate_media_url(url, &self.allowed_hosts)?;
        let meta = self.source.metadata(&url).await?;
        info!(
            "[{}] {} queued '{}'",
            guild,
            escape_log(requested_by),
            escape_log(&meta.title)
        );

        let mut queues = self.queues.lock().await;
        if !queues.contains_key(guild) {
            let session = self.voice.join(guild, channel, self.events.clone()).await?;
            info!("[{}] joined voice channel {}", guild, escape_log(channel));
            queues.insert(
                guild.to_string(),
                GuildQueue {
                    session,
                    tracks: VecDeque::new(),
                    token: 0,
                },
            );
        }

        let queue = queues
            .get_mut(guild)
            .ok_or_else(|| PlaybackError::Voice("queue vanished while enqueueing".to_string()))?;
        queue.tracks.push_back(Track {
            meta: meta.clone(),
            requested_by: requested_by.to_string(),
        });
        let position = queue.tracks.len() - 1;
        if position > 0 {
            return Ok(EnqueueOutcome::Queued { track: meta, position });
        }

        match self.play_front(&mut queues, guild, false).await {
            Some(playing) => Ok(EnqueueOutcome::NowPlaying(playing)),
            None => Ok(EnqueueOutcome::Failed(meta)),
        }
    }

    /// Stop the current track; the resulting `Finished` event advances.
    pub async fn skip(&self, guild: &str) -> Result<TrackMetadata, PlaybackError> {
        let mut queues = self.queues.lock().await;
        let queue = queues.get_mut(guild).ok_or(PlaybackError::NothingPlaying)?;
        let current = queue
            .tracks
            .front()
            .map(|t| t.meta.clone())
            .ok_or(PlaybackError::NothingPlaying)?;
        queue.session.stop().await;
        info!("[{}] skipped '{}'", guild, escape_log(&current.title));
        Ok(current)
    }

    /// Clear the queue and leave voice. Returns how many tracks were dropped.
    pub async fn stop(&self, guild: &str) -> Result<usize, PlaybackError> {
        let mut queue = self
            .queues
            .lock()
            .await
            .remove(guild)
            .ok_or(PlaybackError::NothingPlaying)?;
        queue.session.leave().await;
        info!("[{}] stopped, cleared {} track(s)", guild, queue.tracks.len());
        Ok(queue.tracks.len())
    }

    /// Tracks for `guild`, playing one first.
    pub async fn queue_snapshot(&self, guild: &str) -> Vec<Track> {
        self.queues
            .lock()
            .await
            .get(guild)
            .map(|q| q.tracks.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn has_queue(&self, guild: &str) -> bool {
        self.queues.lock().await.contains_key(guild)
    }

    pub async fn handle_event(&self, event: TrackEvent) {
        let mut queues = self.queues.lock().await;
        let Some(queue) = queues.get_mut(&event.guild) else {
            debug!("[{}] event for torn-down queue ignored", event.guild);
            return;
        };
        if queue.token != event.token {
            debug!("[{}] stale track event {} ignored", event.guild, event.token);
            return;
        }

        if let Some(done) = queue.tracks.pop_front() {
            match &event.kind {
                TrackEventKind::Finished => {
                    debug!("[{}] finished '{}'", event.guild, escape_log(&done.meta.title))
                }
                TrackEventKind::Errored(reason) => {
                    warn!(
                        "[{}] stream error on '{}': {}",
                        event.guild,
                        escape_log(&done.meta.title),
                        escape_log(reason)
                    );
                    self.notices.notify(
                        &event.guild,
                        &format!("Couldn't keep playing {}: {}. Skipping.", done.meta.title, reason),
                    );
                }
            }
        }
        self.play_front(&mut queues, &event.guild, true).await;
    }

    /// Start the front track, dropping any whose stream will not open.
    /// Tears the queue down once it is empty.
    async fn play_front(
        &self,
        queues: &mut HashMap<GuildId, GuildQueue>,
        guild: &str,
        announce: bool,
    ) -> Option<TrackMetadata> {
        loop {
            let next = queues.get(guild).and_then(|q| q.tracks.front().cloned());
            let Some(track) = next else {
                if let Some(mut queue) = queues.remove(guild) {
                    queue.session.leave().await;
                    info!("[{}] queue empty, left voice", guild);
                }
                return None;
            };
            let queue = queues.get_mut(guild)?;

            let token = self.next_token.fetch_add(1, Ordering::Relaxed);
            queue.token = token;
            let started = match self.source.open_stream(&track.meta.url).await {
                Ok(stream) => queue.session.play(stream, token).await,
                Err(e) => Err(e),
            };

            match started {
                Ok(()) => {
                    info!("[{}] now playing '{}'", guild, escape_log(&track.meta.title));
                    if announce {
                        self.notices.notify(guild, &now_playing(&track));
                    }
                    return Some(track.meta);
                }
                Err(e) => {
                    warn!("[{}] could not start '{}': {}", guild, escape_log(&track.meta.title), e);
                    self.notices
                        .notify(guild, &format!("Couldn't play {}: {}", track.meta.title, e));
                    queue.tracks.pop_front();
                }
            }
        }
    }
}

pub fn now_playing(track: &Track) -> String {
    format!(
        "Now playing: {} by {} [{}] (requested by {})",
        track.meta.title,
        track.meta.channel,
        track.meta.duration_label(),
        track.requested_by
    )
}
