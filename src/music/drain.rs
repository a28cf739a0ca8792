//! Voice backend for the console bot: reads each stream to the end and
//! reports completion, without sending audio anywhere.

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::music::errors::PlaybackError;
use crate::music::ports::{VoiceBackend, VoiceSession};
use crate::music::types::{AudioStream, TrackEvent, TrackEventKind};

#[derive(Debug, Default)]
pub struct DrainVoiceBackend;

#[async_trait]
impl VoiceBackend for DrainVoiceBackend {
    async fn join(
        &self,
        guild: &str,
        channel: &str,
        events: UnboundedSender<TrackEvent>,
    ) -> Result<Box<dyn VoiceSession>, PlaybackError> {
        debug!("[{}] drain session opened for {}", guild, channel);
        Ok(Box::new(DrainSession {
            guild: guild.to_string(),
            events,
            current: None,
        }))
    }
}

struct DrainSession {
    guild: String,
    events: UnboundedSender<TrackEvent>,
    current: Option<(u64, JoinHandle<()>)>,
}

impl DrainSession {
    fn abort_current(&mut self) -> Option<u64> {
        self.current.take().map(|(token, handle)| {
            handle.abort();
            token
        })
    }
}

#[async_trait]
impl VoiceSession for DrainSession {
    async fn play(&mut self, mut stream: AudioStream, token: u64) -> Result<(), PlaybackError> {
        self.abort_current();
        let events = self.events.clone();
        let guild = self.guild.clone();
        let handle = tokio::spawn(async move {
            let kind = match tokio::io::copy(&mut stream, &mut tokio::io::sink()).await {
                Ok(bytes) => {
                    debug!("[{}] drained {} bytes", guild, bytes);
                    TrackEventKind::Finished
                }
                Err(e) => TrackEventKind::Errored(e.to_string()),
            };
            let _ = events.send(TrackEvent { guild, token, kind });
        });
        self.current = Some((token, handle));
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(token) = self.abort_current() {
            let _ = self.events.send(TrackEvent {
                guild: self.guild.clone(),
                token,
                kind: TrackEventKind::Finished,
            });
        }
    }

    async fn leave(&mut self) {
        self.abort_current();
        debug!("[{}] drain session closed", self.guild);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_drain_reports_finished() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = DrainVoiceBackend.join("g1", "lounge", tx).await.unwrap();
        let stream: AudioStream = Box::pin(std::io::Cursor::new(vec![0u8; 4096]));
        session.play(stream, 7).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.token, 7);
        assert_eq!(event.kind, TrackEventKind::Finished);
    }

    #[tokio::test]
    async fn test_stop_reports_finished_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = DrainVoiceBackend.join("g1", "lounge", tx).await.unwrap();
        let (_writer, reader) = tokio::io::duplex(64);
        session.play(Box::pin(reader), 3).await.unwrap();
        session.stop().await;
        session.stop().await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.token, 3);
        assert!(rx.try_recv().is_err());
    }
}
