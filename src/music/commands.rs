use crate::bot::options::{parse_options, OptionKind, OptionSpec};
use crate::bot::Reply;
use crate::music::errors::PlaybackError;
use crate::music::manager::{EnqueueOutcome, PlaybackManager};
use crate::music::types::format_duration;
use crate::rpg::errors::RpgError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicCommand {
    Play { url: String },
    Skip,
    Stop,
    Queue,
}

const PLAY_OPTS: &[OptionSpec] = &[OptionSpec::required("url", OptionKind::String)];

impl MusicCommand {
    /// Parse the tokens following `/music`.
    pub fn parse(args: &[&str]) -> Result<Self, RpgError> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(RpgError::InvalidInput("usage: /music <play|skip|stop|queue>".to_string()));
        };
        match sub.to_lowercase().as_str() {
            "play" => Ok(MusicCommand::Play {
                url: parse_options(PLAY_OPTS, rest)?.require_string("url")?,
            }),
            "skip" => Ok(MusicCommand::Skip),
            "stop" => Ok(MusicCommand::Stop),
            "queue" => Ok(MusicCommand::Queue),
            other => Err(RpgError::InvalidInput(format!("unknown music command `{}`", other))),
        }
    }
}

/// Run a music command. Everything but `queue` needs the caller in voice.
pub async fn execute(
    manager: &PlaybackManager,
    guild: &str,
    voice_channel: Option<&str>,
    requested_by: &str,
    cmd: MusicCommand,
) -> Result<Reply, PlaybackError> {
    if cmd != MusicCommand::Queue && voice_channel.is_none() {
        return Err(PlaybackError::NoVoiceChannel);
    }
    match cmd {
        MusicCommand::Play { url } => {
            let reply = match manager.enqueue(guild, voice_channel, &url, requested_by).await? {
                EnqueueOutcome::NowPlaying(meta) => Reply::public(format!(
                    "Now playing: {} by {} [{}]",
                    meta.title,
                    meta.channel,
                    meta.duration_label()
                )),
                EnqueueOutcome::Queued { track, position } => Reply::public(format!(
                    "Queued: {} [{}] at position {}",
                    track.title,
                    track.duration_label(),
                    position
                )),
                EnqueueOutcome::Failed(meta) => {
                    Reply::ephemeral(format!("Couldn't start {}. Try another link.", meta.title))
                }
            };
            Ok(reply)
        }
        MusicCommand::Skip => {
            let skipped = manager.skip(guild).await?;
            Ok(Reply::public(format!("Skipped {}.", skipped.title)))
        }
        MusicCommand::Stop => {
            let cleared = manager.stop(guild).await?;
            Ok(Reply::public(format!(
                "Stopped playback and cleared {} track(s). Bye.",
                cleared
            )))
        }
        MusicCommand::Queue => {
            let tracks = manager.queue_snapshot(guild).await;
            if tracks.is_empty() {
                return Err(PlaybackError::NothingPlaying);
            }
            let total: u64 = tracks.iter().map(|t| t.meta.duration_secs).sum();
            let mut text = format!("Queue ({} track(s), {}):", tracks.len(), format_duration(total));
            for (i, track) in tracks.iter().enumerate() {
                let marker = if i == 0 { "▶".to_string() } else { i.to_string() };
                text.push_str(&format!(
                    "\n{} {} [{}] - {}",
                    marker,
                    track.meta.title,
                    track.meta.duration_label(),
                    track.requested_by
                ));
            }
            Ok(Reply::ephemeral(text))
        }
    }
}
