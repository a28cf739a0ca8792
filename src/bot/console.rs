//! Line-oriented front end for running the bot without a chat platform.
//!
//! Each input line is `user[@guild[#voice]] text`. A `?partial` token after
//! `/rpg sell` prints autocomplete suggestions instead of selling.

use anyhow::Result;
use log::{info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::bot::router::{Caller, Router};
use crate::bot::Reply;
use crate::logutil::escape_log;
use crate::music::ports::NoticeSink;
use crate::validation::{sanitize_message_content, validate_user_id};

const MAX_LINE_BYTES: usize = 2000;

/// Guild and voice channel assumed when a line names neither.
#[derive(Debug, Clone, Default)]
pub struct ConsoleDefaults {
    pub guild: Option<String>,
    pub voice_channel: Option<String>,
}

/// Playback notices printed straight to stdout.
pub struct ConsoleNotices;

impl NoticeSink for ConsoleNotices {
    fn notify(&self, guild: &str, message: &str) {
        println!("[{}] ♪ {}", guild, message);
    }
}

/// Split a console line into who sent it and what they said.
pub fn parse_console_line(line: &str, defaults: &ConsoleDefaults) -> Result<(Caller, String), String> {
    let line = sanitize_message_content(line, MAX_LINE_BYTES);
    let (who, text) = line.split_once(' ').unwrap_or((line.as_str(), ""));

    let (user, place) = match who.split_once('@') {
        Some((user, place)) => (user, Some(place)),
        None => (who, None),
    };
    let user_id = validate_user_id(user).map_err(|e| e.to_string())?;

    let (guild_id, voice_channel) = match place {
        None => (defaults.guild.clone(), defaults.voice_channel.clone()),
        Some(place) => match place.split_once('#') {
            Some((guild, voice)) => (non_empty(guild), non_empty(voice)),
            None => (non_empty(place), None),
        },
    };

    let caller = Caller {
        display_name: user_id.clone(),
        user_id,
        guild_id,
        voice_channel,
    };
    Ok((caller, text.trim().to_string()))
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// `Some(partial)` when `text` asks for `/rpg sell` suggestions.
fn sell_autocomplete(text: &str, prefix: &str) -> Option<String> {
    let body = text.strip_prefix(prefix)?;
    let mut tokens = body.split_whitespace();
    if !tokens.next()?.eq_ignore_ascii_case("rpg") || !tokens.next()?.eq_ignore_ascii_case("sell") {
        return None;
    }
    let rest = tokens.collect::<Vec<_>>().join(" ");
    rest.strip_prefix('?').map(str::to_string)
}

fn render(reply: &Reply) -> String {
    let mut out = if reply.ephemeral {
        format!("(only you) {}", reply.text)
    } else {
        reply.text.clone()
    };
    for followup in &reply.followups {
        out.push('\n');
        out.push_str(followup);
    }
    out
}

/// Route lines from `reader` until EOF, writing replies to `writer`.
pub async fn serve<R, W>(router: &mut Router, defaults: &ConsoleDefaults, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let (caller, text) = match parse_console_line(&line, defaults) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("bad console line '{}': {}", escape_log(&line), e);
                writer.write_all(format!("! {}\n", e).as_bytes()).await?;
                continue;
            }
        };

        let output = if let Some(partial) = sell_autocomplete(&text, router.prefix()) {
            let suggestions = router.suggest_sell(&caller, &partial);
            if suggestions.is_empty() {
                Some("(no matches)".to_string())
            } else {
                Some(
                    suggestions
                        .iter()
                        .map(|s| format!("  {} -> {}", s.label, s.value))
                        .collect::<Vec<_>>()
                        .join("\n"),
                )
            }
        } else {
            router.handle(&caller, &text).await.map(|reply| render(&reply))
        };

        if let Some(output) = output {
            writer.write_all(output.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    Ok(())
}

/// Console session on stdin/stdout; ends on EOF or Ctrl-C.
pub async fn run_stdin(router: &mut Router, defaults: &ConsoleDefaults) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    tokio::select! {
        result = serve(router, defaults, reader, writer) => {
            info!("console input closed");
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ConsoleDefaults {
        ConsoleDefaults {
            guild: Some("home".into()),
            voice_channel: Some("lounge".into()),
        }
    }

    #[test]
    fn test_parse_console_line() {
        let (caller, text) = parse_console_line("kuro /rpg hunt", &defaults()).unwrap();
        assert_eq!(caller.user_id, "kuro");
        assert_eq!(caller.guild_id.as_deref(), Some("home"));
        assert_eq!(caller.voice_channel.as_deref(), Some("lounge"));
        assert_eq!(text, "/rpg hunt");

        let (caller, _) = parse_console_line("kuro@club#stage hi", &defaults()).unwrap();
        assert_eq!(caller.guild_id.as_deref(), Some("club"));
        assert_eq!(caller.voice_channel.as_deref(), Some("stage"));

        let (caller, _) = parse_console_line("kuro@club hi", &defaults()).unwrap();
        assert_eq!(caller.voice_channel, None);

        let (caller, _) = parse_console_line("kuro@ hi", &defaults()).unwrap();
        assert_eq!(caller.guild_id, None);

        assert!(parse_console_line("ku/ro hi", &defaults()).is_err());
    }

    #[test]
    fn test_sell_autocomplete_detection() {
        assert_eq!(sell_autocomplete("/rpg sell ?sli", "/").as_deref(), Some("sli"));
        assert_eq!(sell_autocomplete("/rpg  sell ?slime g", "/").as_deref(), Some("slime g"));
        assert_eq!(sell_autocomplete("/rpg sell ?", "/").as_deref(), Some(""));
        assert_eq!(sell_autocomplete("/rpg sell slime", "/"), None);
        assert_eq!(sell_autocomplete("/rpg hunt", "/"), None);
        assert_eq!(sell_autocomplete("rpg sell ?x", "/"), None);
    }

    #[test]
    fn test_render_marks_ephemeral() {
        let reply = Reply::ephemeral("hi").with_followup("LEVEL UP");
        assert_eq!(render(&reply), "(only you) hi\nLEVEL UP");
    }
}
