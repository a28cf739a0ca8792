//! Input validation for console identities, chat text and media URLs.

use std::collections::HashSet;

/// Identity validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username is empty")]
    Empty,

    #[error("Username is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Username contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("Username is a reserved system name")]
    Reserved,
}

/// Media URL rejections; shown to the requester verbatim.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("no URL given")]
    Empty,

    #[error("only http(s) links are supported")]
    UnsupportedScheme,

    #[error("links from `{host}` are not supported")]
    HostNotAllowed { host: String },

    #[error("that link does not point at a video")]
    MissingVideo,
}

const MAX_USER_ID: usize = 32;

fn reserved_names() -> HashSet<&'static str> {
    ["system", "bot", "everyone", "here"].iter().copied().collect()
}

/// Validate a console user id. Ids stand in for platform snowflakes, so
/// they are restricted to ASCII letters, digits, `_`, `-` and `.`.
pub fn validate_user_id(id: &str) -> Result<String, UsernameError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(UsernameError::Empty);
    }
    if trimmed.chars().count() > MAX_USER_ID {
        return Err(UsernameError::TooLong { max: MAX_USER_ID });
    }
    if reserved_names().contains(trimmed.to_lowercase().as_str()) {
        return Err(UsernameError::Reserved);
    }

    let invalid: HashSet<char> = trimmed
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || *c == '.'))
        .collect();
    if !invalid.is_empty() {
        let mut chars: Vec<String> = invalid.into_iter().map(|c| format!("'{}'", c.escape_debug())).collect();
        chars.sort();
        return Err(UsernameError::InvalidCharacters { chars: chars.join(", ") });
    }
    Ok(trimmed.to_string())
}

/// Strip control characters and truncate to `max_bytes` on a UTF-8 boundary.
pub fn sanitize_message_content(content: &str, max_bytes: usize) -> String {
    let mut out = String::with_capacity(content.len().min(max_bytes));
    for ch in content.chars() {
        if ch.is_control() && ch != '\t' {
            continue;
        }
        if out.len() + ch.len_utf8() > max_bytes {
            break;
        }
        out.push(ch);
    }
    out.trim().to_string()
}

fn is_url_delimiter(c: char) -> bool {
    matches!(c, '/' | '?' | '#')
}

/// Validate a media link against the allowed host list and return it trimmed.
///
/// Hosts compare case-insensitively with any `www.`/`m.`/`music.` prefix
/// removed. A bare host with no path or query is rejected.
pub fn validate_media_url(url: &str, allowed_hosts: &[String]) -> Result<String, UrlError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(UrlError::Empty);
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or(UrlError::UnsupportedScheme)?;

    let split = rest.find(is_url_delimiter).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(split);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = host_port.split(':').next().unwrap_or(host_port).to_lowercase();
    let bare = ["www.", "m.", "music."]
        .iter()
        .find_map(|p| host.strip_prefix(p))
        .unwrap_or(&host);

    if !allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(bare)) {
        return Err(UrlError::HostNotAllowed { host: bare.to_string() });
    }
    if tail.trim_matches(is_url_delimiter).is_empty() {
        return Err(UrlError::MissingVideo);
    }
    Ok(url.to_string())
}
