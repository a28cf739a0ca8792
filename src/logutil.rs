//! Keeps user-supplied text (command lines, URLs, item names, track titles)
//! on one log line.

/// Longest preview kept by [`escape_log`].
pub const MAX_PREVIEW: usize = 200;

/// Escape control characters and cap the length at [`MAX_PREVIEW`] chars.
pub fn escape_log(s: &str) -> String {
    escape_log_with(s, MAX_PREVIEW)
}

/// Like [`escape_log`] with an explicit character cap. Newlines, carriage
/// returns, tabs and backslashes get C-style escapes; other control
/// characters become `\xNN`. Overflow is marked with `…`.
pub fn escape_log_with(s: &str, max_chars: usize) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(s.len().min(max_chars) + 4);
    for (i, ch) in s.chars().enumerate() {
        if i == max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
