//! Typed slash-command options.
//!
//! Each command declares its options as a static [`OptionSpec`] list. Input
//! tokens of the form `name:value` set an option by name; bare tokens fill
//! the first missing required option, then the first missing optional one.
//! A bare token right after a string option extends that value, so
//! `item:Slime Gel` reads as one option, unless the token fits the next
//! missing non-string option (`vivi_serum 2` sets `amount`).

use std::collections::HashMap;

use crate::rpg::errors::RpgError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    /// A user mention (`<@123>`, `@123`) or raw id.
    User,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub required: bool,
}

impl OptionSpec {
    pub const fn required(name: &'static str, kind: OptionKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: OptionKind) -> Self {
        Self { name, kind, required: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    User(String),
}

/// Validated option values keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    values: HashMap<&'static str, OptionValue>,
}

impl Options {
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(OptionValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::User(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Required string option; the parser already guaranteed presence.
    pub fn require_string(&self, name: &str) -> Result<String, RpgError> {
        self.string(name)
            .map(str::to_string)
            .ok_or_else(|| RpgError::InvalidInput(format!("missing option `{}`", name)))
    }

    pub fn require_integer(&self, name: &str) -> Result<i64, RpgError> {
        self.integer(name)
            .ok_or_else(|| RpgError::InvalidInput(format!("missing option `{}`", name)))
    }
}

/// Parse `tokens` against `specs`.
pub fn parse_options(specs: &[OptionSpec], tokens: &[&str]) -> Result<Options, RpgError> {
    let mut raw: HashMap<&'static str, String> = HashMap::new();
    let mut current: Option<&OptionSpec> = None;

    for token in tokens {
        if let Some((name, value)) = token.split_once(':') {
            if let Some(spec) = specs.iter().find(|s| s.name.eq_ignore_ascii_case(name)) {
                raw.insert(spec.name, value.to_string());
                current = Some(spec);
                continue;
            }
        }

        let fills_next = next_unfilled(specs, &raw).map_or(false, |s| accepts(s.kind, token));
        if let Some(spec) = current.filter(|s| s.kind == OptionKind::String && !fills_next) {
            if let Some(value) = raw.get_mut(spec.name) {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(token);
                continue;
            }
        }

        let target = next_unfilled(specs, &raw)
            .ok_or_else(|| RpgError::InvalidInput(format!("unexpected argument `{}`", token)))?;
        raw.insert(target.name, token.to_string());
        current = Some(target);
    }

    let mut options = Options::default();
    for spec in specs {
        let Some(value) = raw.remove(spec.name).filter(|v| !v.trim().is_empty()) else {
            if spec.required {
                return Err(RpgError::InvalidInput(format!("missing option `{}`", spec.name)));
            }
            continue;
        };
        let value = value.trim();
        let typed = match spec.kind {
            OptionKind::String => OptionValue::String(value.to_string()),
            OptionKind::Integer => OptionValue::Integer(value.parse::<i64>().map_err(|_| {
                RpgError::InvalidInput(format!("`{}` must be a whole number", spec.name))
            })?),
            OptionKind::User => OptionValue::User(parse_mention(value)?),
        };
        options.values.insert(spec.name, typed);
    }
    Ok(options)
}

fn next_unfilled<'a>(
    specs: &'a [OptionSpec],
    raw: &HashMap<&'static str, String>,
) -> Option<&'a OptionSpec> {
    specs
        .iter()
        .find(|s| s.required && !raw.contains_key(s.name))
        .or_else(|| specs.iter().find(|s| !raw.contains_key(s.name)))
}

/// Whether a bare token belongs to a non-string option of `kind`.
fn accepts(kind: OptionKind, token: &str) -> bool {
    match kind {
        OptionKind::String => false,
        OptionKind::Integer => token.parse::<i64>().is_ok(),
        OptionKind::User => token.starts_with("<@") || token.starts_with('@'),
    }
}

fn parse_mention(value: &str) -> Result<String, RpgError> {
    let id = value
        .trim_start_matches("<@")
        .trim_start_matches('!')
        .trim_start_matches('@')
        .trim_end_matches('>');
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        return Err(RpgError::InvalidInput(format!("`{}` is not a user", value)));
    }
    Ok(id.to_string())
}
