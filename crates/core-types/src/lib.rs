use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the LogSearch integration crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmbariError {
    #[error("{message}")]
    Message { message: String },
}

impl AmbariError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Component name to log file names, as reported by LogSearch for a single host.
pub type HostLogFiles = HashMap<String, Vec<String>>;

const KEY_SEPARATOR: char = '+';
const KEY_ESCAPE: char = '\\';

/// Cache identity of a (component, host) pair.
///
/// Rendered as `component+host`. A `+` or `\` inside either name is escaped with a
/// leading `\`, so two distinct pairs never render to the same key.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(component: &str, host: &str) -> Self {
        let mut raw = String::with_capacity(component.len() + host.len() + 1);
        push_escaped(&mut raw, component);
        raw.push(KEY_SEPARATOR);
        push_escaped(&mut raw, host);
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recovers the `(component, host)` pair the key was built from.
    pub fn split(&self) -> (String, String) {
        let mut component = String::new();
        let mut host = String::new();
        let mut in_host = false;
        let mut chars = self.0.chars();
        while let Some(ch) = chars.next() {
            let target = if in_host { &mut host } else { &mut component };
            match ch {
                KEY_ESCAPE => {
                    if let Some(escaped) = chars.next() {
                        target.push(escaped);
                    }
                }
                KEY_SEPARATOR if !in_host => in_host = true,
                other => target.push(other),
            }
        }
        (component, host)
    }
}

fn push_escaped(buf: &mut String, part: &str) {
    for ch in part.chars() {
        if ch == KEY_SEPARATOR || ch == KEY_ESCAPE {
            buf.push(KEY_ESCAPE);
        }
        buf.push(ch);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shorthand for [`CacheKey::new`].
pub fn generate_key(component: &str, host: &str) -> CacheKey {
    CacheKey::new(component, host)
}

/// Identifier attached to a dispatched fetch, used to correlate log lines.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FetchId(pub String);

impl FetchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for FetchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FetchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_use_plus_separator() {
        let key = CacheKey::new("NAMENODE", "host1");
        assert_eq!(key.as_str(), "NAMENODE+host1");
        assert_eq!(key.to_string(), "NAMENODE+host1");
    }

    #[test]
    fn separator_inside_names_does_not_collide() {
        let left = CacheKey::new("A+B", "C");
        let right = CacheKey::new("A", "B+C");
        assert_ne!(left, right);
        assert_eq!(left.as_str(), "A\\+B+C");
        assert_eq!(right.as_str(), "A+B\\+C");
    }

    #[test]
    fn escape_character_is_itself_escaped() {
        let left = CacheKey::new("A\\", "+B");
        let right = CacheKey::new("A\\+", "B");
        assert_ne!(left, right);
    }

    #[test]
    fn split_recovers_component_and_host() {
        for (component, host) in [
            ("NAMENODE", "host1"),
            ("A+B", "C"),
            ("weird\\name", "h+o+s+t"),
            ("", ""),
        ] {
            let key = generate_key(component, host);
            assert_eq!(key.split(), (component.to_string(), host.to_string()));
        }
    }

    #[test]
    fn fetch_ids_are_unique() {
        assert_ne!(FetchId::new(), FetchId::new());
    }
}
