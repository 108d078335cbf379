use std::{fmt, str::FromStr};

use thiserror::Error;
use url::Url;

const TELEGRAM_HOSTS: [&str; 3] = ["t.me", "telegram.me", "www.t.me"];
const MAX_USERNAME_LEN: usize = 32;
// First path segments of t.me links that do not name a channel.
const RESERVED_PATHS: [&str; 10] = [
    "joinchat",
    "c",
    "addlist",
    "addstickers",
    "addemoji",
    "share",
    "proxy",
    "socks",
    "login",
    "boost",
];

/// Why a channel reference was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelHandleError {
    /// Nothing was given.
    #[error("Channel reference is empty")]
    Empty,
    /// Looks like a link but does not parse.
    #[error("Invalid channel link: {0}")]
    InvalidUrl(String),
    /// A link to somewhere other than Telegram.
    #[error("Link must point to t.me, got {0}")]
    UnsupportedHost(String),
    /// A Telegram link that does not name a public channel, such as an
    /// invite link.
    #[error("Not a public channel link: {0}")]
    NotAChannel(String),
    /// The name has characters a username cannot have.
    #[error("Invalid channel name: {0}")]
    InvalidName(String),
}

/// A public channel reference in canonical `@name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelHandle(String);

impl ChannelHandle {
    /// Normalizes a bare name, an `@name` or a `https://t.me/name` link.
    /// Invite links, private `t.me/c/..` links and other service paths are
    /// rejected.
    pub fn parse(raw: &str) -> Result<Self, ChannelHandleError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ChannelHandleError::Empty);
        }

        let name =
            if is_link(raw) { name_from_link(raw)? } else { raw.trim_start_matches('@').to_string() };

        if name.starts_with('+') || RESERVED_PATHS.iter().any(|r| name.eq_ignore_ascii_case(r)) {
            return Err(ChannelHandleError::NotAChannel(raw.to_string()));
        }

        if name.is_empty()
            || name.len() > MAX_USERNAME_LEN
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ChannelHandleError::InvalidName(name));
        }

        Ok(Self(format!("@{name}")))
    }

    /// The canonical `@name` form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without the leading `@`.
    pub fn username(&self) -> &str {
        &self.0[1..]
    }

    /// Public link to the channel.
    pub fn url(&self) -> String {
        format!("https://t.me/{}", self.username())
    }
}

fn is_link(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || TELEGRAM_HOSTS.iter().any(|host| lower.starts_with(&format!("{host}/")))
}

fn name_from_link(raw: &str) -> Result<String, ChannelHandleError> {
    let with_scheme = if raw.contains("://") { raw.to_string() } else { format!("https://{raw}") };
    let url =
        Url::parse(&with_scheme).map_err(|e| ChannelHandleError::InvalidUrl(e.to_string()))?;

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if !TELEGRAM_HOSTS.contains(&host.as_str()) {
        return Err(ChannelHandleError::UnsupportedHost(host));
    }

    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());
    let first = segments.next().unwrap_or_default();
    // `t.me/s/name` is the web preview of a public channel.
    let name = if first == "s" { segments.next().unwrap_or_default() } else { first };

    Ok(name.to_string())
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChannelHandle {
    type Err = ChannelHandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
