//! Cache namespaces and the local key layout.
//!
//! Every cached unit of work lives in exactly one [`Namespace`]. The
//! namespace decides the entry TTL, the remote table the entry is
//! replicated to, and the tag used inside local keys:
//!
//! ```text
//! parlay:matchup:kc-lv
//! ^^^^^^^ fixed prefix
//!        ^^^^^^^^ namespace tag
//!                ^^^^^ entity id
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Prefix shared by every key this crate writes to the local tier.
pub const LOCAL_KEY_PREFIX: &str = "parlay:";

/// Logical partition of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    /// AI matchup analysis keyed by game id.
    Matchup,
    /// Weekly schedule keyed by week label.
    Schedule,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Matchup, Namespace::Schedule];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Matchup => "matchup",
            Self::Schedule => "schedule",
        }
    }

    /// TTL before an entry in this namespace is treated as absent.
    pub fn default_ttl(&self) -> Duration {
        match self {
            Self::Matchup => Duration::from_secs(24 * 60 * 60),
            Self::Schedule => Duration::from_secs(6 * 60 * 60),
        }
    }

    /// Remote table holding this namespace's rows.
    pub fn remote_table(&self) -> &'static str {
        match self {
            Self::Matchup => "matchup_analyses",
            Self::Schedule => "schedules",
        }
    }

    /// Prefix of every local key in this namespace.
    pub fn local_prefix(&self) -> String {
        format!("{}{}:", LOCAL_KEY_PREFIX, self.tag())
    }

    /// Build the local key for `id`.
    pub fn local_key(&self, id: &str) -> String {
        format!("{}{}", self.local_prefix(), id)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error parsing a [`Namespace`] from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceParseError(pub String);

impl fmt::Display for NamespaceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown namespace: {} (expected matchup or schedule)", self.0)
    }
}

impl std::error::Error for NamespaceParseError {}

impl FromStr for Namespace {
    type Err = NamespaceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "matchup" | "matchups" => Ok(Self::Matchup),
            "schedule" | "schedules" => Ok(Self::Schedule),
            other => Err(NamespaceParseError(other.to_string())),
        }
    }
}

/// A raw local key split back into its namespace and entity id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalKey<'a> {
    pub namespace: Namespace,
    pub id: &'a str,
}

impl<'a> LocalKey<'a> {
    /// Parse a raw local key. Keys written by other applications, or with
    /// an unknown tag, yield `None`.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let rest = raw.strip_prefix(LOCAL_KEY_PREFIX)?;
        let (tag, id) = rest.split_once(':')?;
        let namespace = Namespace::ALL.into_iter().find(|ns| ns.tag() == tag)?;
        Some(Self { namespace, id })
    }
}
