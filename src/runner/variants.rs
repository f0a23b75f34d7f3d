//! Named conformance variants.
//!
//! A variant is nothing but a tag expression; the run procedure is identical for all of them.

use std::fmt;
use std::str::FromStr;

/// Feature areas known to pass against the candidate server.
const KNOWN_GOOD: &str = "string incr hash keyspace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConformanceVariant {
    /// Whole suite, baseline exclusions only
    All,
    String,
    Incr,
    List,
    Hash,
    Set,
    Zset,
    Keyspace,
    /// Combination of the areas that currently pass
    KnownGood,
}

impl ConformanceVariant {
    pub const ALL: [ConformanceVariant; 9] = [
        ConformanceVariant::All,
        ConformanceVariant::String,
        ConformanceVariant::Incr,
        ConformanceVariant::List,
        ConformanceVariant::Hash,
        ConformanceVariant::Set,
        ConformanceVariant::Zset,
        ConformanceVariant::Keyspace,
        ConformanceVariant::KnownGood,
    ];

    /// Caller tags for this variant (before baseline exclusions).
    pub fn tags(self) -> &'static str {
        match self {
            ConformanceVariant::All => "",
            ConformanceVariant::String => "string",
            ConformanceVariant::Incr => "incr",
            ConformanceVariant::List => "list",
            ConformanceVariant::Hash => "hash",
            ConformanceVariant::Set => "set",
            ConformanceVariant::Zset => "zset",
            ConformanceVariant::Keyspace => "keyspace",
            ConformanceVariant::KnownGood => KNOWN_GOOD,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConformanceVariant::All => "all",
            ConformanceVariant::KnownGood => "known-good",
            other => other.tags(),
        }
    }
}

impl fmt::Display for ConformanceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConformanceVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|v| v.name()).collect();
                format!("unknown variant '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
