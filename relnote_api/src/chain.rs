use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when an enumerated input is outside its fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    /// Name of the enumeration that failed to parse (e.g., "chain").
    pub kind: &'static str,
    /// Raw value supplied by the caller.
    pub value: String,
    /// Comma-separated list of accepted values.
    pub expected: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str, accepted: &[&str]) -> Self {
        Self {
            kind,
            value: value.to_owned(),
            expected: accepted.join(", "),
        }
    }
}

/// Networks whose releases can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    /// Development and test network.
    Mandala,
    /// Kusama parachain.
    Karura,
    /// Polkadot parachain.
    Acala,
}

impl Chain {
    /// Every supported chain, in declaration order.
    pub const ALL: [Self; 3] = [Self::Mandala, Self::Karura, Self::Acala];

    /// Lower-case identifier used in branch names and runtime paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mandala => "mandala",
            Self::Karura => "karura",
            Self::Acala => "acala",
        }
    }

    /// Capitalised name shown in release notes.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Mandala => "Mandala",
            Self::Karura => "Karura",
            Self::Acala => "Acala",
        }
    }

    /// Path of the runtime crate root that declares `spec_version`.
    #[must_use]
    pub fn runtime_source_path(self) -> String {
        format!("runtime/{}/src/lib.rs", self.as_str())
    }

    /// Substring every release branch of this chain carries.
    #[must_use]
    pub fn release_branch_marker(self) -> String {
        format!("release-{}-", self.as_str())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.as_str() == value)
            .ok_or_else(|| UnknownVariant::new("chain", value, &["mandala", "karura", "acala"]))
    }
}

/// Which parts of the project a release ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseScope {
    /// Node client only.
    Client,
    /// Runtime only.
    Runtime,
    /// Client and runtime together.
    Full,
}

impl ReleaseScope {
    /// Every scope, in declaration order.
    pub const ALL: [Self; 3] = [Self::Client, Self::Runtime, Self::Full];

    /// Lower-case identifier accepted as input.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Runtime => "runtime",
            Self::Full => "full",
        }
    }

    /// Title shown in release notes.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Client => "Client Only",
            Self::Runtime => "Runtime Only",
            Self::Full => "Full Release",
        }
    }

    /// Whether the client checklist applies.
    #[must_use]
    pub const fn includes_client(self) -> bool {
        matches!(self, Self::Client | Self::Full)
    }

    /// Whether the runtime checklist applies.
    #[must_use]
    pub const fn includes_runtime(self) -> bool {
        matches!(self, Self::Runtime | Self::Full)
    }
}

impl fmt::Display for ReleaseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseScope {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str() == value)
            .ok_or_else(|| UnknownVariant::new("scope", value, &["client", "runtime", "full"]))
    }
}

/// Upstream frameworks whose pinned revisions are tracked per release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    /// Core framework, located through `frame-system`.
    Substrate,
    /// Relay-chain client, located through `polkadot-cli`.
    Polkadot,
    /// Parachain client, located through `cumulus-client-cli`.
    Cumulus,
}

impl Upstream {
    /// Every tracked upstream, in report order.
    pub const ALL: [Self; 3] = [Self::Substrate, Self::Polkadot, Self::Cumulus];

    /// Record key prefix for this upstream.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Substrate => "substrate",
            Self::Polkadot => "polkadot",
            Self::Cumulus => "cumulus",
        }
    }

    /// Package queried in the dependency graph to locate the upstream.
    #[must_use]
    pub const fn probe_package(self) -> &'static str {
        match self {
            Self::Substrate => "frame-system",
            Self::Polkadot => "polkadot-cli",
            Self::Cumulus => "cumulus-client-cli",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
