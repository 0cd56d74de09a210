use serde::{Deserialize, Serialize};

use crate::chain::{Chain, Upstream};

/// Identifier for an immutable point in the project's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionRef {
    /// Revspec the repository resolves (tag, branch or full reference name).
    pub raw: String,
    /// Short human-facing name (e.g. `release-karura-2.1.0`).
    pub label: String,
}

impl RevisionRef {
    /// Reference whose label is the revspec itself.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            label: short_name(&raw).to_owned(),
            raw,
        }
    }

    /// Reference with a distinct display label.
    #[must_use]
    pub fn labelled(raw: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            label: label.into(),
        }
    }
}

fn short_name(raw: &str) -> &str {
    for prefix in ["refs/heads/", "refs/tags/"] {
        if let Some(rest) = raw.strip_prefix(prefix) {
            return rest;
        }
    }
    raw.strip_prefix("refs/remotes/")
        .and_then(|rest| rest.split_once('/').map(|(_, name)| name))
        .unwrap_or(raw)
}

/// A release point together with the tag it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRelease {
    /// Identifier the release was selected by.
    pub revision: RevisionRef,
    /// Nearest tag reachable from the revision.
    pub tag: String,
}

impl ResolvedRelease {
    /// The tag as a revision reference; facts are read at this point.
    #[must_use]
    pub fn tag_ref(&self) -> RevisionRef {
        RevisionRef::new(self.tag.clone())
    }
}

/// State of one upstream dependency edge at a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFact {
    /// Package name as reported by the dependency graph.
    pub name: String,
    /// Version string as reported, without the leading `v`.
    pub version: String,
    /// Commit the dependency source is pinned to.
    pub commit_hash: String,
}

impl DependencyFact {
    /// Typed view of [`DependencyFact::version`] when it is valid semver.
    #[must_use]
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.version).ok()
    }
}

/// Recorded commit of the embedded `orml` sub-repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubrepoFact {
    /// First eight hex characters of the pinned commit.
    pub commit_hash: String,
}

/// Declared runtime `spec_version` of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeFact {
    /// Chain whose runtime declared the version.
    pub chain: Chain,
    /// Decimal spec version.
    pub spec_version: String,
}

/// One fact per tracked upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamFacts {
    /// Core framework.
    pub substrate: DependencyFact,
    /// Relay-chain client.
    pub polkadot: DependencyFact,
    /// Parachain client.
    pub cumulus: DependencyFact,
}

impl UpstreamFacts {
    /// Fact for the given upstream.
    #[must_use]
    pub const fn get(&self, upstream: Upstream) -> &DependencyFact {
        match upstream {
            Upstream::Substrate => &self.substrate,
            Upstream::Polkadot => &self.polkadot,
            Upstream::Cumulus => &self.cumulus,
        }
    }
}

/// Every fact resolved at a single release point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSnapshot {
    /// Release point all facts were taken at.
    pub release: ResolvedRelease,
    /// Upstream dependency pins.
    pub upstreams: UpstreamFacts,
    /// `orml` sub-repository pin.
    pub orml: SubrepoFact,
    /// Runtime version.
    pub runtime: RuntimeFact,
}
