use relnote_api::{
    Chain, DependencyFact, ReleaseArtifacts, ReleaseRecord, ReleaseScope, ReleaseSnapshot, Upstream,
};

use crate::{Error, Result};

/// Two complete snapshots of the same chain plus the release scope.
///
/// Only [`assemble`] constructs a diff, so both sides are always complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDiff {
    previous: ReleaseSnapshot,
    current: ReleaseSnapshot,
    scope: ReleaseScope,
    chain: Chain,
}

/// Merge two snapshots into a diff.
///
/// # Errors
///
/// Returns [`Error::Inconsistent`] when a snapshot's runtime belongs to a
/// different chain, any fact is empty, or an upstream version is not semver.
pub fn assemble(
    previous: ReleaseSnapshot,
    current: ReleaseSnapshot,
    scope: ReleaseScope,
    chain: Chain,
) -> Result<ReleaseDiff> {
    for (side, snapshot) in [("previous", &previous), ("current", &current)] {
        validate(side, snapshot, chain)?;
    }

    Ok(ReleaseDiff {
        previous,
        current,
        scope,
        chain,
    })
}

fn validate(side: &str, snapshot: &ReleaseSnapshot, chain: Chain) -> Result<()> {
    let inconsistent = |message: String| Error::Inconsistent {
        message: format!("{side} release {}: {message}", snapshot.release.tag),
    };

    if snapshot.runtime.chain != chain {
        return Err(inconsistent(format!(
            "runtime belongs to {}, expected {chain}",
            snapshot.runtime.chain
        )));
    }

    let mut fields = vec![
        ("tag", snapshot.release.tag.as_str()),
        ("branch", snapshot.release.revision.label.as_str()),
        ("orml", snapshot.orml.commit_hash.as_str()),
        ("runtime", snapshot.runtime.spec_version.as_str()),
    ];
    for upstream in Upstream::ALL {
        let fact = snapshot.upstreams.get(upstream);
        fields.push((upstream.key(), fact.commit_hash.as_str()));
    }

    if let Some((name, _)) = fields.into_iter().find(|(_, value)| value.is_empty()) {
        return Err(inconsistent(format!("{name} is empty")));
    }

    for upstream in Upstream::ALL {
        let fact = snapshot.upstreams.get(upstream);
        if fact.semver().is_none() {
            return Err(inconsistent(format!(
                "{upstream} version '{}' of {} is not semver",
                fact.version, fact.name
            )));
        }
    }
    Ok(())
}

impl ReleaseDiff {
    /// Older snapshot.
    #[must_use]
    pub const fn previous(&self) -> &ReleaseSnapshot {
        &self.previous
    }

    /// Newer snapshot.
    #[must_use]
    pub const fn current(&self) -> &ReleaseSnapshot {
        &self.current
    }

    /// Release scope.
    #[must_use]
    pub const fn scope(&self) -> ReleaseScope {
        self.scope
    }

    /// Chain both snapshots belong to.
    #[must_use]
    pub const fn chain(&self) -> Chain {
        self.chain
    }

    /// Flatten into the record handed to the report template.
    #[must_use]
    pub fn to_record(&self, artifacts: &ReleaseArtifacts) -> ReleaseRecord {
        let (cur, prev) = (&self.current, &self.previous);
        let dep = |snapshot: &ReleaseSnapshot, upstream| -> DependencyFact {
            snapshot.upstreams.get(upstream).clone()
        };
        let [substrate, polkadot, cumulus] = Upstream::ALL.map(|u| (dep(cur, u), dep(prev, u)));

        ReleaseRecord {
            scope: self.scope.display_name().to_owned(),
            network: self.chain.display_name().to_owned(),
            version: cur.release.tag.clone(),
            previous_version: prev.release.tag.clone(),
            branch_name: cur.release.revision.label.clone(),
            previous_branch_name: prev.release.revision.label.clone(),
            runtime: cur.runtime.spec_version.clone(),
            previous_runtime: prev.runtime.spec_version.clone(),
            substrate_version: substrate.0.commit_hash,
            previous_substrate_version: substrate.1.commit_hash,
            substrate_semver: substrate.0.version,
            previous_substrate_semver: substrate.1.version,
            polkadot_version: polkadot.0.commit_hash,
            previous_polkadot_version: polkadot.1.commit_hash,
            polkadot_semver: polkadot.0.version,
            previous_polkadot_semver: polkadot.1.version,
            cumulus_version: cumulus.0.commit_hash,
            previous_cumulus_version: cumulus.1.commit_hash,
            cumulus_semver: cumulus.0.version,
            previous_cumulus_semver: cumulus.1.version,
            orml_version: cur.orml.commit_hash.clone(),
            previous_orml_version: prev.orml.commit_hash.clone(),
            srtool_details: artifacts.srtool_details.clone(),
            subwasm_info: artifacts.subwasm_info.clone(),
            client_checklist: self.scope.includes_client(),
            runtime_checklist: self.scope.includes_runtime(),
            is_mandala: self.chain == Chain::Mandala,
            is_karura: self.chain == Chain::Karura,
            is_acala: self.chain == Chain::Acala,
        }
    }
}
