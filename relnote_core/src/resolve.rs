use relnote_api::{Chain, RevisionRef};
use tracing::debug;

use crate::inspector::SourceInspector;
use crate::Result;

pub use relnote_api::ResolvedRelease;

/// How the two release points are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseTarget {
    /// Caller named both sides.
    Explicit {
        /// Older release.
        previous: RevisionRef,
        /// Newer release.
        current: RevisionRef,
    },
    /// Use the two most recent release branches of the chain.
    Latest {
        /// Chain whose release branches are searched.
        chain: Chain,
    },
}

impl ReleaseTarget {
    /// Pick explicit identifiers when both are present, auto-discovery
    /// otherwise.
    #[must_use]
    pub fn from_inputs(previous: Option<RevisionRef>, current: Option<RevisionRef>, chain: Chain) -> Self {
        match (previous, current) {
            (Some(previous), Some(current)) => Self::Explicit { previous, current },
            _ => Self::Latest { chain },
        }
    }
}

/// The two release points of a comparison, each with its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePair {
    /// Older release.
    pub previous: ResolvedRelease,
    /// Newer release.
    pub current: ResolvedRelease,
}

/// Determine both release points and the tag each resolves to.
///
/// # Errors
///
/// Returns [`crate::Error::NotFound`] when branches or tags are missing.
pub fn resolve_pair(inspector: &SourceInspector, target: &ReleaseTarget) -> Result<ReleasePair> {
    let (previous, current) = match target {
        ReleaseTarget::Explicit { previous, current } => (previous.clone(), current.clone()),
        ReleaseTarget::Latest { chain } => inspector.resolve_latest_release_pair(*chain)?,
    };

    let current = resolve_release(inspector, current)?;
    let previous = resolve_release(inspector, previous)?;
    debug!(current = %current.tag, previous = %previous.tag, "resolved release tags");

    Ok(ReleasePair { previous, current })
}

fn resolve_release(inspector: &SourceInspector, revision: RevisionRef) -> Result<ResolvedRelease> {
    let tag = inspector.tag_of(&revision)?;
    Ok(ResolvedRelease { revision, tag })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_inputs_take_precedence() {
        let target = ReleaseTarget::from_inputs(
            Some(RevisionRef::new("2.0.0")),
            Some(RevisionRef::new("2.1.0")),
            Chain::Karura,
        );
        assert_eq!(
            target,
            ReleaseTarget::Explicit {
                previous: RevisionRef::new("2.0.0"),
                current: RevisionRef::new("2.1.0"),
            }
        );
    }

    #[test]
    fn missing_side_falls_back_to_discovery() {
        let target = ReleaseTarget::from_inputs(None, Some(RevisionRef::new("2.1.0")), Chain::Acala);
        assert_eq!(target, ReleaseTarget::Latest { chain: Chain::Acala });
        let target = ReleaseTarget::from_inputs(None, None, Chain::Mandala);
        assert_eq!(target, ReleaseTarget::Latest { chain: Chain::Mandala });
    }
}
