use relnote_api::{Chain, ReleaseSnapshot, ResolvedRelease, Upstream, UpstreamFacts};
use tracing::debug;

use crate::extract::{parse_dependency_line, parse_runtime_spec, parse_submodule_record};
use crate::inspector::SourceInspector;
use crate::Result;

/// Path of the embedded `orml` sub-repository.
pub const ORML_PATH: &str = "orml";

/// Capture every fact of `release` for `chain`, reading at its tag.
///
/// Dependency graphs are queried first under one checkout, then the `orml`
/// record and the runtime source are read from history.
///
/// # Errors
///
/// Returns the first lookup or parse failure.
pub fn capture(
    inspector: &mut SourceInspector,
    release: &ResolvedRelease,
    chain: Chain,
) -> Result<ReleaseSnapshot> {
    let at = release.tag_ref();
    let tag = &release.tag;

    let packages = Upstream::ALL.map(Upstream::probe_package);
    let outputs = inspector.dependency_graphs_at(&at, &packages)?;
    let [substrate, polkadot, cumulus] = outputs.as_slice() else {
        return Err(crate::Error::Inconsistent {
            message: format!("expected {} dependency outputs, got {}", packages.len(), outputs.len()),
        });
    };
    let upstreams = UpstreamFacts {
        substrate: parse_dependency_line(substrate)?,
        polkadot: parse_dependency_line(polkadot)?,
        cumulus: parse_dependency_line(cumulus)?,
    };
    for upstream in Upstream::ALL {
        let fact = upstreams.get(upstream);
        debug!("{tag}: {upstream}={} ({})", fact.commit_hash, fact.version);
    }

    let orml = parse_submodule_record(&inspector.submodule_record_at(&at, ORML_PATH)?)?;
    debug!("{tag}: {ORML_PATH}={}", orml.commit_hash);

    let source = inspector.read_file_at(&at, &chain.runtime_source_path())?;
    let runtime = parse_runtime_spec(&source, chain)?;
    debug!("{tag}: runtime={}", runtime.spec_version);

    Ok(ReleaseSnapshot {
        release: release.clone(),
        upstreams,
        orml,
        runtime,
    })
}
