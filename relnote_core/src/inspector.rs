//! Read-only queries against the source tree, plus dependency-graph queries
//! that need a revision checked out.
//!
//! Checking out mutates the shared working tree. Every such operation takes
//! `&mut self` and restores the previous HEAD on every exit path, so no other
//! query can run while the tree sits at a foreign revision.

use std::path::Path;

use relnote_api::{Chain, RevisionRef};
use relnote_probe_api::DependencyProbe;
use tracing::{debug, warn};

use crate::repository::{display_path, HeadState, Repository};
use crate::{Error, Result};

/// Source tree plus the dependency-graph tool run inside it.
pub struct SourceInspector {
    repository: Repository,
    probe: Box<dyn DependencyProbe>,
}

impl SourceInspector {
    /// Pair an opened repository with a dependency probe.
    #[must_use]
    pub fn new(repository: Repository, probe: Box<dyn DependencyProbe>) -> Self {
        Self { repository, probe }
    }

    /// Open the repository at `path` and pair it with `probe`.
    ///
    /// # Errors
    ///
    /// Propagates [`Repository::open`] failures.
    pub fn open(path: impl AsRef<Path>, probe: Box<dyn DependencyProbe>) -> Result<Self> {
        Ok(Self::new(Repository::open(path)?, probe))
    }

    /// Underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &Repository {
        &self.repository
    }

    /// The two most recent release branches of `chain` as
    /// `(previous, current)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when fewer than two release branches exist.
    pub fn resolve_latest_release_pair(&self, chain: Chain) -> Result<(RevisionRef, RevisionRef)> {
        let mut branches = self.repository.release_branches(chain)?;
        let found = branches.len();
        match (branches.pop(), branches.pop()) {
            (Some(current), Some(previous)) => {
                debug!(previous = %previous.label, current = %current.label, "release branches");
                Ok((previous, current))
            }
            _ => Err(Error::not_found(format!(
                "two release branches matching '{}' (found {found})",
                chain.release_branch_marker()
            ))),
        }
    }

    /// Nearest tag reachable from `revision`.
    ///
    /// # Errors
    ///
    /// See [`Repository::tag_of`].
    pub fn tag_of(&self, revision: &RevisionRef) -> Result<String> {
        self.repository.tag_of(revision)
    }

    /// Content of `path` at `revision`.
    ///
    /// # Errors
    ///
    /// See [`Repository::read_file_at`].
    pub fn read_file_at(&self, revision: &RevisionRef, path: &str) -> Result<String> {
        self.repository.read_file_at(revision, path)
    }

    /// Tree-entry record of the sub-repository at `path`.
    ///
    /// # Errors
    ///
    /// See [`Repository::submodule_record_at`].
    pub fn submodule_record_at(&self, revision: &RevisionRef, path: &str) -> Result<String> {
        self.repository.submodule_record_at(revision, path)
    }

    /// Dependency-graph output for `package` with `revision` checked out.
    ///
    /// # Errors
    ///
    /// Returns checkout, probe or restore failures; the tree is restored in
    /// every case.
    pub fn dependency_graph_at(&mut self, revision: &RevisionRef, package: &str) -> Result<String> {
        let mut outputs = self.dependency_graphs_at(revision, &[package])?;
        outputs
            .pop()
            .ok_or_else(|| Error::not_found(format!("dependency output for {package}")))
    }

    /// Dependency-graph output for each of `packages`, in order, under a
    /// single checkout of `revision`.
    ///
    /// Takes `&mut self` so nothing else can read the working tree while
    /// `revision` is checked out.
    ///
    /// # Errors
    ///
    /// Returns the first checkout, probe or restore failure; the tree is
    /// restored in every case.
    #[allow(clippy::needless_pass_by_ref_mut)]
    pub fn dependency_graphs_at(
        &mut self,
        revision: &RevisionRef,
        packages: &[&str],
    ) -> Result<Vec<String>> {
        let probe = self.probe.as_ref();
        let probe_id = probe.id();
        with_checkout(&self.repository, revision, |workdir| {
            packages
                .iter()
                .map(|package| {
                    debug!(probe = probe_id, package, revision = %revision.raw, "querying dependency graph");
                    probe
                        .query(workdir, package)
                        .map_err(|source| Error::Probe {
                            package: (*package).to_owned(),
                            source,
                        })
                })
                .collect()
        })
    }
}

/// Run `query` with `revision` checked out, then restore the prior HEAD.
///
/// When both the query and the restore fail, the query error wins and the
/// restore failure is logged.
fn with_checkout<T>(
    repository: &Repository,
    revision: &RevisionRef,
    query: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    if repository.is_dirty()? {
        return Err(Error::DirtyWorkspace {
            path: display_path(repository.root()),
        });
    }
    let original: HeadState = repository.head_state()?;
    let oid = repository.resolve_commit(revision)?.id();

    let outcome = repository
        .checkout_detached(oid)
        .and_then(|()| query(repository.root()));
    let restored = repository.restore(&original);

    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) | (Err(err), Ok(())) => Err(err),
        (Err(err), Err(restore_err)) => {
            warn!(error = %restore_err, "failed to restore checkout after query failure");
            Err(err)
        }
    }
}

impl std::fmt::Debug for SourceInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceInspector")
            .field("repository", &self.repository)
            .field("probe", &self.probe.id())
            .finish()
    }
}
