//! Repository access built on top of libgit2.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use git2::{
    build::CheckoutBuilder, DescribeFormatOptions, DescribeOptions, ErrorClass, ErrorCode,
    ObjectType, Oid, Repository as GitRepository, StatusOptions,
};
use relnote_api::{Chain, RevisionRef};
use tracing::debug;

use crate::{extract::ParseError, Error, Result};

/// What HEAD pointed at before a checkout, so it can be put back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD is attached to the named branch reference.
    Branch(String),
    /// HEAD is detached at a commit.
    Detached(Oid),
}

/// Handle to the working tree whose history is inspected.
pub struct Repository {
    inner: GitRepository,
    root: PathBuf,
}

impl Repository {
    /// Open a repository from the given filesystem path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be canonicalized, does not resolve
    /// to a git repository, or resolves to a bare repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let original = path.as_ref();
        let canonical = std::fs::canonicalize(original).map_err(|source| Error::Io {
            path: display_path(original),
            source,
        })?;

        let repo = match GitRepository::discover(&canonical) {
            Ok(repo) => repo,
            Err(err)
                if err.class() == ErrorClass::Repository && err.code() == ErrorCode::NotFound =>
            {
                return Err(Error::NotARepository {
                    path: display_path(&canonical),
                })
            }
            Err(err) => return Err(Error::from(err)),
        };

        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::BareRepository {
                path: display_path(&canonical),
            })?;

        Ok(Self { inner: repo, root })
    }

    /// Returns the absolute path to the repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Release branches of `chain`, oldest tip first.
    ///
    /// Local and remote-tracking branches with the same short name are
    /// collapsed, keeping the newer tip. Ties on commit time order by name.
    ///
    /// # Errors
    ///
    /// Propagates libgit2 failures while enumerating or peeling branches.
    pub fn release_branches(&self, chain: Chain) -> Result<Vec<RevisionRef>> {
        let marker = chain.release_branch_marker();
        let mut newest: BTreeMap<String, (i64, String)> = BTreeMap::new();

        for entry in self.inner.branches(None)? {
            let (branch, _) = entry?;
            let reference = branch.get();
            if reference.symbolic_target().is_some() {
                continue;
            }
            let Some(raw) = reference.name() else {
                continue;
            };
            let revision = RevisionRef::new(raw);
            if !revision.label.contains(&marker) {
                continue;
            }

            let time = reference.peel_to_commit()?.time().seconds();
            match newest.get(&revision.label) {
                Some((seen, _)) if *seen >= time => {}
                _ => {
                    newest.insert(revision.label, (time, revision.raw));
                }
            }
        }

        let mut branches: Vec<(i64, RevisionRef)> = newest
            .into_iter()
            .map(|(label, (time, raw))| (time, RevisionRef::labelled(raw, label)))
            .collect();
        branches.sort_by(|(a_time, a), (b_time, b)| {
            a_time.cmp(b_time).then_with(|| a.label.cmp(&b.label))
        });

        Ok(branches.into_iter().map(|(_, revision)| revision).collect())
    }

    /// The nearest tag reachable from `revision`, like
    /// `git describe --tags --abbrev=0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the revision is unknown or no tag is
    /// reachable from it.
    pub fn tag_of(&self, revision: &RevisionRef) -> Result<String> {
        let commit = self.resolve_commit(revision)?;

        let mut options = DescribeOptions::new();
        options.describe_tags();
        let describe = commit.as_object().describe(&options).map_err(|err| {
            if err.code() == ErrorCode::NotFound || err.class() == ErrorClass::Describe {
                Error::not_found(format!("tag reachable from '{}'", revision.raw))
            } else {
                Error::from(err)
            }
        })?;

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        Ok(describe.format(Some(&format))?)
    }

    /// Content of `path` as committed at `revision`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the revision or path does not exist
    /// or names a directory, and [`Error::Parse`] for non-UTF-8 content.
    pub fn read_file_at(&self, revision: &RevisionRef, path: &str) -> Result<String> {
        let tree = self.resolve_commit(revision)?.tree()?;
        let missing = || Error::not_found(format!("file '{path}' at '{}'", revision.raw));

        let entry = tree.get_path(Path::new(path)).map_err(|err| {
            if err.code() == ErrorCode::NotFound {
                missing()
            } else {
                Error::from(err)
            }
        })?;
        let blob = entry
            .to_object(&self.inner)?
            .into_blob()
            .map_err(|_| missing())?;

        String::from_utf8(blob.content().to_vec()).map_err(|_| {
            Error::from(ParseError::NotUtf8 {
                path: path.to_owned(),
            })
        })
    }

    /// The tree-entry line (`<mode> <type> <oid>\t<path>`) recorded for the
    /// sub-repository at `path`, as `git ls-tree` prints it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the revision is unknown or `path` is
    /// not a sub-repository entry at that revision.
    pub fn submodule_record_at(&self, revision: &RevisionRef, path: &str) -> Result<String> {
        let tree = self.resolve_commit(revision)?.tree()?;
        let missing = || {
            Error::not_found(format!(
                "sub-repository '{path}' at '{}'",
                revision.raw
            ))
        };

        let entry = tree.get_path(Path::new(path)).map_err(|err| {
            if err.code() == ErrorCode::NotFound {
                missing()
            } else {
                Error::from(err)
            }
        })?;
        if entry.kind() != Some(ObjectType::Commit) {
            return Err(missing());
        }

        Ok(format!(
            "{:06o} {} {}\t{path}",
            entry.filemode(),
            ObjectType::Commit.str(),
            entry.id()
        ))
    }

    /// Current HEAD, branch or detached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unborn HEAD.
    pub fn head_state(&self) -> Result<HeadState> {
        let head = match self.inner.head() {
            Ok(head) => head,
            Err(err)
                if matches!(
                    (err.class(), err.code()),
                    (
                        ErrorClass::Reference,
                        ErrorCode::NotFound | ErrorCode::UnbornBranch
                    )
                ) =>
            {
                return Err(Error::not_found("HEAD commit"))
            }
            Err(err) => return Err(Error::from(err)),
        };

        if head.is_branch() {
            if let Some(name) = head.name() {
                return Ok(HeadState::Branch(name.to_owned()));
            }
        }
        let commit = head.peel_to_commit()?;
        Ok(HeadState::Detached(commit.id()))
    }

    /// Whether tracked files carry uncommitted changes.
    ///
    /// # Errors
    ///
    /// Propagates libgit2 status enumeration failures.
    pub fn is_dirty(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = self.inner.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }

    pub(crate) fn resolve_commit(&self, revision: &RevisionRef) -> Result<git2::Commit<'_>> {
        let object = self.inner.revparse_single(&revision.raw).map_err(|err| {
            if matches!(err.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) {
                Error::not_found(format!("revision '{}'", revision.raw))
            } else {
                Error::from(err)
            }
        })?;
        Ok(object.peel_to_commit()?)
    }

    /// Force the working tree to `oid` with a detached HEAD and synchronised
    /// sub-repositories. Callers must hold exclusive access to the tree.
    pub(crate) fn checkout_detached(&self, oid: Oid) -> Result<()> {
        let commit = self.inner.find_commit(oid)?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        self.inner.set_head_detached(oid)?;
        debug!(%oid, "checked out detached");
        update_submodules(&self.inner)
    }

    /// Put HEAD and the working tree back to `state`.
    pub(crate) fn restore(&self, state: &HeadState) -> Result<()> {
        match state {
            HeadState::Branch(name) => self.inner.set_head(name)?,
            HeadState::Detached(oid) => self.inner.set_head_detached(*oid)?,
        }
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner.checkout_head(Some(&mut checkout))?;
        debug!(?state, "restored checkout");
        update_submodules(&self.inner)
    }
}

fn update_submodules(repo: &GitRepository) -> Result<()> {
    for mut submodule in repo.submodules()? {
        submodule.update(true, None)?;
        let nested = submodule.open()?;
        update_submodules(&nested)?;
    }
    Ok(())
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_path_buf()
        .into_os_string()
        .to_string_lossy()
        .into_owned()
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{IndexAddOption, Repository as GitRepository, Signature, Time};
    use tempfile::TempDir;

    #[test]
    fn read_file_at_returns_committed_content() -> Result<()> {
        let temp = TempDir::new().expect("tempdir");
        let git_repo = GitRepository::init(temp.path())?;

        write_file(temp.path().join("runtime/karura/src/lib.rs"), "spec_version: 1,\n");
        let first = stage_and_commit(&git_repo, "first", 100)?;
        write_file(temp.path().join("runtime/karura/src/lib.rs"), "spec_version: 2,\n");
        stage_and_commit(&git_repo, "second", 200)?;

        let repo = Repository::open(temp.path())?;
        let content = repo.read_file_at(&RevisionRef::new(first.to_string()), "runtime/karura/src/lib.rs")?;
        assert_eq!(content, "spec_version: 1,\n");

        let head = repo.read_file_at(&RevisionRef::new("HEAD"), "runtime/karura/src/lib.rs")?;
        assert_eq!(head, "spec_version: 2,\n");

        Ok(())
    }

    #[test]
    fn read_file_at_missing_path_is_not_found() -> Result<()> {
        let temp = TempDir::new().expect("tempdir");
        let git_repo = GitRepository::init(temp.path())?;
        write_file(temp.path().join("README.md"), "hello\n");
        stage_and_commit(&git_repo, "initial", 100)?;

        let repo = Repository::open(temp.path())?;
        let err = repo.read_file_at(&RevisionRef::new("HEAD"), "runtime/acala/src/lib.rs");
        assert!(matches!(err, Err(Error::NotFound { .. })));

        let err = repo.read_file_at(&RevisionRef::new("no-such-tag"), "README.md");
        assert!(matches!(err, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[test]
    fn head_state_tracks_branch() -> Result<()> {
        let temp = TempDir::new().expect("tempdir");
        let git_repo = GitRepository::init(temp.path())?;
        write_file(temp.path().join("README.md"), "hello\n");
        stage_and_commit(&git_repo, "initial", 100)?;

        let repo = Repository::open(temp.path())?;
        assert!(matches!(repo.head_state()?, HeadState::Branch(name) if name.starts_with("refs/heads/")));
        assert!(!repo.is_dirty()?);

        write_file(temp.path().join("README.md"), "changed\n");
        assert!(repo.is_dirty()?);

        Ok(())
    }

    #[test]
    fn open_non_repository_returns_error() {
        let temp = TempDir::new().expect("tempdir");
        let err = Repository::open(temp.path());
        assert!(matches!(err, Err(Error::NotARepository { .. })));
    }

    fn write_file(path: PathBuf, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create directories");
        }
        std::fs::write(path, contents).expect("write file");
    }

    fn stage_and_commit(repo: &GitRepository, message: &str, seconds: i64) -> Result<Oid> {
        let mut index = repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;
        let signature = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))?;

        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit()?],
            Err(err) if err.code() == ErrorCode::UnbornBranch || err.code() == ErrorCode::NotFound => {
                Vec::new()
            }
            Err(err) => return Err(Error::from(err)),
        };

        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        Ok(repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parent_refs,
        )?)
    }
}
