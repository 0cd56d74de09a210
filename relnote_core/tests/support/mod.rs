#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{
    IndexAddOption, IndexEntry, IndexTime, Oid, Repository as GitRepository, Signature, Time,
};
use relnote_core::{Error, Result};
use relnote_probe_api::{DependencyProbe, ProbeError, ProbeResult};
use tempfile::TempDir;

/// Output lines a fixture release reports for the three tracked upstreams.
pub struct ReleaseFiles<'a> {
    pub substrate: &'a str,
    pub polkadot: &'a str,
    pub cumulus: &'a str,
    pub runtime_source: &'a str,
}

/// Superproject with a real `orml` sub-repository next to it.
///
/// Dependency outputs are committed under `deps/<package>` so a probe reading
/// that directory sees the revision that is checked out.
pub struct Fixture {
    _root: TempDir,
    pub path: PathBuf,
    pub git: GitRepository,
    orml: GitRepository,
    orml_path: PathBuf,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let root = TempDir::new().expect("tempdir");
        let path = root.path().join("project");
        let orml_path = root.path().join("orml-upstream");

        let git = GitRepository::init(&path)?;
        let orml = GitRepository::init(&orml_path)?;
        write_file(path.join("README.md"), "project\n");
        write_file(
            path.join(".gitmodules"),
            &format!(
                "[submodule \"orml\"]\n\tpath = orml\n\turl = {}\n",
                orml_path.display()
            ),
        );
        fs::create_dir_all(path.join("orml")).expect("create sub-repository dir");

        Ok(Self {
            _root: root,
            path,
            git,
            orml,
            orml_path,
        })
    }

    /// Commit a new state of the sub-repository and return its id.
    pub fn orml_commit(&self, message: &str, seconds: i64) -> Result<Oid> {
        write_file(self.orml_path.join("VERSION"), message);
        commit_index(&self.orml, message, seconds, None)
    }

    /// Commit one release state on the current branch.
    pub fn commit_release(
        &self,
        files: &ReleaseFiles<'_>,
        chain: &str,
        orml: Oid,
        seconds: i64,
    ) -> Result<Oid> {
        let deps = self.path.join("deps");
        write_file(deps.join("frame-system"), files.substrate);
        write_file(deps.join("polkadot-cli"), files.polkadot);
        write_file(deps.join("cumulus-client-cli"), files.cumulus);
        write_file(
            self.path.join(format!("runtime/{chain}/src/lib.rs")),
            files.runtime_source,
        );
        commit_index(&self.git, &format!("release at {seconds}"), seconds, Some(orml))
    }

    /// Commit an arbitrary file change on the current branch.
    pub fn commit_file(&self, relative: &str, contents: &str, seconds: i64, orml: Oid) -> Result<Oid> {
        write_file(self.path.join(relative), contents);
        commit_index(&self.git, &format!("update {relative}"), seconds, Some(orml))
    }

    pub fn branch(&self, name: &str, target: Oid) -> Result<()> {
        let commit = self.git.find_commit(target)?;
        self.git.branch(name, &commit, false)?;
        Ok(())
    }

    /// Reference under `refs/remotes/origin/`, as a fetch would create.
    pub fn remote_branch(&self, name: &str, target: Oid) -> Result<()> {
        self.git.reference(
            &format!("refs/remotes/origin/{name}"),
            target,
            true,
            "fixture remote branch",
        )?;
        Ok(())
    }

    pub fn tag(&self, name: &str, target: Oid) -> Result<()> {
        let object = self.git.find_object(target, None)?;
        self.git.tag_lightweight(name, &object, false)?;
        Ok(())
    }

    pub fn head_branch(&self) -> Result<String> {
        let head = self.git.head()?;
        Ok(head.name().unwrap_or_default().to_owned())
    }

    pub fn head_commit(&self) -> Result<Oid> {
        Ok(self.git.head()?.peel_to_commit()?.id())
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path.join(relative)).expect("read working tree file")
    }
}

pub fn dependency_line(name: &str, version: &str, repo: &str, hash: &str) -> String {
    format!("{name} v{version} (https://github.com/paritytech/{repo}?branch=release#{hash})\n")
}

pub fn runtime_source(spec_version: u32) -> String {
    format!(
        "pub const VERSION: RuntimeVersion = RuntimeVersion {{\n\
         \tspec_name: create_runtime_str!(\"karura\"),\n\
         \tspec_version: {spec_version},\n\
         \timpl_version: 0,\n\
         }};\n"
    )
}

pub fn write_file(path: PathBuf, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create directories");
    }
    fs::write(path, contents).expect("write file");
}

fn commit_index(repo: &GitRepository, message: &str, seconds: i64, gitlink: Option<Oid>) -> Result<Oid> {
    let mut index = repo.index()?;
    index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
    if let Some(oid) = gitlink {
        index.add(&gitlink_entry("orml", oid))?;
    }
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let signature = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))?;

    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit()?],
        Err(err) if matches!(err.code(), git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound) => {
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

fn gitlink_entry(path: &str, oid: Oid) -> IndexEntry {
    IndexEntry {
        ctime: IndexTime::new(0, 0),
        mtime: IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode: 0o160_000,
        uid: 0,
        gid: 0,
        file_size: 0,
        id: oid,
        flags: 0,
        flags_extended: 0,
        path: path.as_bytes().to_vec(),
    }
}

/// Probe answering from the `deps/<package>` file of the checked-out tree.
pub struct TreeFileProbe;

impl DependencyProbe for TreeFileProbe {
    fn id(&self) -> &'static str {
        "tree-file"
    }

    fn query(&self, workdir: &Path, package: &str) -> ProbeResult<String> {
        fs::read_to_string(workdir.join("deps").join(package))
            .map(|output| output.trim().to_owned())
            .map_err(|err| ProbeError::message(format!("no output for {package}: {err}")))
    }
}

/// Probe that always fails.
pub struct FailingProbe;

impl DependencyProbe for FailingProbe {
    fn id(&self) -> &'static str {
        "failing"
    }

    fn query(&self, _workdir: &Path, package: &str) -> ProbeResult<String> {
        Err(ProbeError::Failed {
            program: "cargo".into(),
            status: "101".into(),
            stderr: format!("package `{package}` did not match"),
        })
    }
}
