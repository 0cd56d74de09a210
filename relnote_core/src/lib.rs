//! Core library for generating release notes from two release points.
//!
//! The crate is layered around four responsibilities:
//! - inspecting the source tree at arbitrary revisions
//! - extracting typed version facts from raw tool output
//! - pairing and diffing two release snapshots
//! - rendering the resulting record through a report template

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

/// Merging two snapshots into a release diff and record.
pub mod assemble;
/// Invocation inputs and their validation.
pub mod config;
/// Parsers turning raw tool output into version facts.
pub mod extract;
/// Scoped checkout and dependency-graph queries.
pub mod inspector;
/// End-to-end record construction and rendering.
pub mod pipeline;
/// Report template rendering.
pub mod render;
/// Git repository access built on libgit2.
pub mod repository;
/// Selection of the two release points to compare.
pub mod resolve;
/// Fact capture for a single release point.
pub mod snapshot;

pub use relnote_api::*;

pub use extract::ParseError;

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A revision, tag, file or sub-repository record does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing object.
        what: String,
    },
    /// Raw tool output did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    /// An input is outside its accepted set or missing.
    #[error("configuration error: {message}")]
    Configuration {
        /// Explanation of the rejected input.
        message: String,
    },
    /// Facts that must agree with each other do not.
    #[error("inconsistent release data: {message}")]
    Inconsistent {
        /// Explanation of the mismatch.
        message: String,
    },
    /// Underlying git operation failed.
    #[error("git error: {source}")]
    Git {
        /// Original libgit2 error.
        #[from]
        source: git2::Error,
    },
    /// Provided path does not correspond to a git repository.
    #[error("path does not reference a git repository: {path}")]
    NotARepository {
        /// Path that failed to resolve to a repository.
        path: String,
    },
    /// Bare repositories have no working tree to check out into.
    #[error("repository at {path} is bare and unsupported")]
    BareRepository {
        /// Path of the repository lacking a working tree.
        path: String,
    },
    /// Tracked files carry uncommitted changes that a checkout would discard.
    #[error("working tree at {path} has uncommitted changes")]
    DirtyWorkspace {
        /// Repository root.
        path: String,
    },
    /// The dependency-graph tool failed.
    #[error("dependency query for {package} failed: {source}")]
    Probe {
        /// Package that was queried.
        package: String,
        /// Probe failure.
        #[source]
        source: relnote_probe_api::ProbeError,
    },
    /// The report template is malformed or references unknown fields.
    #[error("template error: {message}")]
    Template {
        /// Explanation of the template failure.
        message: String,
    },
    /// Filesystem interaction failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Filesystem path involved in the failed operation.
        path: String,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
