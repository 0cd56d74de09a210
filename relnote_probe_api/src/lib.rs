use std::path::Path;

/// Tool that reports where a package's direct dependency edge resolves to.
///
/// Implementations run against a checked-out source tree; the caller owns
/// the checkout and guarantees the tree does not change during a query.
pub trait DependencyProbe: Send + Sync {
    /// Stable identifier used for logging.
    fn id(&self) -> &'static str;

    /// Query the dependency graph of the tree at `workdir` for `package`.
    ///
    /// Returns the raw tool output, one line of the shape
    /// `<name> <version> (<source-url>#<hash>)`.
    ///
    /// # Errors
    ///
    /// Implementors should surface spawn failures, timeouts and non-zero
    /// exits of the underlying tool.
    fn query(&self, workdir: &Path, package: &str) -> ProbeResult<String>;
}

/// Errors surfaced by dependency probes.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The tool could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The tool ran longer than allowed and was killed.
    #[error("{program} timed out after {seconds}s")]
    TimedOut {
        /// Program that was killed.
        program: String,
        /// Configured limit.
        seconds: u64,
    },
    /// The tool exited unsuccessfully.
    #[error("{program} failed with status {status}: {stderr}")]
    Failed {
        /// Program that failed.
        program: String,
        /// Exit code, or "terminated" when killed by a signal.
        status: String,
        /// Trimmed standard error.
        stderr: String,
    },
    /// Generic failure surfaced by the probe.
    #[error("{message}")]
    Failure {
        /// Human-readable error message.
        message: String,
    },
}

impl ProbeError {
    /// Helper to construct a failure from any displayable message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

/// Convenience result alias for probe operations.
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;
