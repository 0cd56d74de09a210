use std::env;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use relnote_probe_api::{DependencyProbe, ProbeError, ProbeResult};
use tracing::debug;
use wait_timeout::ChildExt;

const DEFAULT_TIMEOUT_SECS: u64 = 600;
const BINARY_ENV: &str = "RELNOTE_CARGO_BIN";

/// Probe backed by `cargo tree -p <package> --depth=0 -e=normal -i`.
#[derive(Debug, Clone)]
pub struct CargoTreeProbe {
    binary: OsString,
    timeout: Duration,
}

impl CargoTreeProbe {
    /// Probe running `cargo` from `PATH`, or the binary named by
    /// `RELNOTE_CARGO_BIN` when set.
    #[must_use]
    pub fn new() -> Self {
        let binary = env::var_os(BINARY_ENV).unwrap_or_else(|| OsString::from("cargo"));
        Self::with_binary(binary)
    }

    /// Probe running an explicit cargo binary.
    #[must_use]
    pub fn with_binary(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Replace the per-query timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configured per-query timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn program(&self) -> String {
        self.binary.to_string_lossy().into_owned()
    }

    fn run(&self, workdir: &Path, args: &[&str]) -> ProbeResult<ProcessOutput> {
        debug!(program = %self.program(), ?args, workdir = %workdir.display(), "running probe");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| ProbeError::Spawn {
            program: self.program(),
            source,
        })?;

        let stdout_handle = spawn_reader(child.stdout.take());
        let stderr_handle = spawn_reader(child.stderr.take());

        match child.wait_timeout(self.timeout) {
            Ok(Some(_)) => (),
            Ok(None) => {
                abort(&mut child);
                return Err(ProbeError::TimedOut {
                    program: self.program(),
                    seconds: self.timeout.as_secs(),
                });
            }
            Err(err) => {
                abort(&mut child);
                return Err(ProbeError::message(format!(
                    "failed waiting on {}: {err}",
                    self.program()
                )));
            }
        }

        let status = child.wait().map_err(|err| {
            ProbeError::message(format!("failed to reap {}: {err}", self.program()))
        })?;

        let stdout = join_reader(stdout_handle, "stdout")?;
        let stderr = join_reader(stderr_handle, "stderr")?;

        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "terminated".to_string(), |c| c.to_string());
            return Err(ProbeError::Failed {
                program: self.program(),
                status: code,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ProcessOutput { stdout })
    }
}

impl Default for CargoTreeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyProbe for CargoTreeProbe {
    fn id(&self) -> &'static str {
        "cargo-tree"
    }

    fn query(&self, workdir: &Path, package: &str) -> ProbeResult<String> {
        let args = tree_args(package);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run(workdir, &args)?;
        let stdout = output.stdout.trim();
        if stdout.is_empty() {
            return Err(ProbeError::message(format!(
                "{} reported nothing for package {package}",
                self.program()
            )));
        }
        Ok(stdout.to_string())
    }
}

fn tree_args(package: &str) -> [String; 6] {
    [
        "tree".into(),
        "-p".into(),
        package.into(),
        "--depth=0".into(),
        "-e=normal".into(),
        "-i".into(),
    ]
}

/// Read `stream` to the end on its own thread.
fn spawn_reader<R>(stream: Option<R>) -> Option<thread::JoinHandle<io::Result<Vec<u8>>>>
where
    R: Read + Send + 'static,
{
    stream.map(|mut stream| {
        thread::spawn(move || -> io::Result<Vec<u8>> {
            let mut buffer = Vec::new();
            stream.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn abort(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn join_reader(
    handle: Option<thread::JoinHandle<io::Result<Vec<u8>>>>,
    stream: &str,
) -> ProbeResult<String> {
    match handle {
        Some(handle) => {
            let bytes = handle
                .join()
                .map_err(|_| ProbeError::message(format!("failed to join probe {stream} reader")))?
                .map_err(|err| ProbeError::message(format!("failed to read probe {stream}: {err}")))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
        None => Ok(String::new()),
    }
}

#[derive(Debug)]
struct ProcessOutput {
    stdout: String,
}
