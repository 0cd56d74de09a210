//! One release-note generation: resolve the pair, capture both sides, diff,
//! render.

use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use relnote_api::{ReleaseArtifacts, ReleaseRecord};
use relnote_probe_api::DependencyProbe;
use tracing::info;

use crate::assemble::assemble;
use crate::config::{ArtifactPaths, ReleaseRequest};
use crate::inspector::SourceInspector;
use crate::render::{Template, DEFAULT_TEMPLATE};
use crate::resolve::resolve_pair;
use crate::snapshot::capture;
use crate::{Error, Result};

/// Rendered report and the record behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Record the template was rendered against.
    pub record: ReleaseRecord,
    /// Rendered report text.
    pub text: String,
    /// Path the report was written to.
    pub output: Utf8PathBuf,
}

fn io_error(path: &Utf8Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_string(),
        source,
    }
}

fn read_text(path: &Utf8Path) -> Result<String> {
    fs::read_to_string(path).map_err(io_error(path))
}

/// Read whichever pass-through texts are configured.
///
/// # Errors
///
/// Returns [`Error::Io`] when a configured file cannot be read.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<ReleaseArtifacts> {
    Ok(ReleaseArtifacts {
        srtool_details: paths.srtool_details.as_deref().map(read_text).transpose()?,
        subwasm_info: paths.subwasm_info.as_deref().map(read_text).transpose()?,
    })
}

/// Template source at `path`, or the bundled template.
///
/// # Errors
///
/// Returns [`Error::Io`] when the template file cannot be read.
pub fn load_template(path: Option<&Utf8Path>) -> Result<Cow<'static, str>> {
    match path {
        Some(path) => read_text(path).map(Cow::Owned),
        None => Ok(Cow::Borrowed(DEFAULT_TEMPLATE)),
    }
}

/// Resolve both release points, capture their facts and flatten the diff.
///
/// The current side is captured before the previous one.
///
/// # Errors
///
/// Returns the first resolution, capture or assembly failure.
pub fn build_record(
    inspector: &mut SourceInspector,
    request: &ReleaseRequest,
    artifacts: &ReleaseArtifacts,
) -> Result<ReleaseRecord> {
    let pair = resolve_pair(inspector, &request.target)?;
    info!(
        chain = %request.chain,
        previous = %pair.previous.tag,
        current = %pair.current.tag,
        "comparing releases"
    );

    let current = capture(inspector, &pair.current, request.chain)?;
    info!(tag = %pair.current.tag, "captured current release");
    let previous = capture(inspector, &pair.previous, request.chain)?;
    info!(tag = %pair.previous.tag, "captured previous release");

    let diff = assemble(previous, current, request.scope, request.chain)?;
    info!(
        scope = %diff.scope(),
        chain = %diff.chain(),
        previous_runtime = %diff.previous().runtime.spec_version,
        current_runtime = %diff.current().runtime.spec_version,
        "assembled release diff"
    );
    Ok(diff.to_record(artifacts))
}

/// Render the report for `request` without touching the filesystem output.
///
/// Template and artifact files are read before any repository work so a bad
/// path fails before a checkout happens.
///
/// # Errors
///
/// Returns the first I/O, template, repository or probe failure.
pub fn generate(inspector: &mut SourceInspector, request: &ReleaseRequest) -> Result<Report> {
    let source = load_template(request.template.as_deref())?;
    let template = Template::parse(&source)?;
    let artifacts = load_artifacts(&request.artifacts)?;

    let record = build_record(inspector, request, &artifacts)?;
    let text = template.render_record(&record)?;

    Ok(Report {
        record,
        text,
        output: request.output.clone(),
    })
}

/// Open the working tree, generate the report and write it out.
///
/// # Errors
///
/// Returns any failure of [`generate`] or of writing the output; nothing is
/// written when generation fails.
pub fn run(request: &ReleaseRequest, probe: Box<dyn DependencyProbe>) -> Result<Report> {
    let mut inspector = SourceInspector::open(&request.repo, probe)?;
    let report = generate(&mut inspector, request)?;
    write_report(&report.output, &report.text)?;
    info!(output = %report.output, "release note written");
    Ok(report)
}

/// Write `text` to `path`, creating missing parent directories.
///
/// # Errors
///
/// Returns [`Error::Io`] on filesystem failures.
pub fn write_report(path: &Utf8Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::write(path, text).map_err(io_error(path))
}

/// Append the `release-note=<path>` output line to a CI step output file.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be opened or appended to.
pub fn publish_output_path(step_output: &Utf8Path, report: &Utf8Path) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(step_output)
        .map_err(io_error(step_output))?;
    writeln!(file, "release-note={report}").map_err(io_error(step_output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir")
    }

    #[test]
    fn artifacts_are_optional() -> Result<()> {
        assert_eq!(load_artifacts(&ArtifactPaths::default())?, ReleaseArtifacts::default());
        Ok(())
    }

    #[test]
    fn artifacts_are_read_verbatim() -> Result<()> {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8(&dir);
        let srtool = root.join("srtool.txt");
        fs::write(&srtool, "wasm: 1.2 MB\n").expect("write artifact");

        let artifacts = load_artifacts(&ArtifactPaths {
            srtool_details: Some(srtool),
            subwasm_info: None,
        })?;
        assert_eq!(artifacts.srtool_details.as_deref(), Some("wasm: 1.2 MB\n"));
        assert_eq!(artifacts.subwasm_info, None);
        Ok(())
    }

    #[test]
    fn missing_artifact_is_an_io_error() {
        let paths = ArtifactPaths {
            srtool_details: None,
            subwasm_info: Some(Utf8PathBuf::from("/nonexistent/subwasm.txt")),
        };
        assert!(matches!(load_artifacts(&paths), Err(Error::Io { path, .. }) if path.ends_with("subwasm.txt")));
    }

    #[test]
    fn bundled_template_is_default() -> Result<()> {
        assert_eq!(load_template(None)?, DEFAULT_TEMPLATE);
        Ok(())
    }

    #[test]
    fn report_writing_creates_parents_and_step_output_appends() -> Result<()> {
        let dir = TempDir::new().expect("temp dir");
        let root = utf8(&dir);
        let report = root.join("notes/out/release-notes.md");
        write_report(&report, "# notes\n")?;
        assert_eq!(fs::read_to_string(&report).expect("read report"), "# notes\n");

        let step_output = root.join("github_output");
        fs::write(&step_output, "other=1\n").expect("seed step output");
        publish_output_path(&step_output, &report)?;
        assert_eq!(
            fs::read_to_string(&step_output).expect("read step output"),
            format!("other=1\nrelease-note={report}\n")
        );
        Ok(())
    }
}
