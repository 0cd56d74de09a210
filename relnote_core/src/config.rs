use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use relnote_api::{Chain, ReleaseScope, RevisionRef};

use crate::resolve::ReleaseTarget;
use crate::{Error, Result};

/// Default probe timeout in seconds.
pub const DEFAULT_CARGO_TIMEOUT_SECS: u64 = 600;

/// Output file used with the bundled template.
pub const DEFAULT_OUTPUT: &str = "release-notes.md";

/// Inputs as received from flags or the CI runner environment.
///
/// Runners hand unset inputs over as empty strings, so `Some("")` is treated
/// the same as `None` everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInputs {
    /// Release scope name.
    pub scope: Option<String>,
    /// Chain name.
    pub chain: Option<String>,
    /// Explicit newer release identifier.
    pub current: Option<String>,
    /// Explicit older release identifier.
    pub previous: Option<String>,
    /// Report template path.
    pub template: Option<String>,
    /// Path of the build-summary text.
    pub srtool_details: Option<String>,
    /// Path of the binary-size diff text.
    pub subwasm_info: Option<String>,
    /// Output path override.
    pub output: Option<String>,
    /// Working tree to inspect.
    pub repo: Option<String>,
    /// Probe timeout in seconds.
    pub cargo_timeout_secs: Option<String>,
}

/// Paths of the optional pass-through texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Build-summary text.
    pub srtool_details: Option<Utf8PathBuf>,
    /// Binary-size diff text.
    pub subwasm_info: Option<Utf8PathBuf>,
}

/// Validated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// What the release covers.
    pub scope: ReleaseScope,
    /// Chain being released.
    pub chain: Chain,
    /// How the two release points are chosen.
    pub target: ReleaseTarget,
    /// Template path; `None` selects the bundled template.
    pub template: Option<Utf8PathBuf>,
    /// Pass-through text files.
    pub artifacts: ArtifactPaths,
    /// Where the rendered report goes.
    pub output: Utf8PathBuf,
    /// Working tree to inspect.
    pub repo: Utf8PathBuf,
    /// Probe timeout.
    pub cargo_timeout: Duration,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str> {
    present(value).ok_or_else(|| Error::configuration(format!("missing required input '{name}'")))
}

fn path(value: Option<&String>) -> Option<Utf8PathBuf> {
    present(value).map(Utf8PathBuf::from)
}

impl RawInputs {
    /// Check every input and build the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a missing or unknown scope or
    /// chain, a one-sided explicit release pair, a non-positive timeout, or an
    /// output path that would overwrite the template.
    pub fn validate(&self) -> Result<ReleaseRequest> {
        let scope = required(self.scope.as_ref(), "scope")?
            .parse::<ReleaseScope>()
            .map_err(|err| Error::configuration(err.to_string()))?;
        let chain = required(self.chain.as_ref(), "network")?
            .parse::<Chain>()
            .map_err(|err| Error::configuration(err.to_string()))?;

        let previous = present(self.previous.as_ref()).map(RevisionRef::new);
        let current = present(self.current.as_ref()).map(RevisionRef::new);
        if previous.is_some() != current.is_some() {
            return Err(Error::configuration(
                "'current' and 'previous' must be given together or not at all",
            ));
        }
        let target = ReleaseTarget::from_inputs(previous, current, chain);

        let template = path(self.template.as_ref());
        let output = match path(self.output.as_ref()) {
            Some(output) => output,
            None => default_output(template.as_deref()),
        };
        if template.as_deref() == Some(output.as_path()) {
            return Err(Error::configuration(format!(
                "output {output} would overwrite the template; set an explicit output"
            )));
        }

        let cargo_timeout = match present(self.cargo_timeout_secs.as_ref()) {
            None => Duration::from_secs(DEFAULT_CARGO_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::configuration(format!(
                        "cargo timeout must be a positive number of seconds, got '{raw}'"
                    )))
                }
            },
        };

        Ok(ReleaseRequest {
            scope,
            chain,
            target,
            template,
            artifacts: ArtifactPaths {
                srtool_details: path(self.srtool_details.as_ref()),
                subwasm_info: path(self.subwasm_info.as_ref()),
            },
            output,
            repo: path(self.repo.as_ref()).unwrap_or_else(|| Utf8PathBuf::from(".")),
            cargo_timeout,
        })
    }
}

/// Template path with its extension replaced by `md`, or [`DEFAULT_OUTPUT`]
/// for the bundled template.
#[must_use]
pub fn default_output(template: Option<&Utf8Path>) -> Utf8PathBuf {
    template.map_or_else(
        || Utf8PathBuf::from(DEFAULT_OUTPUT),
        |template| template.with_extension("md"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(scope: &str, chain: &str) -> RawInputs {
        RawInputs {
            scope: Some(scope.into()),
            chain: Some(chain.into()),
            ..RawInputs::default()
        }
    }

    #[test]
    fn minimal_inputs_use_defaults() -> Result<()> {
        let request = inputs("full", "karura").validate()?;
        assert_eq!(request.scope, ReleaseScope::Full);
        assert_eq!(request.chain, Chain::Karura);
        assert_eq!(request.target, ReleaseTarget::Latest { chain: Chain::Karura });
        assert_eq!(request.template, None);
        assert_eq!(request.output, Utf8PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(request.repo, Utf8PathBuf::from("."));
        assert_eq!(request.cargo_timeout, Duration::from_secs(600));
        assert_eq!(request.artifacts, ArtifactPaths::default());
        Ok(())
    }

    #[test]
    fn empty_strings_count_as_absent() -> Result<()> {
        let raw = RawInputs {
            current: Some(String::new()),
            previous: Some("  ".into()),
            template: Some(String::new()),
            srtool_details: Some(String::new()),
            cargo_timeout_secs: Some(String::new()),
            ..inputs("runtime", "acala")
        };
        let request = raw.validate()?;
        assert_eq!(request.target, ReleaseTarget::Latest { chain: Chain::Acala });
        assert_eq!(request.template, None);
        assert_eq!(request.artifacts.srtool_details, None);
        assert_eq!(request.cargo_timeout, Duration::from_secs(600));
        Ok(())
    }

    #[test]
    fn explicit_pair_is_used_when_both_given() -> Result<()> {
        let raw = RawInputs {
            current: Some("2.1.0".into()),
            previous: Some("2.0.0".into()),
            ..inputs("client", "mandala")
        };
        assert_eq!(
            raw.validate()?.target,
            ReleaseTarget::Explicit {
                previous: RevisionRef::new("2.0.0"),
                current: RevisionRef::new("2.1.0"),
            }
        );
        Ok(())
    }

    #[test]
    fn one_sided_pair_is_rejected() {
        let raw = RawInputs {
            current: Some("2.1.0".into()),
            ..inputs("client", "mandala")
        };
        assert!(matches!(raw.validate(), Err(Error::Configuration { .. })));
    }

    #[test]
    fn unknown_or_missing_names_are_rejected() {
        for raw in [
            inputs("everything", "karura"),
            inputs("full", "polkadot"),
            inputs("", "karura"),
            RawInputs {
                chain: None,
                ..inputs("full", "karura")
            },
        ] {
            assert!(
                matches!(raw.validate(), Err(Error::Configuration { .. })),
                "accepted: {raw:?}"
            );
        }
    }

    #[test]
    fn unknown_names_report_accepted_values() {
        let err = inputs("everything", "karura").validate();
        assert!(
            matches!(&err, Err(Error::Configuration { message })
                if message == "unknown scope 'everything' (expected one of: client, runtime, full)"),
            "{err:?}"
        );

        let err = inputs("full", "polkadot").validate();
        assert!(
            matches!(&err, Err(Error::Configuration { message })
                if message.starts_with("unknown chain 'polkadot'")),
            "{err:?}"
        );
    }

    #[test]
    fn output_follows_template() -> Result<()> {
        let raw = RawInputs {
            template: Some(".github/release-notes/karura.hbs".into()),
            ..inputs("full", "karura")
        };
        assert_eq!(
            raw.validate()?.output,
            Utf8PathBuf::from(".github/release-notes/karura.md")
        );

        let raw = RawInputs {
            output: Some("out/notes.md".into()),
            ..raw
        };
        assert_eq!(raw.validate()?.output, Utf8PathBuf::from("out/notes.md"));
        Ok(())
    }

    #[test]
    fn markdown_template_needs_explicit_output() {
        let raw = RawInputs {
            template: Some("notes.md".into()),
            ..inputs("full", "karura")
        };
        assert!(matches!(raw.validate(), Err(Error::Configuration { .. })));
    }

    #[test]
    fn timeout_must_be_positive() {
        for value in ["0", "-5", "ten"] {
            let raw = RawInputs {
                cargo_timeout_secs: Some(value.into()),
                ..inputs("full", "acala")
            };
            assert!(matches!(raw.validate(), Err(Error::Configuration { .. })), "{value}");
        }
    }
}
