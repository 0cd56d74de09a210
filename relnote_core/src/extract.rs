//! Each parser accepts exactly one grammar and reports the first deviation
//! as a [`ParseError`]; none of them return partially filled facts.

use relnote_api::{Chain, DependencyFact, RuntimeFact, SubrepoFact};

const SPEC_VERSION_KEY: &str = "spec_version";
const SHORT_HASH_LEN: usize = 8;

/// Reasons raw tool output was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A line did not split into the expected number of tokens.
    #[error("expected {expected} tokens in {subject}, found {found}: {input:?}")]
    TokenCount {
        /// What was being parsed.
        subject: &'static str,
        /// Required token count.
        expected: usize,
        /// Actual token count.
        found: usize,
        /// Offending input.
        input: String,
    },
    /// The dependency source was not wrapped in parentheses.
    #[error("dependency source is not parenthesised: {input:?}")]
    MalformedSource {
        /// Offending input.
        input: String,
    },
    /// The dependency source carries no `#<hash>` suffix.
    #[error("dependency source has no commit hash: {input:?}")]
    MissingHash {
        /// Offending input.
        input: String,
    },
    /// A tree-entry record had fewer than three tokens.
    #[error("expected at least 3 tokens in sub-repository record, found {found}: {input:?}")]
    TooFewTokens {
        /// Actual token count.
        found: usize,
        /// Offending input.
        input: String,
    },
    /// A commit hash was too short or not hexadecimal.
    #[error("malformed commit hash {hash:?}")]
    MalformedHash {
        /// Offending token.
        hash: String,
    },
    /// No line mentioned the searched key.
    #[error("no line mentions `{key}`")]
    NoMatchingLine {
        /// Searched key.
        key: &'static str,
    },
    /// More than one line mentioned the searched key.
    #[error("{count} lines mention `{key}`, expected exactly one")]
    DuplicateLines {
        /// Searched key.
        key: &'static str,
        /// Number of matching lines.
        count: usize,
    },
    /// An `=` declaration did not have a single-token right-hand side.
    #[error("malformed declaration: {input:?}")]
    MalformedDeclaration {
        /// Offending input.
        input: String,
    },
    /// A version that must be decimal was not.
    #[error("{key} value {value:?} is not a decimal number")]
    NotNumeric {
        /// Key whose value was rejected.
        key: &'static str,
        /// Offending value.
        value: String,
    },
    /// File content was not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    NotUtf8 {
        /// Path of the rejected file.
        path: String,
    },
}

/// Parse one dependency-graph line: `<name> <version> (<source-url>#<hash>)`.
///
/// A leading `v` on the version, as printed by `cargo tree`, is dropped.
///
/// # Errors
///
/// Fails unless the line has exactly three tokens, the third is
/// parenthesised, and a non-empty hash follows `#`.
pub fn parse_dependency_line(raw: &str) -> Result<DependencyFact, ParseError> {
    let line = raw.trim();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [name, version, source] = tokens.as_slice() else {
        return Err(ParseError::TokenCount {
            subject: "dependency line",
            expected: 3,
            found: tokens.len(),
            input: line.to_owned(),
        });
    };

    let source = source
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .ok_or_else(|| ParseError::MalformedSource {
            input: line.to_owned(),
        })?;

    let hash = source
        .split_once('#')
        .map(|(_, hash)| hash)
        .filter(|hash| !hash.is_empty())
        .ok_or_else(|| ParseError::MissingHash {
            input: line.to_owned(),
        })?;

    Ok(DependencyFact {
        name: (*name).to_owned(),
        version: strip_version_prefix(version).to_owned(),
        commit_hash: hash.to_owned(),
    })
}

fn strip_version_prefix(version: &str) -> &str {
    match version.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => version,
    }
}

/// Parse a tree-entry record such as
/// `160000 commit 37e42936c41dbdbaf0117c628c9eab0e06044844\torml`.
///
/// # Errors
///
/// Fails when the record has fewer than three word tokens or the third is
/// not a hex hash of at least eight characters.
pub fn parse_submodule_record(raw: &str) -> Result<SubrepoFact, ParseError> {
    let tokens: Vec<&str> = raw
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '+'))
        .filter(|token| !token.is_empty())
        .collect();

    let Some(hash) = tokens.get(2) else {
        return Err(ParseError::TooFewTokens {
            found: tokens.len(),
            input: raw.trim().to_owned(),
        });
    };

    if hash.len() < SHORT_HASH_LEN || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseError::MalformedHash {
            hash: (*hash).to_owned(),
        });
    }

    Ok(SubrepoFact {
        commit_hash: hash[..SHORT_HASH_LEN].to_owned(),
    })
}

/// Extract the runtime `spec_version` from a runtime crate root.
///
/// Exactly one line may mention `spec_version`. After a trailing `,` or `;`
/// is stripped it must be either a field initialiser (`spec_version: 2130`)
/// or a constant declaration (`pub const spec_version: u32 = 2130`).
///
/// # Errors
///
/// Fails on zero or several matching lines, on any other line shape, or on
/// a non-decimal value.
pub fn parse_runtime_spec(content: &str, chain: Chain) -> Result<RuntimeFact, ParseError> {
    let matches: Vec<&str> = content
        .lines()
        .filter(|line| line.contains(SPEC_VERSION_KEY))
        .collect();

    let line = match matches.as_slice() {
        [] => {
            return Err(ParseError::NoMatchingLine {
                key: SPEC_VERSION_KEY,
            })
        }
        [line] => line.trim(),
        _ => {
            return Err(ParseError::DuplicateLines {
                key: SPEC_VERSION_KEY,
                count: matches.len(),
            })
        }
    };

    let line = line
        .strip_suffix(',')
        .or_else(|| line.strip_suffix(';'))
        .unwrap_or(line)
        .trim_end();

    let value = if let Some((_, rhs)) = line.split_once('=') {
        let rhs: Vec<&str> = rhs.split_whitespace().collect();
        let [value] = rhs.as_slice() else {
            return Err(ParseError::MalformedDeclaration {
                input: line.to_owned(),
            });
        };
        *value
    } else {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [_, value] = tokens.as_slice() else {
            return Err(ParseError::TokenCount {
                subject: "spec_version line",
                expected: 2,
                found: tokens.len(),
                input: line.to_owned(),
            });
        };
        *value
    };

    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::NotNumeric {
            key: SPEC_VERSION_KEY,
            value: value.to_owned(),
        });
    }

    Ok(RuntimeFact {
        chain,
        spec_version: value.to_owned(),
    })
}
