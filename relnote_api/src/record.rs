use serde::{Deserialize, Serialize};

/// Opaque report texts passed through to the template untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseArtifacts {
    /// Deterministic runtime build summary.
    #[serde(default)]
    pub srtool_details: Option<String>,
    /// Runtime blob size and metadata diff.
    #[serde(default)]
    pub subwasm_info: Option<String>,
}

/// Flat record handed to the report template.
///
/// Every fact appears twice: the value at the current release and a
/// `previous_` twin holding the value at the previous release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Scope title, e.g. "Full Release".
    pub scope: String,
    /// Chain display name, e.g. "Karura".
    pub network: String,
    pub version: String,
    pub previous_version: String,
    pub branch_name: String,
    pub previous_branch_name: String,
    pub runtime: String,
    pub previous_runtime: String,
    pub substrate_version: String,
    pub previous_substrate_version: String,
    pub substrate_semver: String,
    pub previous_substrate_semver: String,
    pub polkadot_version: String,
    pub previous_polkadot_version: String,
    pub polkadot_semver: String,
    pub previous_polkadot_semver: String,
    pub cumulus_version: String,
    pub previous_cumulus_version: String,
    pub cumulus_semver: String,
    pub previous_cumulus_semver: String,
    pub orml_version: String,
    pub previous_orml_version: String,
    pub srtool_details: Option<String>,
    pub subwasm_info: Option<String>,
    pub client_checklist: bool,
    pub runtime_checklist: bool,
    pub is_mandala: bool,
    pub is_karura: bool,
    pub is_acala: bool,
}
