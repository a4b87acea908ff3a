//! Heal invocation options

use serde::{Deserialize, Serialize};

/// Options controlling a heal invocation.
///
/// Passed explicitly through every call rather than read from ambient
/// state, so concurrent heals of different files can run with different
/// settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealOptions {
    /// Let well-founded cross-accusations override self-accusations, and
    /// enable the salvage and file-id repair paths.
    pub aggressive: bool,

    /// Report intended remediation actions without performing any writes.
    pub dry_run: bool,

    /// Verify the file-id attribute is identical across replicas before
    /// healing.
    pub check_file_id: bool,
}
