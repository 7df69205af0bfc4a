//! Provisioning progress payloads, reported during first-run guest setup.

use serde::{Deserialize, Serialize};

/// Guest reports provisioning progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningProgress {
    /// Name of the step currently running, e.g. `"installing-driver"`.
    pub step: String,
    /// Completion percentage for `step`, `0..=100`.
    pub percent_complete: u8,
}

/// Guest reports a provisioning error. Provisioning continues with best
/// effort unless the error is reported alongside a later `Shutdown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningError {
    /// Name of the step that failed.
    pub step: String,
    /// Human-readable failure detail.
    pub message: String,
}

/// Guest reports provisioning completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningComplete {
    /// Total time provisioning took, in milliseconds.
    pub elapsed_ms: u64,
}
