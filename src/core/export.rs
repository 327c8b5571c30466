//! Snapshot export with integrity checksum.

use crate::core::error::CovenantError;
use crate::core::state::ExecState;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Render the full state tree as pretty JSON plus the SHA-256 of the
/// exact bytes. The checksum lets downstream consumers verify a
/// snapshot without re-serializing it.
pub fn render_snapshot(state: &ExecState) -> Result<(String, String), CovenantError> {
    let json = serde_json::to_string_pretty(state)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let checksum = format!("{:x}", hasher.finalize());
    Ok((json, checksum))
}

/// Write the snapshot to disk and return its checksum.
pub fn write_snapshot(state: &ExecState, path: &Path) -> Result<String, CovenantError> {
    let (json, checksum) = render_snapshot(state)?;
    std::fs::write(path, json)?;
    Ok(checksum)
}
