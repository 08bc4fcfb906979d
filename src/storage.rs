//! Whole-file byte I/O for EDID records.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Read every byte of `path`
pub fn read_all(path: &Path) -> Result<Vec<u8>> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read EDID file: {}", path.display()))?;
    debug!("read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Create or truncate `path` and write `bytes` to it
pub fn write_all(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes)
        .with_context(|| format!("Failed to write EDID file: {}", path.display()))?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
