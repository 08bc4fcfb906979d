//! Discovery of EDID blobs exposed by the kernel, e.g. under `/sys/class/drm`.

use anyhow::Result;
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use walkdir::WalkDir;

use crate::edid::Edid;
use crate::formatter::OutputFormatter;
use crate::storage;

pub const DEFAULT_SCAN_ROOT: &str = "/sys/class/drm";
const EDID_FILE_NAME: &str = "edid";
/// `<root>/cardN-<connector>/edid`; deeper paths only reach the same files again
const CONNECTOR_DEPTH: usize = 2;

/// Short identification of a display found during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySummary {
    pub manufacturer_id: String,
    pub product_code: u16,
    pub serial_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitor_name: Option<String>,
    pub finding_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplaySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct DisplayScanner {
    connector_pattern: Regex,
}

impl DisplayScanner {
    pub fn new() -> Result<Self> {
        Ok(DisplayScanner {
            // Match card0-HDMI-A-1, card1-eDP-1, ...
            connector_pattern: Regex::new(r"^card\d+-(.+)$")?,
        })
    }

    /// Connector name from the directory holding an `edid` file
    pub fn connector_name(&self, edid_path: &Path) -> Option<String> {
        let dir = edid_path.parent()?.file_name()?.to_str()?;
        self.connector_pattern
            .captures(dir)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Find every non-empty `edid` file at connector level below `root`, sorted by path.
    ///
    /// sysfs exposes each connector both as `cardN-<connector>` and inside
    /// `cardN`, all symlinks into `/sys/devices`; each physical file is
    /// listed once.
    pub fn scan(&self, root: &Path) -> Vec<ScanEntry> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .max_depth(CONNECTOR_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();

            if !path.is_file() || entry.file_name() != EDID_FILE_NAME {
                continue;
            }

            let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if !seen.insert(canonical) {
                debug!("{} already listed through another path", path.display());
                continue;
            }

            let data = match storage::read_all(path) {
                Ok(data) => data,
                Err(e) => {
                    warn!("skipping {}: {e:#}", path.display());
                    continue;
                }
            };

            // Disconnected connectors expose an empty file
            if data.is_empty() {
                debug!("no display on {}", path.display());
                continue;
            }

            entries.push(self.describe(path, &data));
        }

        entries
    }

    fn describe(&self, path: &Path, data: &[u8]) -> ScanEntry {
        let (display, error) = match Edid::decode(data) {
            Ok(edid) => {
                let report = edid.parse();
                let summary = DisplaySummary {
                    manufacturer_id: report.identification.manufacturer_id.clone(),
                    product_code: report.identification.product_code,
                    serial_number: report.identification.serial_number,
                    monitor_name: report.monitor_name().map(str::to_string),
                    finding_count: report.findings.len(),
                };
                (Some(summary), None)
            }
            Err(e) => (None, Some(e.to_string())),
        };

        ScanEntry {
            path: path.display().to_string(),
            connector: self.connector_name(path),
            size: data.len(),
            display,
            error,
        }
    }
}

/// Render scan results through a formatter
pub fn display_scan(
    entries: &[ScanEntry],
    root: &str,
    formatter: &mut dyn OutputFormatter,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    formatter.begin_scan(writer, root)?;
    for entry in entries {
        formatter.scan_entry(writer, entry)?;
    }
    formatter.end_scan(writer, entries.len())
}
