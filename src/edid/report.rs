use serde::Serialize;
use std::io::Write;

use super::descriptor::Descriptor;
use super::extension::ExtensionReport;
use super::fields::{BasicDisplayParameters, Chromaticity, EstablishedTimings, StandardTiming};
use super::finding::Finding;
use crate::formatter::OutputFormatter;

/// Vendor and product identification fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identification {
    pub manufacturer_id: String,
    pub product_code: u16,
    pub serial_number: u32,
    pub week_of_manufacture: u8,
    pub year_of_manufacture: u16,
    /// Week is 0xFF: the year is the model year, not the manufacture date
    pub model_year: bool,
    pub version: u8,
    pub revision: u8,
}

/// Fully interpreted EDID record, as produced by [`Edid::parse`](super::Edid::parse)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub header_valid: bool,
    pub identification: Identification,
    pub basic_display: BasicDisplayParameters,
    pub chromaticity: Chromaticity,
    pub established_timings: EstablishedTimings,
    pub standard_timings: Vec<StandardTiming>,
    pub descriptors: Vec<Descriptor>,
    pub extension_flag: u8,
    pub checksum: u8,
    pub checksum_valid: bool,
    pub extension: Option<ExtensionReport>,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn monitor_name(&self) -> Option<&str> {
        self.descriptors.iter().find_map(|descriptor| match descriptor {
            Descriptor::MonitorName { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Render a report through a formatter, section by section
pub fn display_report(
    report: &Report,
    source: &str,
    formatter: &mut dyn OutputFormatter,
    writer: &mut dyn Write,
) -> std::io::Result<()> {
    formatter.begin_record(writer, source)?;

    formatter.identification(writer, &report.identification, report.header_valid)?;
    formatter.basic_display(writer, &report.basic_display)?;
    formatter.chromaticity(writer, &report.chromaticity)?;
    formatter.established_timings(writer, &report.established_timings)?;

    formatter.begin_standard_timings(writer, report.standard_timings.len())?;
    for timing in &report.standard_timings {
        formatter.standard_timing(writer, timing)?;
    }
    formatter.end_standard_timings(writer)?;

    formatter.begin_descriptors(writer)?;
    for (slot, descriptor) in report.descriptors.iter().enumerate() {
        formatter.descriptor(writer, slot, descriptor)?;
    }
    formatter.end_descriptors(writer)?;

    formatter.checksum(writer, report.extension_flag, report.checksum, report.checksum_valid)?;

    if let Some(extension) = &report.extension {
        formatter.begin_extension(writer, &extension.header, extension.checksum_valid)?;
        for block in &extension.blocks {
            formatter.data_block(writer, block)?;
        }
        formatter.end_extension(writer)?;
    }

    formatter.begin_findings(writer, report.findings.len())?;
    for finding in &report.findings {
        formatter.finding(writer, finding)?;
    }
    formatter.end_findings(writer)?;

    formatter.end_record(writer)
}
