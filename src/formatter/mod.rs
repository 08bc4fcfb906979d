use std::io::Write;
use crate::edid::Descriptor;
use crate::edid::Finding;
use crate::edid::Identification;
use crate::edid::extension::{DataBlock, SectionHeader};
use crate::edid::fields::{BasicDisplayParameters, Chromaticity, EstablishedTimings, StandardTiming};
use crate::scan::ScanEntry;

mod plain;
mod json;

pub use plain::PlainFormatter;
pub use json::JsonFormatter;


#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Plain,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

pub trait OutputFormatter {
    fn begin_document(&mut self, w: &mut dyn Write) -> std::io::Result<()>;
    fn end_document(&mut self, w: &mut dyn Write) -> std::io::Result<()>;

    fn begin_record(&mut self, w: &mut dyn Write, source: &str) -> std::io::Result<()>;
    fn end_record(&mut self, w: &mut dyn Write) -> std::io::Result<()>;

    fn identification(&mut self, w: &mut dyn Write, id: &Identification, header_valid: bool) -> std::io::Result<()>;
    fn basic_display(&mut self, w: &mut dyn Write, bdp: &BasicDisplayParameters) -> std::io::Result<()>;
    fn chromaticity(&mut self, w: &mut dyn Write, cc: &Chromaticity) -> std::io::Result<()>;
    fn established_timings(&mut self, w: &mut dyn Write, et: &EstablishedTimings) -> std::io::Result<()>;

    fn begin_standard_timings(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()>;
    fn standard_timing(&mut self, w: &mut dyn Write, timing: &StandardTiming) -> std::io::Result<()>;
    fn end_standard_timings(&mut self, w: &mut dyn Write) -> std::io::Result<()>;

    fn begin_descriptors(&mut self, w: &mut dyn Write) -> std::io::Result<()>;
    fn descriptor(&mut self, w: &mut dyn Write, slot: usize, descriptor: &Descriptor) -> std::io::Result<()>;
    fn end_descriptors(&mut self, w: &mut dyn Write) -> std::io::Result<()>;

    fn checksum(&mut self, w: &mut dyn Write, extension_flag: u8, checksum: u8, valid: bool) -> std::io::Result<()>;

    // Extension block
    fn begin_extension(&mut self, w: &mut dyn Write, header: &SectionHeader, checksum_valid: bool) -> std::io::Result<()>;
    fn data_block(&mut self, w: &mut dyn Write, block: &DataBlock) -> std::io::Result<()>;
    fn end_extension(&mut self, w: &mut dyn Write) -> std::io::Result<()>;

    fn begin_findings(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()>;
    fn finding(&mut self, w: &mut dyn Write, finding: &Finding) -> std::io::Result<()>;
    fn end_findings(&mut self, w: &mut dyn Write) -> std::io::Result<()>;

    fn output_written(&mut self, w: &mut dyn Write, path: &str, len: usize) -> std::io::Result<()>;

    // Directory scan
    fn begin_scan(&mut self, w: &mut dyn Write, root: &str) -> std::io::Result<()>;
    fn scan_entry(&mut self, w: &mut dyn Write, entry: &ScanEntry) -> std::io::Result<()>;
    fn end_scan(&mut self, w: &mut dyn Write, count: usize) -> std::io::Result<()>;
}

pub fn create_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Plain => Box::new(PlainFormatter::new()),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}
