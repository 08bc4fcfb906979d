use super::OutputFormatter;
use std::io::Write;
use serde::Serialize;
use crate::edid::Descriptor;
use crate::edid::Finding;
use crate::edid::Identification;
use crate::edid::extension::{DataBlock, SectionHeader};
use crate::edid::fields::{BasicDisplayParameters, Chromaticity, EstablishedTimings, StandardTiming};
use crate::scan::ScanEntry;

pub struct JsonFormatter {
    data: JsonData,
}

#[derive(Serialize)]
struct JsonData {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    records: Vec<JsonRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<JsonOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scan: Option<JsonScan>,
}

#[derive(Serialize)]
struct JsonRecord {
    source: String,
    header_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    identification: Option<Identification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    basic_display: Option<BasicDisplayParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chromaticity: Option<Chromaticity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    established_timings: Option<EstablishedTimings>,
    standard_timings: Vec<StandardTiming>,
    descriptors: Vec<JsonDescriptor>,
    extension_flag: u8,
    checksum: u8,
    checksum_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    extension: Option<JsonExtension>,
    findings: Vec<Finding>,
}

#[derive(Serialize)]
struct JsonDescriptor {
    slot: usize,
    #[serde(flatten)]
    descriptor: Descriptor,
}

#[derive(Serialize)]
struct JsonExtension {
    header: SectionHeader,
    checksum_valid: bool,
    blocks: Vec<DataBlock>,
}

#[derive(Serialize)]
struct JsonOutput {
    path: String,
    bytes: usize,
}

#[derive(Serialize)]
struct JsonScan {
    root: String,
    displays: Vec<ScanEntry>,
    total: usize,
}

impl JsonFormatter {
    pub fn new() -> Self {
        JsonFormatter {
            data: JsonData {
                records: Vec::new(),
                output: None,
                scan: None,
            }
        }
    }

    fn record(&mut self) -> Option<&mut JsonRecord> {
        self.data.records.last_mut()
    }
}

impl OutputFormatter for JsonFormatter {
    fn begin_document(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn end_document(&mut self, w: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        writeln!(w, "{json}")?;
        Ok(())
    }

    fn begin_record(&mut self, _w: &mut dyn Write, source: &str) -> std::io::Result<()> {
        self.data.records.push(JsonRecord {
            source: source.to_string(),
            header_valid: false,
            identification: None,
            basic_display: None,
            chromaticity: None,
            established_timings: None,
            standard_timings: Vec::new(),
            descriptors: Vec::new(),
            extension_flag: 0,
            checksum: 0,
            checksum_valid: false,
            extension: None,
            findings: Vec::new(),
        });
        Ok(())
    }

    fn end_record(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn identification(&mut self, _w: &mut dyn Write, id: &Identification, header_valid: bool) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.identification = Some(id.clone());
            record.header_valid = header_valid;
        }
        Ok(())
    }

    fn basic_display(&mut self, _w: &mut dyn Write, bdp: &BasicDisplayParameters) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.basic_display = Some(*bdp);
        }
        Ok(())
    }

    fn chromaticity(&mut self, _w: &mut dyn Write, cc: &Chromaticity) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.chromaticity = Some(*cc);
        }
        Ok(())
    }

    fn established_timings(&mut self, _w: &mut dyn Write, et: &EstablishedTimings) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.established_timings = Some(et.clone());
        }
        Ok(())
    }

    fn begin_standard_timings(&mut self, _w: &mut dyn Write, _count: usize) -> std::io::Result<()> {
        Ok(())
    }

    fn standard_timing(&mut self, _w: &mut dyn Write, timing: &StandardTiming) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.standard_timings.push(*timing);
        }
        Ok(())
    }

    fn end_standard_timings(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn begin_descriptors(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn descriptor(&mut self, _w: &mut dyn Write, slot: usize, descriptor: &Descriptor) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.descriptors.push(JsonDescriptor { slot, descriptor: descriptor.clone() });
        }
        Ok(())
    }

    fn end_descriptors(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn checksum(&mut self, _w: &mut dyn Write, extension_flag: u8, checksum: u8, valid: bool) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.extension_flag = extension_flag;
            record.checksum = checksum;
            record.checksum_valid = valid;
        }
        Ok(())
    }

    fn begin_extension(&mut self, _w: &mut dyn Write, header: &SectionHeader, checksum_valid: bool) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.extension = Some(JsonExtension {
                header: *header,
                checksum_valid,
                blocks: Vec::new(),
            });
        }
        Ok(())
    }

    fn data_block(&mut self, _w: &mut dyn Write, block: &DataBlock) -> std::io::Result<()> {
        if let Some(extension) = self.record().and_then(|record| record.extension.as_mut()) {
            extension.blocks.push(block.clone());
        }
        Ok(())
    }

    fn end_extension(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn begin_findings(&mut self, _w: &mut dyn Write, _count: usize) -> std::io::Result<()> {
        Ok(())
    }

    fn finding(&mut self, _w: &mut dyn Write, finding: &Finding) -> std::io::Result<()> {
        if let Some(record) = self.record() {
            record.findings.push(finding.clone());
        }
        Ok(())
    }

    fn end_findings(&mut self, _w: &mut dyn Write) -> std::io::Result<()> {
        Ok(())
    }

    fn output_written(&mut self, _w: &mut dyn Write, path: &str, len: usize) -> std::io::Result<()> {
        self.data.output = Some(JsonOutput { path: path.to_string(), bytes: len });
        Ok(())
    }

    fn begin_scan(&mut self, _w: &mut dyn Write, root: &str) -> std::io::Result<()> {
        self.data.scan = Some(JsonScan {
            root: root.to_string(),
            displays: Vec::new(),
            total: 0,
        });
        Ok(())
    }

    fn scan_entry(&mut self, _w: &mut dyn Write, entry: &ScanEntry) -> std::io::Result<()> {
        if let Some(scan) = &mut self.data.scan {
            scan.displays.push(entry.clone());
        }
        Ok(())
    }

    fn end_scan(&mut self, _w: &mut dyn Write, count: usize) -> std::io::Result<()> {
        if let Some(scan) = &mut self.data.scan {
            scan.total = count;
        }
        Ok(())
    }
}
