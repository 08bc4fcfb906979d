//! EDID codec: decoding, interpretation, mutation and re-encoding of the
//! 128-byte base block plus an optional 128-byte extension block.

use log::debug;

pub mod checksum;
pub mod descriptor;
pub mod encode;
pub mod error;
pub mod extension;
pub mod fields;
pub mod finding;
pub mod reader;
pub mod report;

#[cfg(test)]
pub(crate) mod testdata;

pub use descriptor::Descriptor;
pub use error::EdidError;
pub use finding::{Finding, FindingKind};
pub use report::{Identification, Report, display_report};

use reader::DataReader;

// Field sizes of the base block, in layout order
pub mod sizes {
    pub const HEADER: usize = 8;
    pub const MANUFACTURER_ID: usize = 2;
    pub const PRODUCT_CODE: usize = 2;
    pub const SERIAL_NUMBER: usize = 4;
    pub const BASIC_DISPLAY_PARAMETERS: usize = 5;
    pub const CHROMATICITY: usize = 10;
    pub const ESTABLISHED_TIMINGS: usize = 3;
    pub const STANDARD_TIMING: usize = 2;
    pub const STANDARD_TIMING_COUNT: usize = 8;
    pub const DESCRIPTOR: usize = 18;
    pub const DESCRIPTOR_COUNT: usize = 4;
    pub const DESCRIPTOR_TEXT_START: usize = 5;
    pub const DESCRIPTOR_TEXT: usize = DESCRIPTOR - DESCRIPTOR_TEXT_START;
    pub const BLOCK: usize = 128;
    pub const EXTENDED: usize = 2 * BLOCK;
}

// Absolute offsets used for findings
pub mod offsets {
    pub const MANUFACTURER_ID: usize = 0x08;
    pub const SERIAL_NUMBER: usize = 0x0C;
    pub const DESCRIPTORS: usize = 0x36;
    pub const EXTENSION_FLAG: usize = 0x7E;
    pub const CHECKSUM: usize = 0x7F;
}

pub const HEADER_PATTERN: [u8; sizes::HEADER] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

/// Week value announcing that the year field is a model year
const MODEL_YEAR_WEEK: u8 = 0xFF;

/// A decoded EDID record.
///
/// Fields hold the raw bytes in layout order so that an unmodified record
/// re-encodes byte for byte; interpretation happens in [`Edid::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edid {
    pub header: [u8; sizes::HEADER],
    pub manufacturer_id: [u8; sizes::MANUFACTURER_ID],
    pub product_code: [u8; sizes::PRODUCT_CODE],
    pub serial_number: [u8; sizes::SERIAL_NUMBER],
    pub week_of_manufacture: u8,
    pub year_of_manufacture: u8,
    pub version: u8,
    pub revision: u8,
    pub basic_display_parameters: [u8; sizes::BASIC_DISPLAY_PARAMETERS],
    pub chromaticity: [u8; sizes::CHROMATICITY],
    pub established_timings: [u8; sizes::ESTABLISHED_TIMINGS],
    pub standard_timings: [[u8; sizes::STANDARD_TIMING]; sizes::STANDARD_TIMING_COUNT],
    pub descriptors: [[u8; sizes::DESCRIPTOR]; sizes::DESCRIPTOR_COUNT],
    pub extension_flag: u8,
    pub checksum: u8,
    pub extension: Option<[u8; sizes::BLOCK]>,
}

impl Edid {
    /// Split a 128- or 256-byte blob into the base record and optional extension.
    ///
    /// No semantic validation happens here: a bad header or checksum still
    /// decodes and is reported later by [`Edid::parse`].
    pub fn decode(data: &[u8]) -> Result<Self, EdidError> {
        if data.len() != sizes::BLOCK && data.len() != sizes::EXTENDED {
            return Err(EdidError::InvalidSize(data.len()));
        }
        let short = || EdidError::InvalidSize(data.len());

        let mut reader = DataReader::new(data, 0);
        let header = reader.read_array().ok_or_else(short)?;
        let manufacturer_id = reader.read_array().ok_or_else(short)?;
        let product_code = reader.read_array().ok_or_else(short)?;
        let serial_number = reader.read_array().ok_or_else(short)?;
        let week_of_manufacture = reader.read_u8().ok_or_else(short)?;
        let year_of_manufacture = reader.read_u8().ok_or_else(short)?;
        let version = reader.read_u8().ok_or_else(short)?;
        let revision = reader.read_u8().ok_or_else(short)?;
        let basic_display_parameters = reader.read_array().ok_or_else(short)?;
        let chromaticity = reader.read_array().ok_or_else(short)?;
        let established_timings = reader.read_array().ok_or_else(short)?;

        let mut standard_timings = [[0u8; sizes::STANDARD_TIMING]; sizes::STANDARD_TIMING_COUNT];
        for entry in standard_timings.iter_mut() {
            *entry = reader.read_array().ok_or_else(short)?;
        }

        let mut descriptors = [[0u8; sizes::DESCRIPTOR]; sizes::DESCRIPTOR_COUNT];
        for slot in descriptors.iter_mut() {
            *slot = reader.read_array().ok_or_else(short)?;
        }

        let extension_flag = reader.read_u8().ok_or_else(short)?;
        let checksum = reader.read_u8().ok_or_else(short)?;

        let extension = if reader.remaining() == sizes::BLOCK {
            Some(reader.read_array().ok_or_else(short)?)
        } else {
            None
        };

        debug!(
            "decoded {} byte EDID (extension block {})",
            data.len(),
            if extension.is_some() { "present" } else { "absent" }
        );

        Ok(Edid {
            header,
            manufacturer_id,
            product_code,
            serial_number,
            week_of_manufacture,
            year_of_manufacture,
            version,
            revision,
            basic_display_parameters,
            chromaticity,
            established_timings,
            standard_timings,
            descriptors,
            extension_flag,
            checksum,
            extension,
        })
    }

    pub fn has_extension(&self) -> bool {
        self.extension.is_some()
    }

    pub fn header_valid(&self) -> bool {
        self.header == HEADER_PATTERN
    }

    /// True iff the stored checksum balances the base block
    pub fn validate_checksum(&self) -> bool {
        checksum::validate(&self.base_bytes())
    }

    pub fn manufacturer_id(&self) -> String {
        fields::decode_manufacturer_id(self.manufacturer_id)
    }

    pub fn product_code(&self) -> u16 {
        u16::from_le_bytes(self.product_code)
    }

    pub fn serial_number(&self) -> u32 {
        u32::from_le_bytes(self.serial_number)
    }

    pub fn descriptor(&self, slot: usize) -> Option<Descriptor> {
        self.descriptors.get(slot).map(descriptor::dispatch)
    }

    /// Slot currently holding a monitor-name descriptor, if any
    pub fn monitor_name_slot(&self) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|slot| matches!(descriptor::dispatch(slot), Descriptor::MonitorName { .. }))
    }

    pub fn monitor_name(&self) -> Option<String> {
        match self.descriptor(self.monitor_name_slot()?)? {
            Descriptor::MonitorName { text } => Some(text),
            _ => None,
        }
    }

    /// Interpret every field of the record, collecting non-fatal findings.
    pub fn parse(&self) -> Report {
        let mut findings = Vec::new();

        if !self.header_valid() {
            findings.push(Finding::at(
                FindingKind::HeaderMismatch,
                0,
                format!("fixed header is {:02X?}, expected {:02X?}", self.header, HEADER_PATTERN),
            ));
        }

        if !fields::manufacturer_id_in_range(self.manufacturer_id) {
            findings.push(Finding::at(
                FindingKind::ManufacturerOutOfRange,
                offsets::MANUFACTURER_ID,
                format!(
                    "manufacturer id {:02X} {:02X} decodes to {:?}, which is not three letters A-Z",
                    self.manufacturer_id[0],
                    self.manufacturer_id[1],
                    self.manufacturer_id()
                ),
            ));
        }

        let descriptors: Vec<Descriptor> = self.descriptors.iter().map(descriptor::dispatch).collect();
        for (index, descriptor) in descriptors.iter().enumerate() {
            if let Descriptor::Reserved { tag } = descriptor {
                findings.push(Finding::at(
                    FindingKind::UnknownTag,
                    offsets::DESCRIPTORS + index * sizes::DESCRIPTOR + 3,
                    format!("unknown descriptor tag 0x{tag:02x} in slot {index}"),
                ));
            }
        }

        let checksum_valid = self.validate_checksum();
        if !checksum_valid {
            findings.push(Finding::at(
                FindingKind::ChecksumMismatch,
                offsets::CHECKSUM,
                format!(
                    "checksum invalid: stored 0x{:02x}, expected 0x{:02x}",
                    self.checksum,
                    checksum::compute(&self.base_bytes()[..sizes::BLOCK - 1])
                ),
            ));
        }

        match (self.extension_flag, self.has_extension()) {
            (0, true) => findings.push(Finding::at(
                FindingKind::ExtensionFlagMismatch,
                offsets::EXTENSION_FLAG,
                "extension block present but extension flag is 0",
            )),
            (count, false) if count > 0 => findings.push(Finding::at(
                FindingKind::ExtensionFlagMismatch,
                offsets::EXTENSION_FLAG,
                format!("extension flag announces {count} block(s) but none is present"),
            )),
            _ => {}
        }

        let extension = self
            .extension
            .as_ref()
            .map(|block| extension::parse_extension(block, &mut findings));

        debug!("parse finished with {} finding(s)", findings.len());

        Report {
            header_valid: self.header_valid(),
            identification: Identification {
                manufacturer_id: self.manufacturer_id(),
                product_code: self.product_code(),
                serial_number: self.serial_number(),
                week_of_manufacture: self.week_of_manufacture,
                year_of_manufacture: fields::year_of_manufacture(self.year_of_manufacture),
                model_year: self.week_of_manufacture == MODEL_YEAR_WEEK,
                version: self.version,
                revision: self.revision,
            },
            basic_display: fields::basic_display_parameters(self.basic_display_parameters),
            chromaticity: fields::chromaticity(self.chromaticity),
            established_timings: fields::established_timings(self.established_timings),
            standard_timings: fields::standard_timings(&self.standard_timings),
            descriptors,
            extension_flag: self.extension_flag,
            checksum: self.checksum,
            checksum_valid,
            extension,
            findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_bad_size() {
        assert_eq!(Edid::decode(&[0u8; 100]), Err(EdidError::InvalidSize(100)));
        assert_eq!(Edid::decode(&[]), Err(EdidError::InvalidSize(0)));
        assert_eq!(Edid::decode(&[0u8; 384]), Err(EdidError::InvalidSize(384)));
    }

    #[test]
    fn test_decode_minimal_record() {
        let mut data = [0u8; 128];
        data[..8].copy_from_slice(&HEADER_PATTERN);
        data[127] = checksum::compute(&data[..127]);

        let edid = Edid::decode(&data).unwrap();
        assert!(edid.header_valid());
        assert!(edid.validate_checksum());
        assert!(!edid.has_extension());
        assert_eq!(edid.manufacturer_id(), "@@@");

        let report = edid.parse();
        assert!(report.checksum_valid);
        assert!(report.extension.is_none());
        // Zero manufacturer letters and all-zero descriptor slots are findings, not failures
        assert!(report.findings.iter().any(|f| f.kind == FindingKind::ManufacturerOutOfRange));
        assert!(!report.findings.iter().any(|f| f.kind == FindingKind::ChecksumMismatch));
    }

    #[test]
    fn test_decode_fields() {
        let edid = Edid::decode(&testdata::base_record()).unwrap();

        assert_eq!(edid.manufacturer_id(), "OPS");
        assert_eq!(edid.product_code(), 0x1080);
        assert_eq!(edid.serial_number(), 0x0102_0304);
        assert_eq!(edid.week_of_manufacture, 12);
        assert_eq!(edid.year_of_manufacture, 33);
        assert_eq!((edid.version, edid.revision), (1, 4));
        assert_eq!(edid.monitor_name_slot(), Some(1));
        assert_eq!(edid.monitor_name().as_deref(), Some("OPS-1080"));
        assert!(edid.validate_checksum());
    }

    #[test]
    fn test_parse_valid_record_has_no_findings() {
        let report = Edid::decode(&testdata::base_record()).unwrap().parse();

        assert!(report.findings.is_empty(), "unexpected findings: {:?}", report.findings);
        assert!(report.header_valid);
        assert_eq!(report.identification.year_of_manufacture, 2023);
        assert!(!report.identification.model_year);
        assert_eq!(report.standard_timings.len(), 2);
        assert_eq!(report.established_timings.timings.len(), 3);
        assert!(matches!(report.descriptors[0], Descriptor::DetailedTiming(_)));
        assert!(matches!(report.descriptors[2], Descriptor::RangeLimits(_)));
        assert!(matches!(report.descriptors[3], Descriptor::Dummy));
    }

    #[test]
    fn test_corrupted_checksum_is_a_finding() {
        let mut data = testdata::base_record();
        data[127] ^= 0xFF;

        let edid = Edid::decode(&data).unwrap();
        assert!(!edid.validate_checksum());

        let report = edid.parse();
        assert!(!report.checksum_valid);
        let mismatches: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.kind == FindingKind::ChecksumMismatch)
            .collect();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].offset, Some(offsets::CHECKSUM));
    }

    #[test]
    fn test_bad_header_is_a_finding() {
        let mut data = testdata::base_record();
        data[0] = 0x01;
        data[127] = checksum::compute(&data[..127]);

        let report = Edid::decode(&data).unwrap().parse();
        assert!(!report.header_valid);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, FindingKind::HeaderMismatch);
    }

    #[test]
    fn test_unknown_descriptor_tag_is_a_finding() {
        let mut data = testdata::base_record();
        // Slot 3 tag byte
        data[offsets::DESCRIPTORS + 3 * sizes::DESCRIPTOR + 3] = 0x42;
        data[127] = checksum::compute(&data[..127]);

        let report = Edid::decode(&data).unwrap().parse();
        assert_eq!(report.descriptors[3], Descriptor::Reserved { tag: 0x42 });
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, FindingKind::UnknownTag);
        assert_eq!(report.findings[0].offset, Some(0x36 + 54 + 3));
    }

    #[test]
    fn test_extension_flag_mismatch() {
        let mut data = testdata::base_record();
        data[offsets::EXTENSION_FLAG] = 1;
        data[127] = checksum::compute(&data[..127]);

        let report = Edid::decode(&data).unwrap().parse();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].kind, FindingKind::ExtensionFlagMismatch);
    }

    #[test]
    fn test_decode_extended_record() {
        let data = testdata::extended_record();
        let edid = Edid::decode(&data).unwrap();

        assert!(edid.has_extension());
        assert_eq!(edid.extension.as_ref().map(|b| &b[..]), Some(&data[128..]));

        let report = edid.parse();
        assert!(report.findings.is_empty(), "unexpected findings: {:?}", report.findings);
        let extension = report.extension.unwrap();
        assert_eq!(extension.blocks.len(), 2);
    }
}
