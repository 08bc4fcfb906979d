//! Field mutation and re-encoding of the base block.

use log::{debug, info};

use super::descriptor::DescriptorTag;
use super::{Edid, EdidError, checksum, sizes};

const MANUFACTURER_LETTER_BASE: u8 = 0x40;

/// Slot the monitor name goes to when the record has none yet
pub const DEFAULT_NAME_SLOT: usize = 2;

/// Pack three uppercase ASCII letters into the 2-byte manufacturer id.
pub fn encode_manufacturer_id(id: &str) -> Result<[u8; sizes::MANUFACTURER_ID], EdidError> {
    let letters: Vec<char> = id.chars().collect();
    if letters.len() != 3 {
        return Err(EdidError::InvalidManufacturerLength(letters.len()));
    }

    let mut values = [0u8; 3];
    for (value, &letter) in values.iter_mut().zip(&letters) {
        if !letter.is_ascii_uppercase() {
            return Err(EdidError::InvalidLetter(letter));
        }
        *value = letter as u8 - MANUFACTURER_LETTER_BASE;
    }

    Ok([(values[0] << 2) | (values[1] >> 3), (values[1] << 5) | values[2]])
}

pub fn serial_number_bytes(serial: u32) -> [u8; sizes::SERIAL_NUMBER] {
    serial.to_le_bytes()
}

/// Build a monitor-name descriptor.
///
/// The text is left-justified at byte 5 and byte 17 is always the `0x0A`
/// terminator, so a full 13-byte name keeps only its first 12 bytes.
pub fn build_name_descriptor(name: &str) -> Result<[u8; sizes::DESCRIPTOR], EdidError> {
    if !name.is_ascii() {
        return Err(EdidError::NonAsciiName);
    }
    if name.len() > sizes::DESCRIPTOR_TEXT {
        return Err(EdidError::NameTooLong(name.len()));
    }

    let mut descriptor = [0u8; sizes::DESCRIPTOR];
    descriptor[3] = DescriptorTag::MonitorName.as_byte();
    descriptor[sizes::DESCRIPTOR_TEXT_START..sizes::DESCRIPTOR_TEXT_START + name.len()]
        .copy_from_slice(name.as_bytes());
    descriptor[sizes::DESCRIPTOR - 1] = b'\n';
    Ok(descriptor)
}

impl Edid {
    // Base block fields in layout order, without the checksum
    fn layout(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(sizes::BLOCK);
        data.extend_from_slice(&self.header);
        data.extend_from_slice(&self.manufacturer_id);
        data.extend_from_slice(&self.product_code);
        data.extend_from_slice(&self.serial_number);
        data.push(self.week_of_manufacture);
        data.push(self.year_of_manufacture);
        data.push(self.version);
        data.push(self.revision);
        data.extend_from_slice(&self.basic_display_parameters);
        data.extend_from_slice(&self.chromaticity);
        data.extend_from_slice(&self.established_timings);
        for entry in &self.standard_timings {
            data.extend_from_slice(entry);
        }
        for slot in &self.descriptors {
            data.extend_from_slice(slot);
        }
        data.push(self.extension_flag);
        data
    }

    /// The base block exactly as stored, including the stored checksum
    pub fn base_bytes(&self) -> Vec<u8> {
        let mut data = self.layout();
        data.push(self.checksum);
        data
    }

    /// Serialize the base block with a freshly computed checksum.
    ///
    /// Always 128 bytes; the extension flag byte is written as stored.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = self.layout();
        data.push(checksum::compute(&data));
        data
    }

    /// Like [`Edid::encode`], followed by the untouched extension block if any
    pub fn encode_with_extension(&self) -> Vec<u8> {
        let mut data = self.encode();
        if let Some(extension) = &self.extension {
            data.extend_from_slice(extension);
        }
        data
    }

    pub fn set_serial_number(&mut self, serial: u32) {
        debug!("serial number {} -> {serial}", self.serial_number());
        self.serial_number = serial_number_bytes(serial);
    }

    pub fn set_manufacturer_id(&mut self, id: &str) -> Result<(), EdidError> {
        let bytes = encode_manufacturer_id(id)?;
        debug!("manufacturer id {} -> {id}", self.manufacturer_id());
        self.manufacturer_id = bytes;
        Ok(())
    }

    pub fn set_descriptor(&mut self, slot: usize, descriptor: [u8; sizes::DESCRIPTOR]) -> Result<(), EdidError> {
        let target = self
            .descriptors
            .get_mut(slot)
            .ok_or(EdidError::InvalidDescriptorSlot(slot))?;
        *target = descriptor;
        Ok(())
    }

    /// Install a monitor-name descriptor and return the slot it went to.
    ///
    /// Without an explicit slot the existing name slot is replaced, or
    /// [`DEFAULT_NAME_SLOT`] when the record has no name yet.
    pub fn set_display_name(&mut self, name: &str, slot: Option<usize>) -> Result<usize, EdidError> {
        let descriptor = build_name_descriptor(name)?;
        let slot = slot
            .or_else(|| self.monitor_name_slot())
            .unwrap_or(DEFAULT_NAME_SLOT);
        self.set_descriptor(slot, descriptor)?;
        info!("display name {name:?} installed in descriptor slot {slot}");
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edid::{Descriptor, FindingKind, fields, offsets, testdata};

    fn sum(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
    }

    #[test]
    fn test_round_trip_base_record() {
        let data = testdata::base_record();
        let edid = Edid::decode(&data).unwrap();

        assert_eq!(edid.encode(), data.to_vec());
        assert_eq!(edid.base_bytes(), data.to_vec());
    }

    #[test]
    fn test_round_trip_minimal_record() {
        let mut data = [0u8; 128];
        data[..8].copy_from_slice(&crate::edid::HEADER_PATTERN);
        data[127] = checksum::compute(&data[..127]);

        assert_eq!(Edid::decode(&data).unwrap().encode(), data.to_vec());
    }

    #[test]
    fn test_encode_repairs_checksum() {
        let mut data = testdata::base_record();
        data[127] = data[127].wrapping_add(7);

        let encoded = Edid::decode(&data).unwrap().encode();
        assert_eq!(encoded.len(), 128);
        assert_eq!(sum(&encoded), 0);
        assert_eq!(encoded[..127], data[..127]);
    }

    #[test]
    fn test_extension_policy() {
        let data = testdata::extended_record();
        let edid = Edid::decode(&data).unwrap();

        let base = edid.encode();
        assert_eq!(base.len(), 128);
        assert_eq!(base, data[..128].to_vec());
        assert_eq!(edid.encode_with_extension(), data);

        let plain = Edid::decode(&testdata::base_record()).unwrap();
        assert_eq!(plain.encode_with_extension().len(), 128);
    }

    #[test]
    fn test_serial_number_mutation() {
        let mut edid = Edid::decode(&testdata::base_record()).unwrap();
        edid.set_serial_number(0x1234_5678);
        let encoded = edid.encode();

        assert_eq!(&encoded[offsets::SERIAL_NUMBER..offsets::SERIAL_NUMBER + 4], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(sum(&encoded[..127]).wrapping_add(encoded[127]), 0);

        let reparsed = Edid::decode(&encoded).unwrap();
        assert_eq!(reparsed.serial_number(), 0x1234_5678);
        assert!(reparsed.validate_checksum());
    }

    #[test]
    fn test_manufacturer_id_encode() {
        assert_eq!(encode_manufacturer_id("OPS"), Ok([0x3E, 0x13]));
        assert_eq!(encode_manufacturer_id("DEL"), Ok([0x10, 0xAC]));
        assert_eq!(encode_manufacturer_id("AAA"), Ok([0x04, 0x21]));
        assert_eq!(encode_manufacturer_id("ZZZ"), Ok([0x6B, 0x5A]));
    }

    #[test]
    fn test_manufacturer_id_inverse_for_all_ids() {
        for a in b'A'..=b'Z' {
            for b in b'A'..=b'Z' {
                for c in b'A'..=b'Z' {
                    let id: String = [a, b, c].iter().map(|&x| char::from(x)).collect();
                    let bytes = encode_manufacturer_id(&id).unwrap();
                    assert_eq!(fields::decode_manufacturer_id(bytes), id);
                    assert!(fields::manufacturer_id_in_range(bytes));
                }
            }
        }
    }

    #[test]
    fn test_manufacturer_id_rejects_bad_input() {
        assert_eq!(encode_manufacturer_id("oPS"), Err(EdidError::InvalidLetter('o')));
        assert_eq!(encode_manufacturer_id("O@S"), Err(EdidError::InvalidLetter('@')));
        assert_eq!(encode_manufacturer_id("OP"), Err(EdidError::InvalidManufacturerLength(2)));
        assert_eq!(encode_manufacturer_id("OPSX"), Err(EdidError::InvalidManufacturerLength(4)));
        assert_eq!(encode_manufacturer_id("ÖPS"), Err(EdidError::InvalidLetter('Ö')));
    }

    #[test]
    fn test_set_manufacturer_id_failure_leaves_record_untouched() {
        let mut edid = Edid::decode(&testdata::base_record()).unwrap();
        assert!(edid.set_manufacturer_id("a1b").is_err());
        assert_eq!(edid.manufacturer_id(), "OPS");

        edid.set_manufacturer_id("XYZ").unwrap();
        assert_eq!(Edid::decode(&edid.encode()).unwrap().manufacturer_id(), "XYZ");
    }

    #[test]
    fn test_name_descriptor_layout() {
        let descriptor = build_name_descriptor("OPS").unwrap();

        assert_eq!(&descriptor[..5], &[0x00, 0x00, 0x00, 0xFC, 0x00]);
        assert_eq!(&descriptor[5..8], b"OPS");
        assert!(descriptor[8..17].iter().all(|&b| b == 0));
        assert_eq!(descriptor[17], b'\n');
        assert_eq!(crate::edid::descriptor::dispatch(&descriptor), Descriptor::MonitorName { text: "OPS".into() });
    }

    #[test]
    fn test_name_descriptor_terminator_overwrites_thirteenth_byte() {
        let descriptor = build_name_descriptor("ABCDEFGHIJKLM").unwrap();

        assert_eq!(&descriptor[5..17], b"ABCDEFGHIJKL");
        assert_eq!(descriptor[17], b'\n');
    }

    #[test]
    fn test_name_descriptor_rejects_bad_names() {
        assert_eq!(build_name_descriptor("ABCDEFGHIJKLMN"), Err(EdidError::NameTooLong(14)));
        assert_eq!(build_name_descriptor("Écran"), Err(EdidError::NonAsciiName));
        assert!(build_name_descriptor("").is_ok());
    }

    #[test]
    fn test_set_display_name_replaces_existing_name_slot() {
        let mut edid = Edid::decode(&testdata::base_record()).unwrap();
        let slot = edid.set_display_name("Studio", None).unwrap();

        assert_eq!(slot, 1);
        let report = Edid::decode(&edid.encode()).unwrap().parse();
        assert_eq!(report.descriptors[1], Descriptor::MonitorName { text: "Studio".into() });
        assert!(report.checksum_valid);
        assert!(!report.findings.iter().any(|f| f.kind == FindingKind::ChecksumMismatch));
    }

    #[test]
    fn test_set_display_name_defaults_to_slot_two() {
        let mut data = testdata::base_record();
        // Turn the name slot into a dummy descriptor
        data[72 + 3] = 0x10;
        data[127] = checksum::compute(&data[..127]);
        let mut edid = Edid::decode(&data).unwrap();
        assert_eq!(edid.monitor_name_slot(), None);

        assert_eq!(edid.set_display_name("Left", None), Ok(DEFAULT_NAME_SLOT));
        assert_eq!(edid.monitor_name().as_deref(), Some("Left"));

        assert_eq!(edid.set_display_name("Right", Some(3)), Ok(3));
        assert_eq!(edid.set_display_name("Nope", Some(4)), Err(EdidError::InvalidDescriptorSlot(4)));
    }
}
