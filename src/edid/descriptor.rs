//! Display descriptor slots: detailed timings and tagged descriptors.

use serde::Serialize;

use super::fields::{self, StandardTiming};
use super::reader::DataReader;
use super::sizes;

/// Tag byte (offset 3) of a descriptor whose first two bytes are zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorTag {
    ManufacturerSpecific,
    MonitorSerial,
    Unspecified,
    RangeLimits,
    MonitorName,
    WhitePoint,
    StandardTimingId,
    ColorPoint,
    Cvt3Byte,
    AdditionalStandardTiming,
    Dummy,
    Reserved(u8),
}

impl DescriptorTag {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x0F => DescriptorTag::ManufacturerSpecific,
            0xFF => DescriptorTag::MonitorSerial,
            0xFE => DescriptorTag::Unspecified,
            0xFD => DescriptorTag::RangeLimits,
            0xFC => DescriptorTag::MonitorName,
            0xFB => DescriptorTag::WhitePoint,
            0xFA => DescriptorTag::StandardTimingId,
            0xF9 => DescriptorTag::ColorPoint,
            0xF8 => DescriptorTag::Cvt3Byte,
            0xF7 => DescriptorTag::AdditionalStandardTiming,
            0x10 => DescriptorTag::Dummy,
            other => DescriptorTag::Reserved(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            DescriptorTag::ManufacturerSpecific => 0x0F,
            DescriptorTag::MonitorSerial => 0xFF,
            DescriptorTag::Unspecified => 0xFE,
            DescriptorTag::RangeLimits => 0xFD,
            DescriptorTag::MonitorName => 0xFC,
            DescriptorTag::WhitePoint => 0xFB,
            DescriptorTag::StandardTimingId => 0xFA,
            DescriptorTag::ColorPoint => 0xF9,
            DescriptorTag::Cvt3Byte => 0xF8,
            DescriptorTag::AdditionalStandardTiming => 0xF7,
            DescriptorTag::Dummy => 0x10,
            DescriptorTag::Reserved(byte) => byte,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Descriptor {
    DetailedTiming(DetailedTiming),
    ManufacturerSpecific { text: String },
    MonitorSerial { text: String },
    Unspecified { text: String },
    RangeLimits(RangeLimits),
    MonitorName { text: String },
    WhitePoint,
    StandardTimingId { timings: Vec<StandardTiming> },
    ColorPoint,
    Cvt3Byte,
    AdditionalStandardTiming,
    Dummy,
    Reserved { tag: u8 },
}

impl Descriptor {
    pub fn title(&self) -> &'static str {
        match self {
            Descriptor::DetailedTiming(_) => "Detailed timing",
            Descriptor::ManufacturerSpecific { .. } => "Manufacturer specific",
            Descriptor::MonitorSerial { .. } => "Monitor serial number",
            Descriptor::Unspecified { .. } => "Unspecified",
            Descriptor::RangeLimits(_) => "Range limits",
            Descriptor::MonitorName { .. } => "Monitor name",
            Descriptor::WhitePoint => "White point data",
            Descriptor::StandardTimingId { .. } => "Standard timing identification",
            Descriptor::ColorPoint => "Color point data",
            Descriptor::Cvt3Byte => "CVT 3-byte code",
            Descriptor::AdditionalStandardTiming => "Additional standard timing",
            Descriptor::Dummy => "Dummy",
            Descriptor::Reserved { .. } => "Reserved",
        }
    }
}

/// Classify one 18-byte slot and decode it.
pub fn dispatch(slot: &[u8; sizes::DESCRIPTOR]) -> Descriptor {
    if slot[0] != 0 && slot[1] != 0 {
        return Descriptor::DetailedTiming(detailed_timing(slot));
    }

    match DescriptorTag::from_byte(slot[3]) {
        DescriptorTag::ManufacturerSpecific => Descriptor::ManufacturerSpecific { text: descriptor_text(slot) },
        DescriptorTag::MonitorSerial => Descriptor::MonitorSerial { text: descriptor_text(slot) },
        DescriptorTag::Unspecified => Descriptor::Unspecified { text: descriptor_text(slot) },
        DescriptorTag::RangeLimits => Descriptor::RangeLimits(range_limits(slot)),
        DescriptorTag::MonitorName => Descriptor::MonitorName { text: descriptor_text(slot) },
        DescriptorTag::WhitePoint => Descriptor::WhitePoint,
        DescriptorTag::StandardTimingId => Descriptor::StandardTimingId { timings: standard_timing_ids(slot) },
        DescriptorTag::ColorPoint => Descriptor::ColorPoint,
        DescriptorTag::Cvt3Byte => Descriptor::Cvt3Byte,
        DescriptorTag::AdditionalStandardTiming => Descriptor::AdditionalStandardTiming,
        DescriptorTag::Dummy => Descriptor::Dummy,
        DescriptorTag::Reserved(tag) => Descriptor::Reserved { tag },
    }
}

/// Text payload of bytes 5..18: up to the first newline, trailing padding removed
pub fn descriptor_text(slot: &[u8; sizes::DESCRIPTOR]) -> String {
    let payload = &slot[sizes::DESCRIPTOR_TEXT_START..];
    let end = payload.iter().position(|&b| b == b'\n').unwrap_or(payload.len());

    payload[..end]
        .iter()
        .map(|&b| char::from(b))
        .collect::<String>()
        .trim_end_matches([' ', '\0'])
        .to_string()
}

fn standard_timing_ids(slot: &[u8; sizes::DESCRIPTOR]) -> Vec<StandardTiming> {
    slot[5..17]
        .chunks_exact(2)
        .enumerate()
        .filter_map(|(index, entry)| fields::standard_timing(index, [entry[0], entry[1]]))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StereoMode {
    None,
    FieldSequentialRight,
    TwoWayInterleavedRight,
    FieldSequentialLeft,
    TwoWayInterleavedLeft,
    FourWayInterleaved,
    SideBySideInterleaved,
}

impl StereoMode {
    // Bits 6..5 of the flags byte, extended by bit 0
    fn from_flags(flags: u8) -> Self {
        match ((flags & 0x60) >> 4) | (flags & 0x01) {
            0x00 | 0x01 => StereoMode::None,
            0x02 => StereoMode::FieldSequentialRight,
            0x03 => StereoMode::TwoWayInterleavedRight,
            0x04 => StereoMode::FieldSequentialLeft,
            0x05 => StereoMode::TwoWayInterleavedLeft,
            0x06 => StereoMode::FourWayInterleaved,
            _ => StereoMode::SideBySideInterleaved,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StereoMode::None => "No stereo",
            StereoMode::FieldSequentialRight => "Field sequential stereo, right image when stereo sync signal is high",
            StereoMode::TwoWayInterleavedRight => "Two way interleaved stereo, right image on even lines",
            StereoMode::FieldSequentialLeft => "Field sequential stereo, left image when stereo sync signal is high",
            StereoMode::TwoWayInterleavedLeft => "Two way interleaved stereo, left image on even lines",
            StereoMode::FourWayInterleaved => "Four way interleaved stereo",
            StereoMode::SideBySideInterleaved => "Side by side interleaved stereo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncType {
    Analog {
        bipolar: bool,
        serrated: bool,
        /// Sync on all three RGB signals rather than green only
        sync_on_rgb: bool,
    },
    DigitalComposite {
        serrated: bool,
        hsync_positive: bool,
    },
    DigitalSeparate {
        vsync_positive: bool,
        hsync_positive: bool,
    },
}

mod flags {
    pub const INTERLACED: u8 = 0x80;
    pub const DIGITAL_SYNC: u8 = 0x10;
    pub const ANALOG_BIPOLAR: u8 = 0x08;
    pub const DIGITAL_SEPARATE: u8 = 0x08;
    pub const SERRATION: u8 = 0x04;
    pub const VSYNC_POSITIVE: u8 = 0x04;
    pub const SYNC_ON_RGB: u8 = 0x02;
    pub const HSYNC_POSITIVE: u8 = 0x02;
}

impl SyncType {
    fn from_flags(f: u8) -> Self {
        if f & flags::DIGITAL_SYNC == 0 {
            SyncType::Analog {
                bipolar: f & flags::ANALOG_BIPOLAR != 0,
                serrated: f & flags::SERRATION != 0,
                sync_on_rgb: f & flags::SYNC_ON_RGB != 0,
            }
        } else if f & flags::DIGITAL_SEPARATE == 0 {
            SyncType::DigitalComposite {
                serrated: f & flags::SERRATION != 0,
                hsync_positive: f & flags::HSYNC_POSITIVE != 0,
            }
        } else {
            SyncType::DigitalSeparate {
                vsync_positive: f & flags::VSYNC_POSITIVE != 0,
                hsync_positive: f & flags::HSYNC_POSITIVE != 0,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimingFeatures {
    pub interlaced: bool,
    pub stereo: StereoMode,
    pub sync: SyncType,
}

pub fn timing_features(byte: u8) -> TimingFeatures {
    TimingFeatures {
        interlaced: byte & flags::INTERLACED != 0,
        stereo: StereoMode::from_flags(byte),
        sync: SyncType::from_flags(byte),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetailedTiming {
    pub pixel_clock_mhz: f64,
    pub h_active: u16,
    pub h_blanking: u16,
    pub v_active: u16,
    pub v_blanking: u16,
    pub h_front_porch: u16,
    pub h_sync_pulse: u16,
    pub v_front_porch: u16,
    pub v_sync_pulse: u16,
    pub h_image_size_mm: u16,
    pub v_image_size_mm: u16,
    pub h_border: u8,
    pub v_border: u8,
    pub features: TimingFeatures,
}

impl DetailedTiming {
    pub fn h_total(&self) -> u32 {
        u32::from(self.h_active) + u32::from(self.h_blanking)
    }

    pub fn v_total(&self) -> u32 {
        u32::from(self.v_active) + u32::from(self.v_blanking)
    }

    /// Vertical refresh in Hz, 0 when the totals are degenerate
    pub fn refresh_rate(&self) -> f64 {
        let pixels = f64::from(self.h_total()) * f64::from(self.v_total());
        if pixels == 0.0 {
            0.0
        } else {
            self.pixel_clock_mhz * 1_000_000.0 / pixels
        }
    }
}

fn high_nibble(byte: u8) -> u16 {
    u16::from(byte & 0xF0) << 4
}

fn low_nibble(byte: u8) -> u16 {
    u16::from(byte & 0x0F) << 8
}

pub fn detailed_timing(dd: &[u8; sizes::DESCRIPTOR]) -> DetailedTiming {
    let pixel_clock = u16::from_le_bytes([dd[0], dd[1]]);
    let h_msb = dd[4];
    let v_msb = dd[7];
    let porch_msb = dd[11];
    let size_msb = dd[14];

    DetailedTiming {
        pixel_clock_mhz: f64::from(pixel_clock) / 100.0,
        h_active: high_nibble(h_msb) | u16::from(dd[2]),
        h_blanking: low_nibble(h_msb) | u16::from(dd[3]),
        v_active: high_nibble(v_msb) | u16::from(dd[5]),
        v_blanking: low_nibble(v_msb) | u16::from(dd[6]),
        h_front_porch: (u16::from(porch_msb & 0xC0) << 2) | u16::from(dd[8]),
        h_sync_pulse: (u16::from(porch_msb & 0x30) << 4) | u16::from(dd[9]),
        v_front_porch: (u16::from(porch_msb & 0x0C) << 2) | u16::from((dd[10] & 0xF0) >> 4),
        v_sync_pulse: (u16::from(porch_msb & 0x03) << 4) | u16::from(dd[10] & 0x0F),
        h_image_size_mm: high_nibble(size_msb) | u16::from(dd[12]),
        v_image_size_mm: low_nibble(size_msb) | u16::from(dd[13]),
        h_border: dd[15],
        v_border: dd[16],
        features: timing_features(dd[17]),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedTimingType {
    DefaultGtf,
    NoTimingInformation,
    SecondaryGtf,
    Cvt,
    Reserved,
}

impl ExtendedTimingType {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => ExtendedTimingType::DefaultGtf,
            0x01 => ExtendedTimingType::NoTimingInformation,
            0x02 => ExtendedTimingType::SecondaryGtf,
            0x03 => ExtendedTimingType::Cvt,
            _ => ExtendedTimingType::Reserved,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExtendedTimingType::DefaultGtf => "Default GTF",
            ExtendedTimingType::NoTimingInformation => "No timing information",
            ExtendedTimingType::SecondaryGtf => "Secondary GTF supported",
            ExtendedTimingType::Cvt => "CVT supported",
            ExtendedTimingType::Reserved => "Reserved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeLimits {
    pub min_vertical_hz: u16,
    pub max_vertical_hz: u16,
    pub min_horizontal_khz: u16,
    pub max_horizontal_khz: u16,
    pub max_pixel_clock_mhz: u16,
    pub timing_type: ExtendedTimingType,
    pub video_timing_parameters: [u8; 7],
}

const RATE_OFFSET: u16 = 255;

// 0b10 extends only the maximum, 0b11 both limits
fn apply_rate_offset(offset: u8, min: u8, max: u8) -> (u16, u16) {
    let (min, max) = (u16::from(min), u16::from(max));
    match offset {
        0x03 => (min + RATE_OFFSET, max + RATE_OFFSET),
        0x02 => (min, max + RATE_OFFSET),
        _ => (min, max),
    }
}

pub fn range_limits(drd: &[u8; sizes::DESCRIPTOR]) -> RangeLimits {
    let mut reader = DataReader::new(drd, 4);
    let offsets = reader.read_u8().unwrap_or_default();
    let [v_min, v_max, h_min, h_max, clock, timing] = reader.read_array::<6>().unwrap_or_default();
    let video_timing_parameters = reader.read_array::<7>().unwrap_or_default();

    let (min_vertical_hz, max_vertical_hz) = apply_rate_offset(offsets & 0x03, v_min, v_max);
    let (min_horizontal_khz, max_horizontal_khz) = apply_rate_offset((offsets & 0x0C) >> 2, h_min, h_max);

    RangeLimits {
        min_vertical_hz,
        max_vertical_hz,
        min_horizontal_khz,
        max_horizontal_khz,
        max_pixel_clock_mhz: u16::from(clock) * 10,
        timing_type: ExtendedTimingType::from_byte(timing),
        video_timing_parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edid::testdata;

    #[test]
    fn test_detailed_timing_1080p() {
        let descriptor = dispatch(&testdata::DTD_1080P);
        let Descriptor::DetailedTiming(dtd) = &descriptor else {
            panic!("expected a detailed timing, got {descriptor:?}");
        };

        assert_eq!(dtd.pixel_clock_mhz, 148.5);
        assert_eq!((dtd.h_active, dtd.h_blanking), (1920, 280));
        assert_eq!((dtd.v_active, dtd.v_blanking), (1080, 45));
        assert_eq!((dtd.h_front_porch, dtd.h_sync_pulse), (88, 44));
        assert_eq!((dtd.v_front_porch, dtd.v_sync_pulse), (4, 5));
        assert_eq!((dtd.h_image_size_mm, dtd.v_image_size_mm), (531, 299));
        assert_eq!((dtd.h_border, dtd.v_border), (0, 0));
        assert!((dtd.refresh_rate() - 60.0).abs() < 1e-9);

        assert!(!dtd.features.interlaced);
        assert_eq!(dtd.features.stereo, StereoMode::None);
        assert_eq!(
            dtd.features.sync,
            SyncType::DigitalSeparate { vsync_positive: true, hsync_positive: true }
        );
    }

    #[test]
    fn test_timing_features_variants() {
        let analog = timing_features(0x0A);
        assert_eq!(analog.sync, SyncType::Analog { bipolar: true, serrated: false, sync_on_rgb: true });

        let composite = timing_features(0x96);
        assert!(composite.interlaced);
        assert_eq!(composite.sync, SyncType::DigitalComposite { serrated: true, hsync_positive: true });

        assert_eq!(timing_features(0x20).stereo, StereoMode::FieldSequentialRight);
        assert_eq!(timing_features(0x41).stereo, StereoMode::TwoWayInterleavedLeft);
        assert_eq!(timing_features(0x61).stereo, StereoMode::SideBySideInterleaved);
    }

    #[test]
    fn test_range_limits() {
        let Descriptor::RangeLimits(limits) = dispatch(&testdata::RANGE_LIMITS) else {
            panic!("expected range limits");
        };

        assert_eq!((limits.min_vertical_hz, limits.max_vertical_hz), (48, 75));
        assert_eq!((limits.min_horizontal_khz, limits.max_horizontal_khz), (30, 83));
        assert_eq!(limits.max_pixel_clock_mhz, 170);
        assert_eq!(limits.timing_type, ExtendedTimingType::NoTimingInformation);
        assert_eq!(limits.video_timing_parameters, [0x0A, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20]);
    }

    #[test]
    fn test_range_limit_rate_offsets() {
        let mut drd = testdata::RANGE_LIMITS;
        // Vertical: max only. Horizontal: both.
        drd[4] = 0b0000_1110;
        drd[10] = 0x07;
        let limits = range_limits(&drd);

        assert_eq!((limits.min_vertical_hz, limits.max_vertical_hz), (48, 330));
        assert_eq!((limits.min_horizontal_khz, limits.max_horizontal_khz), (285, 338));
        assert_eq!(limits.timing_type, ExtendedTimingType::Reserved);
    }

    #[test]
    fn test_text_descriptors() {
        assert_eq!(
            dispatch(&testdata::NAME_DESCRIPTOR),
            Descriptor::MonitorName { text: "OPS-1080".to_string() }
        );

        let mut serial = [0x20u8; 18];
        serial[..5].copy_from_slice(&[0x00, 0x00, 0x00, 0xFF, 0x00]);
        serial[5..13].copy_from_slice(b"SN012345");
        serial[13] = b'\n';
        assert_eq!(dispatch(&serial), Descriptor::MonitorSerial { text: "SN012345".to_string() });
    }

    #[test]
    fn test_only_first_two_bytes_select_detailed_timing() {
        // A single zero byte in the clock field means a tagged descriptor
        let mut slot = [0u8; 18];
        slot[0] = 0x01;
        slot[3] = 0x10;
        assert_eq!(dispatch(&slot), Descriptor::Dummy);
    }

    #[test]
    fn test_unknown_tag_is_reserved() {
        let mut slot = [0u8; 18];
        slot[3] = 0x42;
        let descriptor = dispatch(&slot);

        assert_eq!(descriptor, Descriptor::Reserved { tag: 0x42 });
        assert_eq!(descriptor.title(), "Reserved");
        assert_eq!(DescriptorTag::from_byte(0x42).as_byte(), 0x42);
    }

    #[test]
    fn test_standard_timing_identification() {
        let mut slot = [0u8; 18];
        slot[3] = 0xFA;
        slot[5..17].copy_from_slice(&[0xD1, 0xC0, 0x01, 0x01, 0x81, 0x80, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01]);
        slot[17] = 0x0A;

        let Descriptor::StandardTimingId { timings } = dispatch(&slot) else {
            panic!("expected standard timing identification");
        };
        assert_eq!(timings.len(), 2);
        assert_eq!((timings[0].horizontal, timings[0].vertical), (1920, 1080));
        assert_eq!(timings[1].index, 2);
    }
}
