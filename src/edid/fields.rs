//! Interpreters for the fixed fields of the base EDID block.
//!
//! Every function here is pure: it takes the raw bytes of one field and
//! returns a typed description. Values outside the defined ranges map to
//! `Reserved`/`Undefined` variants rather than failing.

use serde::Serialize;
use std::fmt;

const MANUFACTURER_LETTER_BASE: u8 = 0x40;
const YEAR_BASE: u16 = 1990;

/// Decode the three 5-bit letters packed into the manufacturer id.
///
/// Each letter is `0x40 + value`, so a value of 0 decodes to `'@'`.
pub fn decode_manufacturer_id(bytes: [u8; 2]) -> String {
    manufacturer_letter_values(bytes)
        .iter()
        .map(|&v| char::from(MANUFACTURER_LETTER_BASE + v))
        .collect()
}

/// True when all three packed letters fall in `A..=Z`.
pub fn manufacturer_id_in_range(bytes: [u8; 2]) -> bool {
    manufacturer_letter_values(bytes).iter().all(|&v| (1..=26).contains(&v))
}

fn manufacturer_letter_values(bytes: [u8; 2]) -> [u8; 3] {
    [
        (bytes[0] >> 2) & 0x1F,
        ((bytes[0] & 0x03) << 3) | ((bytes[1] & 0xE0) >> 5),
        bytes[1] & 0x1F,
    ]
}

pub fn year_of_manufacture(byte: u8) -> u16 {
    u16::from(byte) + YEAR_BASE
}

pub fn gamma(byte: u8) -> f64 {
    (f64::from(byte) + 100.0) / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BitDepth {
    Undefined,
    Bits6,
    Bits8,
    Bits10,
    Bits12,
    Bits14,
    Bits16,
    Reserved,
}

impl BitDepth {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0x00 => BitDepth::Undefined,
            0x01 => BitDepth::Bits6,
            0x02 => BitDepth::Bits8,
            0x03 => BitDepth::Bits10,
            0x04 => BitDepth::Bits12,
            0x05 => BitDepth::Bits14,
            0x06 => BitDepth::Bits16,
            _ => BitDepth::Reserved,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BitDepth::Undefined => "Undefined",
            BitDepth::Bits6 => "6 bits per color",
            BitDepth::Bits8 => "8 bits per color",
            BitDepth::Bits10 => "10 bits per color",
            BitDepth::Bits12 => "12 bits per color",
            BitDepth::Bits14 => "14 bits per color",
            BitDepth::Bits16 => "16 bits per color",
            BitDepth::Reserved => "Reserved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoInterface {
    Undefined,
    Dvi,
    HdmiA,
    HdmiB,
    Mddi,
    DisplayPort,
    Reserved,
}

impl VideoInterface {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0x00 => VideoInterface::Undefined,
            0x01 => VideoInterface::Dvi,
            0x02 => VideoInterface::HdmiA,
            0x03 => VideoInterface::HdmiB,
            0x04 => VideoInterface::Mddi,
            0x05 => VideoInterface::DisplayPort,
            _ => VideoInterface::Reserved,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VideoInterface::Undefined => "Undefined",
            VideoInterface::Dvi => "DVI",
            VideoInterface::HdmiA => "HDMI-a",
            VideoInterface::HdmiB => "HDMI-b",
            VideoInterface::Mddi => "MDDI",
            VideoInterface::DisplayPort => "DisplayPort",
            VideoInterface::Reserved => "Reserved",
        }
    }
}

/// Analog video white and sync levels, relative to blank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    P700N300,
    P714N286,
    P1000N400,
    P700N0,
}

impl SignalLevel {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => SignalLevel::P700N300,
            0x01 => SignalLevel::P714N286,
            0x02 => SignalLevel::P1000N400,
            _ => SignalLevel::P700N0,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SignalLevel::P700N300 => "0.7/0.3 V",
            SignalLevel::P714N286 => "0.714/0.286 V",
            SignalLevel::P1000N400 => "1.0/0.4 V",
            SignalLevel::P700N0 => "0.7/0.0 V",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VideoInput {
    Analog {
        signal_level: SignalLevel,
        blank_to_black_setup: bool,
        separate_sync: bool,
        composite_sync: bool,
        sync_on_green: bool,
        vsync_serrated: bool,
    },
    Digital {
        bit_depth: BitDepth,
        interface: VideoInterface,
    },
}

impl VideoInput {
    pub fn is_digital(&self) -> bool {
        matches!(self, VideoInput::Digital { .. })
    }
}

mod bdp {
    pub const DIGITAL_INPUT: u8 = 0x80;
    pub const BIT_DEPTH: u8 = 0x70;
    pub const VIDEO_INTERFACE: u8 = 0x0F;
    pub const WHITE_AND_SYNC_LEVELS: u8 = 0x60;
    pub const BLANK_TO_BLACK_SETUP: u8 = 0x10;
    pub const SEPARATE_SYNC: u8 = 0x08;
    pub const COMPOSITE_SYNC: u8 = 0x04;
    pub const SYNC_ON_GREEN: u8 = 0x02;
    pub const VSYNC_SERRATED: u8 = 0x01;

    pub const DPMS_STANDBY: u8 = 0x80;
    pub const DPMS_SUSPEND: u8 = 0x40;
    pub const DPMS_ACTIVE_OFF: u8 = 0x20;
    pub const COLOR_TYPE: u8 = 0x18;
    pub const SRGB_DEFAULT: u8 = 0x04;
    pub const PREFERRED_TIMING: u8 = 0x02;
    pub const CONTINUOUS_FREQUENCY: u8 = 0x01;
}

pub fn video_input(byte: u8) -> VideoInput {
    if byte & bdp::DIGITAL_INPUT != 0 {
        VideoInput::Digital {
            bit_depth: BitDepth::from_bits((byte & bdp::BIT_DEPTH) >> 4),
            interface: VideoInterface::from_bits(byte & bdp::VIDEO_INTERFACE),
        }
    } else {
        VideoInput::Analog {
            signal_level: SignalLevel::from_bits((byte & bdp::WHITE_AND_SYNC_LEVELS) >> 5),
            blank_to_black_setup: byte & bdp::BLANK_TO_BLACK_SETUP != 0,
            separate_sync: byte & bdp::SEPARATE_SYNC != 0,
            composite_sync: byte & bdp::COMPOSITE_SYNC != 0,
            sync_on_green: byte & bdp::SYNC_ON_GREEN != 0,
            vsync_serrated: byte & bdp::VSYNC_SERRATED != 0,
        }
    }
}

/// Colour encoding support; the meaning of the two bits depends on the input type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayColorType {
    Rgb444,
    Rgb444YCrCb444,
    Rgb444YCrCb422,
    Rgb444YCrCb444YCrCb422,
    Monochrome,
    RgbColor,
    NonRgbColor,
    Undefined,
}

impl DisplayColorType {
    fn from_bits(bits: u8, digital: bool) -> Self {
        match (digital, bits & 0x03) {
            (true, 0x00) => DisplayColorType::Rgb444,
            (true, 0x01) => DisplayColorType::Rgb444YCrCb444,
            (true, 0x02) => DisplayColorType::Rgb444YCrCb422,
            (true, _) => DisplayColorType::Rgb444YCrCb444YCrCb422,
            (false, 0x00) => DisplayColorType::Monochrome,
            (false, 0x01) => DisplayColorType::RgbColor,
            (false, 0x02) => DisplayColorType::NonRgbColor,
            (false, _) => DisplayColorType::Undefined,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DisplayColorType::Rgb444 => "RGB 4:4:4",
            DisplayColorType::Rgb444YCrCb444 => "RGB 4:4:4 + YCrCb 4:4:4",
            DisplayColorType::Rgb444YCrCb422 => "RGB 4:4:4 + YCrCb 4:2:2",
            DisplayColorType::Rgb444YCrCb444YCrCb422 => "RGB 4:4:4 + YCrCb 4:4:4 + YCrCb 4:2:2",
            DisplayColorType::Monochrome => "Monochrome/Grayscale",
            DisplayColorType::RgbColor => "RGB color",
            DisplayColorType::NonRgbColor => "Non-RGB color",
            DisplayColorType::Undefined => "Undefined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedFeatures {
    pub dpms_standby: bool,
    pub dpms_suspend: bool,
    pub dpms_active_off: bool,
    pub color_type: DisplayColorType,
    pub srgb_default: bool,
    pub preferred_timing_native: bool,
    pub continuous_frequency: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BasicDisplayParameters {
    pub video_input: VideoInput,
    pub max_horizontal_size_cm: u8,
    pub max_vertical_size_cm: u8,
    pub gamma: f64,
    pub features: SupportedFeatures,
}

pub fn basic_display_parameters(bdp_bytes: [u8; 5]) -> BasicDisplayParameters {
    let video_input = video_input(bdp_bytes[0]);
    let features = bdp_bytes[4];

    BasicDisplayParameters {
        video_input,
        max_horizontal_size_cm: bdp_bytes[1],
        max_vertical_size_cm: bdp_bytes[2],
        gamma: gamma(bdp_bytes[3]),
        features: SupportedFeatures {
            dpms_standby: features & bdp::DPMS_STANDBY != 0,
            dpms_suspend: features & bdp::DPMS_SUSPEND != 0,
            dpms_active_off: features & bdp::DPMS_ACTIVE_OFF != 0,
            color_type: DisplayColorType::from_bits(
                (features & bdp::COLOR_TYPE) >> 3,
                video_input.is_digital(),
            ),
            srgb_default: features & bdp::SRGB_DEFAULT != 0,
            preferred_timing_native: features & bdp::PREFERRED_TIMING != 0,
            continuous_frequency: features & bdp::CONTINUOUS_FREQUENCY != 0,
        },
    }
}

/// CIE 1931 xy coordinates of the primaries and the white point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Chromaticity {
    pub red_x: f64,
    pub red_y: f64,
    pub green_x: f64,
    pub green_y: f64,
    pub blue_x: f64,
    pub blue_y: f64,
    pub white_x: f64,
    pub white_y: f64,
}

pub fn chromaticity(cc: [u8; 10]) -> Chromaticity {
    // Two low bits live in bytes 0/1, the eight high bits in bytes 2..10
    let coord = |low_byte: u8, shift: u32, high: u8| -> f64 {
        let low = u16::from((low_byte >> shift) & 0x03);
        f64::from(low | (u16::from(high) << 2)) / 1024.0
    };

    Chromaticity {
        red_x: coord(cc[0], 6, cc[2]),
        red_y: coord(cc[0], 4, cc[3]),
        green_x: coord(cc[0], 2, cc[4]),
        green_y: coord(cc[0], 0, cc[5]),
        blue_x: coord(cc[1], 6, cc[6]),
        blue_y: coord(cc[1], 4, cc[7]),
        white_x: coord(cc[1], 2, cc[8]),
        white_y: coord(cc[1], 0, cc[9]),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EstablishedTiming {
    pub width: u16,
    pub height: u16,
    pub refresh_hz: u8,
}

impl fmt::Display for EstablishedTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} @ {}Hz", self.width, self.height, self.refresh_hz)
    }
}

const fn et(width: u16, height: u16, refresh_hz: u8) -> EstablishedTiming {
    EstablishedTiming { width, height, refresh_hz }
}

// (byte index, bit mask, mode)
const ESTABLISHED_TIMINGS: [(usize, u8, EstablishedTiming); 17] = [
    (0, 0x80, et(720, 400, 70)),
    (0, 0x40, et(720, 400, 88)),
    (0, 0x20, et(640, 480, 60)),
    (0, 0x10, et(640, 480, 67)),
    (0, 0x08, et(640, 480, 72)),
    (0, 0x04, et(640, 480, 75)),
    (0, 0x02, et(800, 600, 56)),
    (0, 0x01, et(800, 600, 60)),
    (1, 0x80, et(800, 600, 72)),
    (1, 0x40, et(800, 600, 75)),
    (1, 0x20, et(832, 624, 75)),
    (1, 0x10, et(1024, 768, 87)),
    (1, 0x08, et(1024, 768, 60)),
    (1, 0x04, et(1024, 768, 70)),
    (1, 0x02, et(1024, 768, 75)),
    (1, 0x01, et(1280, 1024, 75)),
    (2, 0x80, et(1152, 870, 75)),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstablishedTimings {
    pub timings: Vec<EstablishedTiming>,
    /// Bits 6..0 of the third byte, left to the manufacturer
    pub manufacturer_reserved: u8,
}

pub fn established_timings(bytes: [u8; 3]) -> EstablishedTimings {
    let timings = ESTABLISHED_TIMINGS
        .iter()
        .filter(|(index, mask, _)| bytes[*index] & mask != 0)
        .map(|(_, _, timing)| *timing)
        .collect();

    EstablishedTimings {
        timings,
        manufacturer_reserved: bytes[2] & 0x7F,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AspectRatio {
    #[serde(rename = "16:10")]
    R16_10,
    #[serde(rename = "4:3")]
    R4_3,
    #[serde(rename = "5:4")]
    R5_4,
    #[serde(rename = "16:9")]
    R16_9,
}

impl AspectRatio {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => AspectRatio::R16_10,
            0x01 => AspectRatio::R4_3,
            0x02 => AspectRatio::R5_4,
            _ => AspectRatio::R16_9,
        }
    }

    /// (width, height) parts of the ratio
    pub fn parts(self) -> (u32, u32) {
        match self {
            AspectRatio::R16_10 => (16, 10),
            AspectRatio::R4_3 => (4, 3),
            AspectRatio::R5_4 => (5, 4),
            AspectRatio::R16_9 => (16, 9),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::R16_10 => "16:10",
            AspectRatio::R4_3 => "4:3",
            AspectRatio::R5_4 => "5:4",
            AspectRatio::R16_9 => "16:9",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StandardTiming {
    pub index: usize,
    pub horizontal: u32,
    pub vertical: u32,
    pub refresh_hz: u32,
    pub aspect_ratio: AspectRatio,
}

impl fmt::Display for StandardTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} @ {}Hz ({})",
            self.horizontal,
            self.vertical,
            self.refresh_hz,
            self.aspect_ratio.as_str()
        )
    }
}

pub const UNUSED_STANDARD_TIMING: [u8; 2] = [0x01, 0x01];

/// Decode one standard timing entry; `None` for the `01 01` unused marker.
pub fn standard_timing(index: usize, entry: [u8; 2]) -> Option<StandardTiming> {
    if entry == UNUSED_STANDARD_TIMING {
        return None;
    }

    let horizontal = (u32::from(entry[0]) + 31) * 8;
    let aspect_ratio = AspectRatio::from_bits((entry[1] & 0xC0) >> 6);
    let (num, den) = aspect_ratio.parts();

    Some(StandardTiming {
        index,
        horizontal,
        vertical: horizontal * den / num,
        refresh_hz: u32::from(entry[1] & 0x3F) + 60,
        aspect_ratio,
    })
}

pub fn standard_timings(entries: &[[u8; 2]]) -> Vec<StandardTiming> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| standard_timing(index, *entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manufacturer_id_decode() {
        // "DEL" = 4, 5, 12
        assert_eq!(decode_manufacturer_id([0x10, 0xAC]), "DEL");
        assert!(manufacturer_id_in_range([0x10, 0xAC]));
        // "IBM" from a well-known monitor
        assert_eq!(decode_manufacturer_id([0x24, 0x4D]), "IBM");
    }

    #[test]
    fn test_manufacturer_id_zero_is_at_signs() {
        assert_eq!(decode_manufacturer_id([0x00, 0x00]), "@@@");
        assert!(!manufacturer_id_in_range([0x00, 0x00]));
    }

    #[test]
    fn test_year_and_gamma() {
        assert_eq!(year_of_manufacture(0), 1990);
        assert_eq!(year_of_manufacture(33), 2023);
        assert_eq!(gamma(120), 2.2);
        // No wrap-around for large bytes
        assert_eq!(gamma(0xFF), 3.55);
    }

    #[test]
    fn test_digital_basic_display_parameters() {
        let bdp = basic_display_parameters([0xA5, 0x3C, 0x22, 0x78, 0x3A]);

        assert_eq!(
            bdp.video_input,
            VideoInput::Digital { bit_depth: BitDepth::Bits8, interface: VideoInterface::DisplayPort }
        );
        assert_eq!(bdp.max_horizontal_size_cm, 60);
        assert_eq!(bdp.max_vertical_size_cm, 34);
        assert_eq!(bdp.gamma, 2.2);
        assert!(!bdp.features.dpms_standby);
        assert!(bdp.features.dpms_active_off);
        assert_eq!(bdp.features.color_type, DisplayColorType::Rgb444YCrCb444YCrCb422);
        assert!(!bdp.features.srgb_default);
        assert!(bdp.features.preferred_timing_native);
    }

    #[test]
    fn test_analog_basic_display_parameters() {
        let bdp = basic_display_parameters([0x0E, 0x28, 0x1E, 0x78, 0xE8]);

        assert_eq!(
            bdp.video_input,
            VideoInput::Analog {
                signal_level: SignalLevel::P700N300,
                blank_to_black_setup: false,
                separate_sync: true,
                composite_sync: true,
                sync_on_green: true,
                vsync_serrated: false,
            }
        );
        assert!(bdp.features.dpms_standby);
        assert!(bdp.features.dpms_suspend);
        assert!(bdp.features.dpms_active_off);
        assert_eq!(bdp.features.color_type, DisplayColorType::RgbColor);
    }

    #[test]
    fn test_reserved_digital_enumerants() {
        match video_input(0xFF) {
            VideoInput::Digital { bit_depth, interface } => {
                assert_eq!(bit_depth, BitDepth::Reserved);
                assert_eq!(interface, VideoInterface::Reserved);
            }
            other => panic!("expected digital input, got {other:?}"),
        }
    }

    #[test]
    fn test_chromaticity() {
        // sRGB-like primaries
        let cc = chromaticity([0xEE, 0x91, 0xA3, 0x54, 0x4C, 0x99, 0x26, 0x0F, 0x50, 0x54]);

        assert_eq!(cc.red_x, ((0b11 | (0xA3 << 2)) as f64) / 1024.0);
        assert_eq!(cc.red_y, ((0b10 | (0x54 << 2)) as f64) / 1024.0);
        assert_eq!(cc.green_x, ((0b11 | (0x4C << 2)) as f64) / 1024.0);
        assert_eq!(cc.green_y, ((0b10 | (0x99 << 2)) as f64) / 1024.0);
        assert_eq!(cc.blue_x, ((0b10 | (0x26 << 2)) as f64) / 1024.0);
        assert_eq!(cc.blue_y, ((0b01 | (0x0F << 2)) as f64) / 1024.0);
        assert_eq!(cc.white_x, ((0b00 | (0x50 << 2)) as f64) / 1024.0);
        assert_eq!(cc.white_y, ((0b01 | (0x54 << 2)) as f64) / 1024.0);
        assert!((cc.white_x - 0.3125).abs() < 1e-9);
    }

    #[test]
    fn test_established_timings() {
        let et = established_timings([0x21, 0x08, 0x80]);
        let names: Vec<String> = et.timings.iter().map(ToString::to_string).collect();

        assert_eq!(names, ["640x480 @ 60Hz", "800x600 @ 60Hz", "1024x768 @ 60Hz", "1152x870 @ 75Hz"]);
        assert_eq!(et.manufacturer_reserved, 0);
    }

    #[test]
    fn test_standard_timing_values() {
        // 1920x1080 @ 60Hz, 16:9
        let st = standard_timing(0, [0xD1, 0xC0]).unwrap();
        assert_eq!((st.horizontal, st.vertical, st.refresh_hz), (1920, 1080, 60));
        assert_eq!(st.aspect_ratio, AspectRatio::R16_9);

        // 1280x1024 @ 75Hz, 5:4
        let st = standard_timing(1, [0x81, 0x8F]).unwrap();
        assert_eq!((st.horizontal, st.vertical, st.refresh_hz), (1280, 1024, 75));
        assert_eq!(st.to_string(), "1280 x 1024 @ 75Hz (5:4)");

        // 1680x1050, 16:10
        let st = standard_timing(2, [0xB3, 0x00]).unwrap();
        assert_eq!((st.horizontal, st.vertical), (1680, 1050));
    }

    #[test]
    fn test_unused_standard_timings_are_skipped() {
        let entries = [[0x01, 0x01], [0x81, 0x80], [0x01, 0x01], [0x01, 0x01]];
        let timings = standard_timings(&entries);

        assert_eq!(timings.len(), 1);
        assert_eq!(timings[0].index, 1);
        assert_eq!((timings[0].horizontal, timings[0].vertical), (1280, 960));
    }
}
