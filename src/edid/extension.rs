//! DisplayID-style extension block walker.
//!
//! The block starts with a five byte section header followed by data
//! blocks of the form `tag, revision, payload_len, payload...`. The walk
//! stops at a zero tag, at the first tag it does not know (its length
//! cannot be trusted), or when a block would run past the 128-byte bound.

use log::{debug, trace};
use serde::Serialize;

use super::checksum;
use super::finding::{Finding, FindingKind};
use super::reader::DataReader;
use super::sizes;

pub mod tags {
    pub const VIDEO_TIMING_TYPE_1: u8 = 0x03;
    pub const TILED_DISPLAY_LEGACY: u8 = 0x12;
    pub const TILED_DISPLAY: u8 = 0x28;
    pub const END: u8 = 0x00;
}

/// EDID extension tag of a DisplayID block
pub const DISPLAYID_EXTENSION_TAG: u8 = 0x70;

pub const DATA_BLOCKS_START: usize = 5;
pub const BLOCK_HEADER: usize = 3;
pub const TILED_DISPLAY_SIZE: usize = 25;
pub const TILED_DISPLAY_PAYLOAD: u8 = (TILED_DISPLAY_SIZE - BLOCK_HEADER) as u8;
pub const VIDEO_TIMING_SIZE: usize = 20;

/// Findings from the extension block carry absolute offsets
const EXTENSION_BASE: usize = sizes::BLOCK;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionHeader {
    pub extension_tag: u8,
    pub version: u8,
    pub revision: u8,
    pub payload_length: u8,
    pub primary_use_case: u8,
    pub extension_count: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionReport {
    pub header: SectionHeader,
    pub blocks: Vec<DataBlock>,
    pub checksum_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataBlock {
    /// Offset of the tag byte within the extension block
    pub offset: usize,
    pub tag: u8,
    pub revision: u8,
    pub payload_length: u8,
    pub payload: DataBlockPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DataBlockPayload {
    TiledTopology(TiledTopology),
    VideoTimingType1(Vec<VideoTiming>),
}

impl DataBlockPayload {
    pub fn title(&self) -> &'static str {
        match self {
            DataBlockPayload::TiledTopology(_) => "Tiled display topology",
            DataBlockPayload::VideoTimingType1(_) => "Video timing block type 1",
        }
    }
}

/// Decode the section header, walk the data blocks and check the block checksum.
pub fn parse_extension(block: &[u8; sizes::BLOCK], findings: &mut Vec<Finding>) -> ExtensionReport {
    let header = SectionHeader {
        extension_tag: block[0],
        version: block[1] >> 4,
        revision: block[1] & 0x0F,
        payload_length: block[2],
        primary_use_case: block[3],
        extension_count: block[4],
    };
    debug!(
        "extension block tag 0x{:02x}, DisplayID {}.{}, {} payload bytes",
        header.extension_tag, header.version, header.revision, header.payload_length
    );

    // CTA-861 (0x02) and others are still walked, but their blocks are not DisplayID data
    if header.extension_tag != DISPLAYID_EXTENSION_TAG {
        findings.push(Finding::at(
            FindingKind::UnsupportedExtension,
            EXTENSION_BASE,
            format!(
                "extension tag 0x{:02x} is not DisplayID (0x{DISPLAYID_EXTENSION_TAG:02x}), data blocks below may be misread",
                header.extension_tag
            ),
        ));
    }

    let blocks = walk(block, findings);

    let checksum_valid = checksum::validate(block);
    if !checksum_valid {
        findings.push(Finding::at(
            FindingKind::ChecksumMismatch,
            EXTENSION_BASE + sizes::BLOCK - 1,
            format!(
                "extension block checksum invalid: stored 0x{:02x}, expected 0x{:02x}",
                block[sizes::BLOCK - 1],
                checksum::compute(&block[..sizes::BLOCK - 1])
            ),
        ));
    }

    ExtensionReport { header, blocks, checksum_valid }
}

/// Walk the data blocks of `block`, starting fresh at offset 5 on every call.
pub fn walk(block: &[u8], findings: &mut Vec<Finding>) -> Vec<DataBlock> {
    let bound = block.len().min(sizes::BLOCK);
    let block = &block[..bound];
    let mut blocks = Vec::new();
    let mut offset = DATA_BLOCKS_START;

    loop {
        let mut reader = DataReader::new(block, offset);
        let Some(tag) = reader.read_u8() else {
            findings.push(Finding::new(
                FindingKind::MissingTerminator,
                None,
                "extension block ended without a terminating zero tag",
            ));
            break;
        };
        trace!("extension block tag 0x{tag:02x} @ 0x{offset:02x}");

        if tag == tags::END {
            debug!("end of extension data blocks @ 0x{offset:02x}");
            break;
        }

        if tag != tags::TILED_DISPLAY && tag != tags::TILED_DISPLAY_LEGACY && tag != tags::VIDEO_TIMING_TYPE_1 {
            findings.push(Finding::at(
                FindingKind::UnknownTag,
                EXTENSION_BASE + offset,
                format!("unknown extension data block tag 0x{tag:02x}, stopping walk"),
            ));
            break;
        }

        let (Some(revision), Some(payload_length)) = (reader.read_u8(), reader.read_u8()) else {
            findings.push(overrun(offset, tag, BLOCK_HEADER, block.len() - offset));
            break;
        };

        let declared = BLOCK_HEADER + usize::from(payload_length);
        if declared > reader.remaining() + BLOCK_HEADER {
            findings.push(overrun(offset, tag, declared, block.len() - offset));
            break;
        }

        let payload = match tag {
            tags::VIDEO_TIMING_TYPE_1 => {
                let Some(bytes) = reader.read_bytes(usize::from(payload_length)) else {
                    findings.push(overrun(offset, tag, declared, block.len() - offset));
                    break;
                };
                if bytes.len() % VIDEO_TIMING_SIZE != 0 {
                    findings.push(Finding::at(
                        FindingKind::PayloadLengthMismatch,
                        EXTENSION_BASE + offset + 2,
                        format!(
                            "video timing block payload of {} bytes is not a multiple of {VIDEO_TIMING_SIZE}",
                            bytes.len()
                        ),
                    ));
                }
                DataBlockPayload::VideoTimingType1(video_timings(bytes))
            }
            _ => {
                let Some(window) = block.get(offset..offset + TILED_DISPLAY_SIZE) else {
                    findings.push(overrun(offset, tag, TILED_DISPLAY_SIZE, block.len() - offset));
                    break;
                };
                if payload_length != TILED_DISPLAY_PAYLOAD {
                    findings.push(Finding::at(
                        FindingKind::PayloadLengthMismatch,
                        EXTENSION_BASE + offset + 2,
                        format!(
                            "tiled display topology declares {payload_length} payload bytes, expected {TILED_DISPLAY_PAYLOAD}"
                        ),
                    ));
                }
                DataBlockPayload::TiledTopology(tiled_topology(window))
            }
        };

        debug!("{} @ 0x{offset:02x}, {payload_length} payload bytes", payload.title());
        blocks.push(DataBlock { offset, tag, revision, payload_length, payload });
        offset += declared;
    }

    blocks
}

fn overrun(offset: usize, tag: u8, needed: usize, available: usize) -> Finding {
    Finding::at(
        FindingKind::BlockOverrun,
        EXTENSION_BASE + offset,
        format!("data block 0x{tag:02x} needs {needed} bytes but only {available} remain in the extension block"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SingleTileBehavior {
    Undefined,
    DisplayAtLocation,
    ScaleToFit,
    CloneToAll,
    Reserved(u8),
}

impl SingleTileBehavior {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0x00 => SingleTileBehavior::Undefined,
            0x01 => SingleTileBehavior::DisplayAtLocation,
            0x02 => SingleTileBehavior::ScaleToFit,
            0x03 => SingleTileBehavior::CloneToAll,
            other => SingleTileBehavior::Reserved(other),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SingleTileBehavior::Undefined => "Undefined",
            SingleTileBehavior::DisplayAtLocation => "Display at tile location",
            SingleTileBehavior::ScaleToFit => "Scale to fit the display",
            SingleTileBehavior::CloneToAll => "Clone to other tiles",
            SingleTileBehavior::Reserved(_) => "Reserved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MultiTileBehavior {
    Undefined,
    DisplayAtLocation,
    Reserved(u8),
}

impl MultiTileBehavior {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0x00 => MultiTileBehavior::Undefined,
            0x01 => MultiTileBehavior::DisplayAtLocation,
            other => MultiTileBehavior::Reserved(other),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MultiTileBehavior::Undefined => "Undefined",
            MultiTileBehavior::DisplayAtLocation => "Display at tile location",
            MultiTileBehavior::Reserved(_) => "Reserved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bezel {
    pub pixel_multiplier: u8,
    pub top: f64,
    pub bottom: f64,
    pub right: f64,
    pub left: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiledTopology {
    pub single_enclosure: bool,
    pub single_tile_behavior: SingleTileBehavior,
    pub multi_tile_behavior: MultiTileBehavior,
    pub columns: u8,
    pub rows: u8,
    pub column_location: u8,
    pub row_location: u8,
    pub tile_width: u32,
    pub tile_height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bezel: Option<Bezel>,
    pub vendor_id: String,
    pub product_code: u16,
    pub serial_number: u32,
}

mod tile {
    pub const SINGLE_TILE_BEHAVIOR: u8 = 0x07;
    pub const MULTI_TILE_BEHAVIOR: u8 = 0x18;
    pub const BEZEL_INFO: u8 = 0x40;
    pub const SINGLE_ENCLOSURE: u8 = 0x80;
}

/// Decode a 25-byte tiled display topology block, header included
pub fn tiled_topology(dd: &[u8]) -> TiledTopology {
    let mut reader = DataReader::new(dd, BLOCK_HEADER);
    let caps = reader.read_u8().unwrap_or_default();
    let [topology, location, msb] = reader.read_array::<3>().unwrap_or_default();
    let tile_width = u32::from(reader.read_u16().unwrap_or_default()) + 1;
    let tile_height = u32::from(reader.read_u16().unwrap_or_default()) + 1;
    let [pixel_multiplier, top, bottom, right, left] = reader.read_array::<5>().unwrap_or_default();
    let vendor = reader.read_array::<3>().unwrap_or_default();
    let product_code = reader.read_u16().unwrap_or_default();
    let serial_number = reader.read_u32().unwrap_or_default();

    // Six-bit fields: four low bits in the topology/location bytes, two high bits in `msb`
    let columns = ((((msb >> 2) & 0x03) << 4) | (topology >> 4)) + 1;
    let rows = (((msb & 0x03) << 4) | (topology & 0x0F)) + 1;
    let column_location = ((msb >> 6) << 4) | (location >> 4);
    let row_location = (((msb >> 4) & 0x03) << 4) | (location & 0x0F);

    let bezel_size = |raw: u8| f64::from(pixel_multiplier) * f64::from(raw) / 10.0;
    let bezel = (caps & tile::BEZEL_INFO != 0).then(|| Bezel {
        pixel_multiplier,
        top: bezel_size(top),
        bottom: bezel_size(bottom),
        right: bezel_size(right),
        left: bezel_size(left),
    });

    TiledTopology {
        single_enclosure: caps & tile::SINGLE_ENCLOSURE != 0,
        single_tile_behavior: SingleTileBehavior::from_bits(caps & tile::SINGLE_TILE_BEHAVIOR),
        multi_tile_behavior: MultiTileBehavior::from_bits((caps & tile::MULTI_TILE_BEHAVIOR) >> 3),
        columns,
        rows,
        column_location,
        row_location,
        tile_width,
        tile_height,
        bezel,
        vendor_id: vendor.iter().map(|&b| char::from(b)).collect(),
        product_code,
        serial_number,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingAspectRatio {
    R1_1,
    R5_4,
    R4_3,
    R15_9,
    R16_9,
    R16_10,
    R64_27,
    R256_135,
    Undefined,
    Reserved,
}

impl TimingAspectRatio {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0x00 => TimingAspectRatio::R1_1,
            0x01 => TimingAspectRatio::R5_4,
            0x02 => TimingAspectRatio::R4_3,
            0x03 => TimingAspectRatio::R15_9,
            0x04 => TimingAspectRatio::R16_9,
            0x05 => TimingAspectRatio::R16_10,
            0x06 => TimingAspectRatio::R64_27,
            0x07 => TimingAspectRatio::R256_135,
            0x08 => TimingAspectRatio::Undefined,
            _ => TimingAspectRatio::Reserved,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimingAspectRatio::R1_1 => "1:1",
            TimingAspectRatio::R5_4 => "5:4",
            TimingAspectRatio::R4_3 => "4:3",
            TimingAspectRatio::R15_9 => "15:9",
            TimingAspectRatio::R16_9 => "16:9",
            TimingAspectRatio::R16_10 => "16:10",
            TimingAspectRatio::R64_27 => "64:27",
            TimingAspectRatio::R256_135 => "256:135",
            TimingAspectRatio::Undefined => "undefined",
            TimingAspectRatio::Reserved => "reserved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingStereo {
    Mono,
    Stereo,
    UserSelectable,
    Reserved,
}

impl TimingStereo {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0x00 => TimingStereo::Mono,
            0x01 => TimingStereo::Stereo,
            0x02 => TimingStereo::UserSelectable,
            _ => TimingStereo::Reserved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoTiming {
    pub pixel_clock_mhz: f64,
    pub preferred: bool,
    pub interlaced: bool,
    pub stereo: TimingStereo,
    pub aspect_ratio: TimingAspectRatio,
    pub h_active: u32,
    pub h_blanking: u32,
    pub h_front_porch: u32,
    pub h_sync_width: u32,
    pub h_back_porch: i64,
    pub h_sync_positive: bool,
    pub v_active: u32,
    pub v_blanking: u32,
    pub v_front_porch: u32,
    pub v_sync_width: u32,
    pub v_back_porch: i64,
    pub v_sync_positive: bool,
    pub h_total: u32,
    pub v_total: u32,
    pub refresh_hz: f64,
}

mod options {
    pub const PREFERRED: u8 = 0x80;
    pub const STEREO: u8 = 0x60;
    pub const INTERLACED: u8 = 0x10;
    pub const ASPECT_RATIO: u8 = 0x0F;
    pub const SYNC_POSITIVE: u16 = 0x8000;
    pub const PORCH_MASK: u16 = 0x7FFF;
}

/// Decode every whole 20-byte entry of a type 1 video timing payload
pub fn video_timings(payload: &[u8]) -> Vec<VideoTiming> {
    payload.chunks_exact(VIDEO_TIMING_SIZE).map(video_timing).collect()
}

pub fn video_timing(entry: &[u8]) -> VideoTiming {
    let mut reader = DataReader::new(entry, 0);
    let clock = reader.read_u24().unwrap_or_default();
    let timing_options = reader.read_u8().unwrap_or_default();
    // All lengths are stored minus one
    let mut field = || u32::from(reader.read_u16().unwrap_or_default());

    let h_active = field() + 1;
    let h_blanking = field() + 1;
    let h_porch_raw = field();
    let h_sync_width = field() + 1;
    let v_active = field() + 1;
    let v_blanking = field() + 1;
    let v_porch_raw = field();
    let v_sync_width = field() + 1;

    let h_front_porch = (h_porch_raw & u32::from(options::PORCH_MASK)) + 1;
    let v_front_porch = (v_porch_raw & u32::from(options::PORCH_MASK)) + 1;

    let h_total = h_active + h_blanking;
    let v_total = v_active + v_blanking;
    let pixel_clock_hz = f64::from(clock) * 10_000.0;

    VideoTiming {
        pixel_clock_mhz: f64::from(clock) / 100.0,
        preferred: timing_options & options::PREFERRED != 0,
        interlaced: timing_options & options::INTERLACED != 0,
        stereo: TimingStereo::from_bits((timing_options & options::STEREO) >> 5),
        aspect_ratio: TimingAspectRatio::from_bits(timing_options & options::ASPECT_RATIO),
        h_active,
        h_blanking,
        h_front_porch,
        h_sync_width,
        h_back_porch: i64::from(h_blanking) - i64::from(h_front_porch) - i64::from(h_sync_width),
        h_sync_positive: h_porch_raw & u32::from(options::SYNC_POSITIVE) != 0,
        v_active,
        v_blanking,
        v_front_porch,
        v_sync_width,
        v_back_porch: i64::from(v_blanking) - i64::from(v_front_porch) - i64::from(v_sync_width),
        v_sync_positive: v_porch_raw & u32::from(options::SYNC_POSITIVE) != 0,
        h_total,
        v_total,
        refresh_hz: pixel_clock_hz / (f64::from(h_total) * f64::from(v_total)),
    }
}
