// Synthetic but realistic EDID fixtures shared by the codec tests

use super::{HEADER_PATTERN, checksum, sizes};

/// 1920x1080 @ 60Hz, 148.5 MHz, digital separate sync, +H +V
pub const DTD_1080P: [u8; sizes::DESCRIPTOR] = [
    0x02, 0x3A, 0x80, 0x18, 0x71, 0x38, 0x2D, 0x40, 0x58, 0x2C, 0x45, 0x00, 0x13, 0x2B, 0x21, 0x00, 0x00,
    0x1E,
];

pub const NAME_DESCRIPTOR: [u8; sizes::DESCRIPTOR] = [
    0x00, 0x00, 0x00, 0xFC, 0x00, b'O', b'P', b'S', b'-', b'1', b'0', b'8', b'0', b'\n', 0x20, 0x20, 0x20,
    0x20,
];

/// 48-75 Hz, 30-83 kHz, 170 MHz, range limits only
pub const RANGE_LIMITS: [u8; sizes::DESCRIPTOR] = [
    0x00, 0x00, 0x00, 0xFD, 0x00, 0x30, 0x4B, 0x1E, 0x53, 0x11, 0x01, 0x0A, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x20,
];

pub const DUMMY_DESCRIPTOR: [u8; sizes::DESCRIPTOR] = [
    0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00,
];

/// Base block for manufacturer "OPS", product 0x1080, serial 0x01020304, week 12 of 2023
pub fn base_record() -> [u8; sizes::BLOCK] {
    let mut data = Vec::with_capacity(sizes::BLOCK);
    data.extend_from_slice(&HEADER_PATTERN);
    data.extend_from_slice(&[0x3E, 0x13]);
    data.extend_from_slice(&[0x80, 0x10]);
    data.extend_from_slice(&[0x04, 0x03, 0x02, 0x01]);
    data.extend_from_slice(&[12, 33, 1, 4]);
    data.extend_from_slice(&[0xA5, 0x3C, 0x22, 0x78, 0x3A]);
    data.extend_from_slice(&[0xEE, 0x91, 0xA3, 0x54, 0x4C, 0x99, 0x26, 0x0F, 0x50, 0x54]);
    data.extend_from_slice(&[0x21, 0x08, 0x00]);
    data.extend_from_slice(&[0xD1, 0xC0, 0x81, 0x80]);
    for _ in 0..6 {
        data.extend_from_slice(&[0x01, 0x01]);
    }
    data.extend_from_slice(&DTD_1080P);
    data.extend_from_slice(&NAME_DESCRIPTOR);
    data.extend_from_slice(&RANGE_LIMITS);
    data.extend_from_slice(&DUMMY_DESCRIPTOR);
    data.push(0x00);
    data.push(checksum::compute(&data));

    let mut block = [0u8; sizes::BLOCK];
    block.copy_from_slice(&data);
    block
}

/// DisplayID 1.3 block: tiled topology (2x1, this tile at column 1) and one 3840x2160 half timing
pub fn extension_block() -> [u8; sizes::BLOCK] {
    let mut block = [0u8; sizes::BLOCK];
    block[..5].copy_from_slice(&[0x70, 0x13, 48, 0x00, 0x00]);

    block[5..30].copy_from_slice(&[
        0x12, 0x00, 22, // header
        0x8A, // single enclosure, multi-tile at location, single tile scales
        0x10, 0x10, 0x00, // 2 columns x 1 row, column 1 row 0
        0x7F, 0x07, 0x6F, 0x08, // 1920 x 2160
        0x00, 0x00, 0x00, 0x00, 0x00, // no bezel
        b'O', b'P', b'S', 0x80, 0x10, 0x2A, 0x00, 0x00, 0x00,
    ]);

    block[30..53].copy_from_slice(&[
        0x03, 0x00, 20, // header
        0x04, 0x74, 0x00, 0x84, // 297 MHz, preferred, 16:9
        0x7F, 0x07, 0x17, 0x01, 0x57, 0x80, 0x2B, 0x00, // 1920, 280, 88 (+), 44
        0x6F, 0x08, 0x59, 0x00, 0x07, 0x00, 0x09, 0x00, // 2160, 90, 8 (-), 10
    ]);

    block[127] = checksum::compute(&block[..127]);
    block
}

/// Base record announcing one extension, followed by [`extension_block`]
pub fn extended_record() -> Vec<u8> {
    let mut base = base_record();
    base[126] = 1;
    base[127] = checksum::compute(&base[..127]);

    let mut data = base.to_vec();
    data.extend_from_slice(&extension_block());
    data
}
