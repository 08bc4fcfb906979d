use thiserror::Error;

/// Fatal errors raised by the EDID codec.
///
/// Anything that only affects the interpretation of a single field is
/// reported as a [`Finding`](super::Finding) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdidError {
    #[error("invalid EDID size: {0} bytes (expected 128 or 256)")]
    InvalidSize(usize),

    #[error("invalid manufacturer letter {0:?}: expected an uppercase ASCII letter")]
    InvalidLetter(char),

    #[error("manufacturer id must be exactly 3 letters, got {0}")]
    InvalidManufacturerLength(usize),

    #[error("display name is {0} bytes long, at most 13 fit in a descriptor")]
    NameTooLong(usize),

    #[error("display name must be ASCII")]
    NonAsciiName,

    #[error("descriptor slot {0} does not exist (expected 0..=3)")]
    InvalidDescriptorSlot(usize),
}
