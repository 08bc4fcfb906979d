use serde::Serialize;
use std::fmt;

/// Category of a non-fatal issue found while interpreting a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    HeaderMismatch,
    ChecksumMismatch,
    UnknownTag,
    BlockOverrun,
    ManufacturerOutOfRange,
    ExtensionFlagMismatch,
    PayloadLengthMismatch,
    MissingTerminator,
    UnsupportedExtension,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::HeaderMismatch => "header mismatch",
            FindingKind::ChecksumMismatch => "checksum mismatch",
            FindingKind::UnknownTag => "unknown tag",
            FindingKind::BlockOverrun => "block overrun",
            FindingKind::ManufacturerOutOfRange => "manufacturer id out of range",
            FindingKind::ExtensionFlagMismatch => "extension flag mismatch",
            FindingKind::PayloadLengthMismatch => "payload length mismatch",
            FindingKind::MissingTerminator => "missing terminator",
            FindingKind::UnsupportedExtension => "unsupported extension",
        }
    }
}

/// A single diagnostic produced by the parse.
///
/// `offset` is the absolute byte offset in the input (extension block
/// offsets start at 128) when the issue can be pinned to one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    pub message: String,
}

impl Finding {
    pub fn new(kind: FindingKind, offset: Option<usize>, message: impl Into<String>) -> Self {
        Self { kind, offset, message: message.into() }
    }

    pub fn at(kind: FindingKind, offset: usize, message: impl Into<String>) -> Self {
        Self::new(kind, Some(offset), message)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "[{}] @0x{:02x}: {}", self.kind.as_str(), offset, self.message),
            None => write!(f, "[{}] {}", self.kind.as_str(), self.message),
        }
    }
}
