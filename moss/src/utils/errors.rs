use crate::structs::word::MossWord;

/// Returns `$err` from the enclosing function when `$level` is at or above
/// the fail level of `$state`, otherwise logs it at `$level`.
#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed frame at byte {index}: {reason}")]
    MalformedFrame {
        index: usize,
        reason: FrameErrorReason,
    },

    #[error("No unit frame header found")]
    NoHeaderFound,

    #[error("Unit frame header at byte {header_idx} has no trailer before end of buffer")]
    EndOfBufferNoTrailer { header_idx: usize },

    #[error(transparent)]
    InvalidPacket(#[from] PacketError),

    #[error(transparent)]
    InvalidFormat(#[from] FormatError),
}

impl DecodeError {
    /// Offset of the offending byte, for errors that point into the buffer.
    pub fn index(&self) -> Option<usize> {
        match self {
            DecodeError::MalformedFrame { index, .. } => Some(*index),
            DecodeError::EndOfBufferNoTrailer { header_idx } => Some(*header_idx),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameErrorReason {
    #[error("expected {expected}, found {found}")]
    UnexpectedWord {
        expected: &'static str,
        found: MossWord,
    },

    #[error("region header {found} out of order, expected region {expected}")]
    RegionOutOfOrder { expected: u8, found: u8 },

    #[error("data word before the first region header")]
    DataOutsideRegion,

    #[error("trailer inside an incomplete hit")]
    IncompleteHit,

    #[error("trailer after {seen} of {expected} region headers")]
    MissingRegions { seen: u8, expected: u8 },

    #[error("unit frame header for unit {unit_id} inside an open frame")]
    NestedHeader { unit_id: u8 },

    #[error("invalid protocol word {0:#04X}")]
    InvalidWord(u8),
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    #[error("Unit id {unit_id} exceeds maximum {max}")]
    UnitIdOutOfRange { unit_id: u8, max: u8 },

    #[error("Region {region} exceeds maximum {max}")]
    RegionOutOfRange { region: u8, max: u8 },

    #[error("Row {0} does not fit in 9 bits")]
    RowOutOfRange(u16),

    #[error("Column {0} does not fit in 9 bits")]
    ColumnOutOfRange(u16),

    #[error("Hits must be ordered by region: region {found} after region {previous}")]
    RegionsNotOrdered { previous: u8, found: u8 },

    #[error(transparent)]
    InvalidFormat(#[from] FormatError),
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    #[error("Marker range {name} is invalid: base {base:#04X} overlaps id mask {mask:#04X}")]
    InvalidMarkerRange {
        name: &'static str,
        base: u8,
        mask: u8,
    },

    #[error("Marker range {name} allows id {max_id} beyond its mask {mask:#04X}")]
    IdOutOfMask {
        name: &'static str,
        max_id: u8,
        mask: u8,
    },

    #[error("Byte {byte:#04X} is claimed by both {first} and {second}")]
    MarkerOverlap {
        byte: u8,
        first: &'static str,
        second: &'static str,
    },

    #[error("Data word tag {0:#04b} is not a 2-bit value")]
    DataTagOutOfRange(u8),

    #[error("Data word tag {0:#04b} is used more than once")]
    DuplicateDataTag(u8),
}

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    InvalidPacket(#[from] PacketError),

    #[error(transparent)]
    InvalidFormat(#[from] FormatError),

    #[error("Failed to pack data words: {0}")]
    Io(#[from] std::io::Error),
}

#[test]
fn error_index() {
    let err = DecodeError::MalformedFrame {
        index: 12,
        reason: FrameErrorReason::IncompleteHit,
    };
    assert_eq!(err.index(), Some(12));
    assert_eq!(
        err.to_string(),
        "Malformed frame at byte 12: trailer inside an incomplete hit"
    );
    assert_eq!(DecodeError::NoHeaderFound.index(), None);
}
