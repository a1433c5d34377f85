//! Classification of individual stream bytes.

use std::fmt::Display;

use crate::structs::format::FrameFormat;

/// Meaning of one byte of the readout stream.
///
/// Identifier-carrying words keep their identifier; data words keep their
/// 6-bit payload; [`MossWord::Invalid`] keeps the raw byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MossWord {
    Idle,
    Delimiter,
    UnitFrameHeader(u8),
    UnitFrameTrailer,
    RegionHeader(u8),
    Data0(u8),
    Data1(u8),
    Data2(u8),
    Invalid(u8),
}

impl Display for MossWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MossWord::Idle => write!(f, "IDLE"),
            MossWord::Delimiter => write!(f, "DELIMITER"),
            MossWord::UnitFrameHeader(id) => write!(f, "UNIT_FRAME_HEADER_{id}"),
            MossWord::UnitFrameTrailer => write!(f, "UNIT_FRAME_TRAILER"),
            MossWord::RegionHeader(id) => write!(f, "REGION_HEADER_{id}"),
            MossWord::Data0(p) => write!(f, "DATA_0({p:#04X})"),
            MossWord::Data1(p) => write!(f, "DATA_1({p:#04X})"),
            MossWord::Data2(p) => write!(f, "DATA_2({p:#04X})"),
            MossWord::Invalid(b) => write!(f, "INVALID({b:#04X})"),
        }
    }
}

/// Precomputed classification of all 256 byte values for one [`FrameFormat`].
#[derive(Debug, Clone)]
pub struct WordTable {
    words: [MossWord; 256],
}

impl WordTable {
    pub fn new(format: &FrameFormat) -> Self {
        let mut words = [MossWord::Invalid(0); 256];
        for (byte, word) in words.iter_mut().enumerate() {
            *word = format.classify(byte as u8);
        }

        Self { words }
    }

    #[inline(always)]
    pub fn classify(&self, byte: u8) -> MossWord {
        self.words[byte as usize]
    }
}

#[test]
fn table_matches_format() {
    let format = FrameFormat::MOSS_V1;
    let table = WordTable::new(&format);
    for byte in 0..=u8::MAX {
        assert_eq!(table.classify(byte), format.classify(byte));
    }
}

#[test]
fn word_display() {
    assert_eq!(MossWord::RegionHeader(2).to_string(), "REGION_HEADER_2");
    assert_eq!(MossWord::Invalid(0xE5).to_string(), "INVALID(0xE5)");
    assert_eq!(MossWord::Data1(0x2E).to_string(), "DATA_1(0x2E)");
}
