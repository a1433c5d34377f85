//! Versioned byte layout of a unit-frame readout stream.
//!
//! A [`FrameFormat`] tells the decoder which byte values mark frame
//! boundaries, which carry identifiers, and how the three hit data words are
//! tagged. The decoder never assumes a layout: every decode call receives one.

use crate::structs::word::MossWord;
use crate::utils::errors::FormatError;

/// Number of payload bits carried by each hit data word.
pub const DATA_PAYLOAD_BITS: u32 = 6;
/// Mask selecting the payload of a data word.
pub const DATA_PAYLOAD_MASK: u8 = (1 << DATA_PAYLOAD_BITS) - 1;

/// A family of marker bytes that carry an identifier in their low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerRange {
    pub base: u8,
    pub mask: u8,
    pub max_id: u8,
}

impl MarkerRange {
    pub const fn new(base: u8, mask: u8, max_id: u8) -> Self {
        Self { base, mask, max_id }
    }

    /// Returns the identifier carried by `byte` if it belongs to this range.
    #[inline(always)]
    pub const fn id_of(&self, byte: u8) -> Option<u8> {
        let id = byte & self.mask;
        if byte & !self.mask == self.base && id <= self.max_id {
            Some(id)
        } else {
            None
        }
    }

    /// Returns the marker byte for `id`.
    pub const fn marker(&self, id: u8) -> Option<u8> {
        if id <= self.max_id {
            Some(self.base | id)
        } else {
            None
        }
    }

    pub const fn count(&self) -> usize {
        self.max_id as usize + 1
    }

    pub fn markers(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=self.max_id).map(|id| self.base | id)
    }
}

/// Byte layout of a readout stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameFormat {
    pub version: u8,
    pub idle: u8,
    pub delimiter: u8,
    pub trailer: u8,
    pub unit_header: MarkerRange,
    pub region_header: MarkerRange,
    /// Two-bit tags placed in the top bits of the DATA_0, DATA_1 and DATA_2 words.
    pub data_tags: [u8; 3],
}

impl FrameFormat {
    /// MOSS readout layout: ten units, four regions, 9-bit row and column.
    pub const MOSS_V1: FrameFormat = FrameFormat {
        version: 1,
        idle: 0xFF,
        delimiter: 0xFA,
        trailer: 0xE0,
        unit_header: MarkerRange::new(0xD0, 0x0F, 9),
        region_header: MarkerRange::new(0xC0, 0x03, 3),
        data_tags: [0b00, 0b01, 0b10],
    };

    /// Number of region headers every frame carries.
    ///
    /// Only meaningful for a format that passes [`FrameFormat::validate`].
    pub const fn regions(&self) -> u8 {
        self.region_header.max_id + 1
    }

    /// Classifies a single byte. Prefer [`WordTable`] in loops.
    ///
    /// [`WordTable`]: crate::structs::word::WordTable
    pub const fn classify(&self, byte: u8) -> MossWord {
        if byte == self.idle {
            return MossWord::Idle;
        }
        if byte == self.delimiter {
            return MossWord::Delimiter;
        }
        if byte == self.trailer {
            return MossWord::UnitFrameTrailer;
        }
        if let Some(unit_id) = self.unit_header.id_of(byte) {
            return MossWord::UnitFrameHeader(unit_id);
        }
        if let Some(region) = self.region_header.id_of(byte) {
            return MossWord::RegionHeader(region);
        }

        let tag = byte >> DATA_PAYLOAD_BITS;
        let payload = byte & DATA_PAYLOAD_MASK;
        if tag == self.data_tags[0] {
            MossWord::Data0(payload)
        } else if tag == self.data_tags[1] {
            MossWord::Data1(payload)
        } else if tag == self.data_tags[2] {
            MossWord::Data2(payload)
        } else {
            MossWord::Invalid(byte)
        }
    }

    /// Builds the data word with tag `index` (0..=2) and the given payload.
    #[inline(always)]
    pub const fn data_word(&self, index: usize, payload: u8) -> u8 {
        (self.data_tags[index] << DATA_PAYLOAD_BITS) | (payload & DATA_PAYLOAD_MASK)
    }

    /// Checks that every byte value has at most one meaning.
    pub fn validate(&self) -> Result<(), FormatError> {
        for (name, range) in [
            ("UNIT_FRAME_HEADER", &self.unit_header),
            ("REGION_HEADER", &self.region_header),
        ] {
            if range.base & range.mask != 0 {
                return Err(FormatError::InvalidMarkerRange {
                    name,
                    base: range.base,
                    mask: range.mask,
                });
            }
            if range.max_id & !range.mask != 0 {
                return Err(FormatError::IdOutOfMask {
                    name,
                    max_id: range.max_id,
                    mask: range.mask,
                });
            }
        }

        for (i, &tag) in self.data_tags.iter().enumerate() {
            if tag > 0b11 {
                return Err(FormatError::DataTagOutOfRange(tag));
            }
            if self.data_tags[..i].contains(&tag) {
                return Err(FormatError::DuplicateDataTag(tag));
            }
        }

        let mut owners: [Option<&'static str>; 256] = [None; 256];
        let mut claim = |byte: u8, name: &'static str| match owners[byte as usize] {
            Some(first) => Err(FormatError::MarkerOverlap {
                byte,
                first,
                second: name,
            }),
            None => {
                owners[byte as usize] = Some(name);
                Ok(())
            }
        };

        claim(self.idle, "IDLE")?;
        claim(self.delimiter, "DELIMITER")?;
        claim(self.trailer, "UNIT_FRAME_TRAILER")?;
        for byte in self.unit_header.markers() {
            claim(byte, "UNIT_FRAME_HEADER")?;
        }
        for byte in self.region_header.markers() {
            claim(byte, "REGION_HEADER")?;
        }

        let data_names = ["DATA_0", "DATA_1", "DATA_2"];
        for byte in 0..=u8::MAX {
            let tag = byte >> DATA_PAYLOAD_BITS;
            if let Some(i) = self.data_tags.iter().position(|&t| t == tag) {
                claim(byte, data_names[i])?;
            }
        }

        Ok(())
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::MOSS_V1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moss_v1_is_valid() {
        assert_eq!(FrameFormat::MOSS_V1.validate(), Ok(()));
        assert_eq!(FrameFormat::MOSS_V1.regions(), 4);
    }

    #[test]
    fn marker_range_ids() {
        let range = FrameFormat::MOSS_V1.unit_header;
        assert_eq!(range.id_of(0xD0), Some(0));
        assert_eq!(range.id_of(0xD9), Some(9));
        assert_eq!(range.id_of(0xDA), None);
        assert_eq!(range.id_of(0xC0), None);
        assert_eq!(range.marker(3), Some(0xD3));
        assert_eq!(range.marker(10), None);
        assert_eq!(range.count(), 10);
    }

    #[test]
    fn classify_moss_v1() {
        let f = FrameFormat::MOSS_V1;
        assert_eq!(f.classify(0xFF), MossWord::Idle);
        assert_eq!(f.classify(0xFA), MossWord::Delimiter);
        assert_eq!(f.classify(0xE0), MossWord::UnitFrameTrailer);
        assert_eq!(f.classify(0xD7), MossWord::UnitFrameHeader(7));
        assert_eq!(f.classify(0xC2), MossWord::RegionHeader(2));
        assert_eq!(f.classify(0x25), MossWord::Data0(0x25));
        assert_eq!(f.classify(0x6E), MossWord::Data1(0x2E));
        assert_eq!(f.classify(0xB1), MossWord::Data2(0x31));
        assert_eq!(f.classify(0xC4), MossWord::Invalid(0xC4));
        assert_eq!(f.classify(0xDA), MossWord::Invalid(0xDA));
        assert_eq!(f.classify(0xE1), MossWord::Invalid(0xE1));
    }

    #[test]
    fn overlapping_markers_are_rejected() {
        let format = FrameFormat {
            delimiter: 0xE0,
            ..FrameFormat::MOSS_V1
        };
        assert_eq!(
            format.validate(),
            Err(FormatError::MarkerOverlap {
                byte: 0xE0,
                first: "DELIMITER",
                second: "UNIT_FRAME_TRAILER",
            })
        );

        let format = FrameFormat {
            trailer: 0x10,
            ..FrameFormat::MOSS_V1
        };
        assert!(matches!(
            format.validate(),
            Err(FormatError::MarkerOverlap { byte: 0x10, .. })
        ));
    }

    #[test]
    fn bad_ranges_and_tags_are_rejected() {
        let format = FrameFormat {
            region_header: MarkerRange::new(0xC1, 0x03, 3),
            ..FrameFormat::MOSS_V1
        };
        assert!(matches!(
            format.validate(),
            Err(FormatError::InvalidMarkerRange { .. })
        ));

        let format = FrameFormat {
            data_tags: [0b00, 0b00, 0b10],
            ..FrameFormat::MOSS_V1
        };
        assert_eq!(format.validate(), Err(FormatError::DuplicateDataTag(0)));

        let format = FrameFormat {
            data_tags: [0b00, 0b01, 0b100],
            ..FrameFormat::MOSS_V1
        };
        assert_eq!(format.validate(), Err(FormatError::DataTagOutOfRange(4)));
    }

    #[test]
    fn full_byte_region_range_is_rejected() {
        let format = FrameFormat {
            region_header: MarkerRange::new(0x00, 0xFF, 0xFF),
            ..FrameFormat::MOSS_V1
        };
        assert!(matches!(
            format.validate(),
            Err(FormatError::MarkerOverlap { .. })
        ));
    }
}
