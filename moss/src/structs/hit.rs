//! A single pixel hit read out of a MOSS region.

use std::fmt::Display;

use crate::utils::errors::PacketError;

/// Largest row or column address, both are 9-bit values.
pub const MAX_PIXEL_ADDRESS: u16 = 0x1FF;

/// A single hit from a MOSS region.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MossHit {
    /// The region ID of the hit.
    pub region: u8,
    /// The row of the hit.
    pub row: u16,
    /// The column of the hit.
    pub column: u16,
}

impl MossHit {
    pub const fn new(region: u8, row: u16, column: u16) -> Self {
        Self {
            region,
            row,
            column,
        }
    }

    /// Checks the hit against the address width and a region count.
    pub fn validate(&self, regions: u8) -> Result<(), PacketError> {
        if self.region >= regions {
            return Err(PacketError::RegionOutOfRange {
                region: self.region,
                max: regions.saturating_sub(1),
            });
        }
        if self.row > MAX_PIXEL_ADDRESS {
            return Err(PacketError::RowOutOfRange(self.row));
        }
        if self.column > MAX_PIXEL_ADDRESS {
            return Err(PacketError::ColumnOutOfRange(self.column));
        }

        Ok(())
    }

    /// 6-bit payloads of the DATA_0, DATA_1 and DATA_2 words.
    ///
    /// DATA_0 carries row[8:3], DATA_1 carries row[2:0] and column[8:6],
    /// DATA_2 carries column[5:0].
    pub const fn payloads(&self) -> [u8; 3] {
        [
            ((self.row >> 3) & 0x3F) as u8,
            ((((self.row & 0x07) << 3) | ((self.column >> 6) & 0x07)) & 0x3F) as u8,
            (self.column & 0x3F) as u8,
        ]
    }
}

impl Display for MossHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "reg: {reg} row: {row} col: {col}",
            reg = self.region,
            row = self.row,
            col = self.column,
        )
    }
}
