//! Bit-level packing of hit data words.
//!
//! Each hit occupies three bytes on the wire. Every byte starts with a
//! 2-bit word tag followed by a 6-bit payload; row and column are split
//! across the payloads most significant bits first.

use std::io;

use bitstream_io::{BigEndian, BitWrite, BitWriter, UnsignedInteger};

use crate::structs::format::DATA_PAYLOAD_BITS;
use crate::structs::hit::MossHit;

const TAG_BITS: u32 = 8 - DATA_PAYLOAD_BITS;

pub struct HitWordWriter<W: io::Write> {
    bs: BitWriter<W, BigEndian>,
    tags: [u8; 3],
}

impl<W: io::Write> HitWordWriter<W> {
    pub fn new(write: W, tags: [u8; 3]) -> Self {
        Self {
            bs: BitWriter::endian(write, BigEndian),
            tags,
        }
    }

    #[inline(always)]
    fn put_n<U: UnsignedInteger>(&mut self, n: u32, value: U) -> io::Result<()> {
        self.bs.write_unsigned_var(n, value)
    }

    /// Writes the DATA_0, DATA_1 and DATA_2 words of `hit`.
    pub fn write_hit(&mut self, hit: &MossHit) -> io::Result<()> {
        // DATA_0: row [8:3]
        self.put_n(TAG_BITS, self.tags[0])?;
        self.put_n(6, (hit.row >> 3) & 0x3F)?;

        // DATA_1: row [2:0], column [8:6]
        self.put_n(TAG_BITS, self.tags[1])?;
        self.put_n(3, hit.row & 0x07)?;
        self.put_n(3, (hit.column >> 6) & 0x07)?;

        // DATA_2: column [5:0]
        self.put_n(TAG_BITS, self.tags[2])?;
        self.put_n(6, hit.column & 0x3F)
    }

    /// Writes a whole marker byte.
    pub fn write_marker(&mut self, marker: u8) -> io::Result<()> {
        self.put_n(8, marker)
    }

    pub fn into_inner(self) -> W {
        self.bs.into_writer()
    }
}
