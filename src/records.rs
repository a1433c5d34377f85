//! Binary packet record files.
//!
//! A record file starts with the `moss` magic, a file version and a flags
//! word, followed by chunks. Each chunk is a four-byte type, a big-endian
//! `u64` payload size and the payload. A `desc` chunk comes first, `pkts`
//! chunks carry packets and a closing `summ` chunk carries stream totals.

use std::io::{self, Write};

use moss::process::decode::{DecodeMode, DecodeOptions};
use moss::structs::packet::MossPacket;
use mossd_macros::{ToBytes, record_chunk};
use serde::Serialize;

pub const RECORD_MAGIC: &[u8; 4] = b"moss";
pub const RECORD_VERSION: u16 = 1;

pub fn write_record_file_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writer.write_all(RECORD_MAGIC)?;
    writer.write_all(&RECORD_VERSION.to_be_bytes())?;
    writer.write_all(&0u16.to_be_bytes())?;

    Ok(())
}

pub trait RecordChunk {
    fn chunk_type(&self) -> &[u8; 4];
    fn chunk_data(&self) -> Vec<u8>;

    fn write_all<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let chunk_data = self.chunk_data();

        writer.write_all(self.chunk_type())?;
        writer.write_all(&(chunk_data.len() as u64).to_be_bytes())?;
        writer.write_all(&chunk_data)?;

        Ok(())
    }
}

/// Layout the packets were decoded with.
#[derive(Debug, Clone, PartialEq, ToBytes)]
#[record_chunk(b"desc")]
pub struct StreamDescription {
    pub format_version: u8,
    pub max_unit_id: u8,
    pub regions: u8,
    /// 0 for resync, 1 for strict.
    pub strict: u8,
}

impl StreamDescription {
    pub fn new(options: &DecodeOptions) -> Self {
        Self {
            format_version: options.format.version,
            max_unit_id: options.format.unit_header.max_id,
            regions: options.format.regions(),
            strict: u8::from(options.mode == DecodeMode::Strict),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToBytes)]
pub struct HitRecord {
    pub region: u8,
    pub row: u16,
    pub column: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToBytes)]
pub struct PacketRecord {
    pub unit_id: u8,
    pub hit_count: u32,
    pub hits: Vec<HitRecord>,
}

impl From<&MossPacket> for PacketRecord {
    fn from(packet: &MossPacket) -> Self {
        Self {
            unit_id: packet.unit_id(),
            hit_count: packet.hits().len() as u32,
            hits: packet
                .hits()
                .iter()
                .map(|hit| HitRecord {
                    region: hit.region,
                    row: hit.row,
                    column: hit.column,
                })
                .collect(),
        }
    }
}

/// A run of consecutive packets.
#[derive(Debug, Clone, Default, PartialEq, ToBytes)]
#[record_chunk(b"pkts")]
pub struct PacketChunk {
    pub packet_count: u32,
    pub packets: Vec<PacketRecord>,
}

/// Totals written when the stream ends.
#[derive(Debug, Clone, PartialEq, ToBytes)]
#[record_chunk(b"summ")]
pub struct StreamSummary {
    pub bytes_read: u64,
    pub packets: u64,
    /// Absolute offset of the last trailer, -1 if none.
    pub last_trailer_offset: i64,
    pub remainder: u64,
    pub frames_discarded: u64,
}

/// Writes packets into a record file, one `pkts` chunk per batch.
pub struct RecordWriter<W: Write> {
    writer: W,
    pending: PacketChunk,
    batch_size: usize,
    packets_written: u64,
    chunks_written: u64,
    header_written: bool,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, batch_size: usize) -> Self {
        Self {
            writer,
            pending: PacketChunk::default(),
            batch_size: batch_size.max(1),
            packets_written: 0,
            chunks_written: 0,
            header_written: false,
        }
    }

    /// Writes the file header and the `desc` chunk. Must come first.
    pub fn write_header(&mut self, description: &StreamDescription) -> io::Result<()> {
        if self.header_written {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "record header already written",
            ));
        }

        write_record_file_header(&mut self.writer)?;
        description.write_all(&mut self.writer)?;
        self.header_written = true;
        Ok(())
    }

    pub fn write_packet(&mut self, packet: &MossPacket) -> io::Result<()> {
        self.ensure_header_written()?;

        self.pending.packets.push(PacketRecord::from(packet));
        self.pending.packet_count += 1;
        if self.pending.packets.len() >= self.batch_size {
            self.flush_packets()?;
        }
        Ok(())
    }

    /// Writes the last batch and the `summ` chunk, then returns the writer.
    pub fn finish(mut self, summary: &StreamSummary) -> io::Result<W> {
        self.ensure_header_written()?;
        self.flush_packets()?;
        summary.write_all(&mut self.writer)?;
        self.writer.flush()?;

        log::debug!(
            "Wrote {} packets in {} chunks",
            self.packets_written,
            self.chunks_written
        );
        Ok(self.writer)
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written + self.pending.packets.len() as u64
    }

    fn flush_packets(&mut self) -> io::Result<()> {
        if self.pending.packets.is_empty() {
            return Ok(());
        }

        let chunk = std::mem::take(&mut self.pending);
        chunk.write_all(&mut self.writer)?;
        self.packets_written += chunk.packets.len() as u64;
        self.chunks_written += 1;
        Ok(())
    }

    fn ensure_header_written(&self) -> io::Result<()> {
        if self.header_written {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Must call write_header() before writing packets",
            ))
        }
    }
}
