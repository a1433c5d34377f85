use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use moss::process::decode::DecodeOptions;
use moss::structs::packet::MossPacket;

use super::command::OutputFormat;
use crate::records::{PacketRecord, RecordWriter, StreamDescription, StreamSummary};

/// Packets per `pkts` chunk in record files.
const RECORD_BATCH: usize = 1024;

pub fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    match base_path.extension() {
        Some(existing_ext) if existing_ext == expected_ext => base_path.to_path_buf(),
        Some(_) => {
            let mut name = base_path.as_os_str().to_os_string();
            name.push(".");
            name.push(expected_ext);
            PathBuf::from(name)
        }
        None => base_path.with_extension(expected_ext),
    }
}

fn open_output(path: Option<&Path>, format: OutputFormat) -> Result<(Box<dyn Write>, String)> {
    let Some(path) = path else {
        return Ok((Box::new(BufWriter::new(io::stdout().lock())), "stdout".into()));
    };

    let path = match format {
        OutputFormat::Text => path.to_path_buf(),
        OutputFormat::Yaml => create_path_with_extension(path, "yaml"),
        OutputFormat::Records => create_path_with_extension(path, "mossr"),
    };
    let file =
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok((Box::new(BufWriter::new(file)), path.display().to_string()))
}

pub enum PacketWriter {
    Text(Box<dyn Write>),
    Yaml(Box<dyn Write>),
    Records(RecordWriter<Box<dyn Write>>),
}

impl PacketWriter {
    /// Opens `path` (stdout when `None`) for packets in `format`.
    pub fn create(
        path: Option<&Path>,
        format: OutputFormat,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let (writer, name) = open_output(path, format)?;
        log::info!("Writing {format:?} packets to {name}");

        Ok(match format {
            OutputFormat::Text => PacketWriter::Text(writer),
            OutputFormat::Yaml => PacketWriter::Yaml(writer),
            OutputFormat::Records => {
                let mut records = RecordWriter::new(writer, RECORD_BATCH);
                records.write_header(&StreamDescription::new(options))?;
                PacketWriter::Records(records)
            }
        })
    }

    pub fn write_packet(&mut self, packet: &MossPacket) -> Result<()> {
        match self {
            PacketWriter::Text(w) => writeln!(w, "{packet}")?,
            PacketWriter::Yaml(w) => {
                // A one-element sequence per packet keeps the file a single YAML list.
                let yaml = serde_yaml_ng::to_string(&[PacketRecord::from(packet)])?;
                w.write_all(yaml.as_bytes())?;
            }
            PacketWriter::Records(w) => w.write_packet(packet)?,
        }
        Ok(())
    }

    pub fn finish(self, summary: &StreamSummary) -> Result<()> {
        match self {
            PacketWriter::Text(mut w) | PacketWriter::Yaml(mut w) => w.flush()?,
            PacketWriter::Records(w) => {
                if w.packets_written() != summary.packets {
                    log::warn!(
                        "Record file holds {} packets, stream produced {}",
                        w.packets_written(),
                        summary.packets
                    );
                }
                w.finish(summary)?;
            }
        }
        Ok(())
    }
}
