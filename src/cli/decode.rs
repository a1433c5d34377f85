use anyhow::{Result, bail};
use indicatif::MultiProgress;
use moss::process::stream::StreamDecoder;

use super::command::{Cli, DecodeArgs};
use super::output::PacketWriter;
use super::progress::{create_progress_bar, packet_message};
use crate::input::InputReader;
use crate::records::StreamSummary;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    if args.chunk_size == 0 {
        bail!("--chunk-size must be at least 1");
    }

    let options = cli.decode_options();
    log::info!(
        "Decoding {} in {:?} mode",
        args.input.display(),
        options.mode
    );

    let mut input_reader = InputReader::new(&args.input)?;
    let total_bytes = if input_reader.is_pipe() {
        None
    } else {
        std::fs::metadata(&args.input).ok().map(|m| m.len())
    };

    let pb = match multi {
        Some(multi) => Some(create_progress_bar(multi, total_bytes)?),
        None => None,
    };

    let mut writer = PacketWriter::create(args.output_path.as_deref(), args.format, &options)?;
    let mut decoder = StreamDecoder::new(options);

    input_reader.process_chunks(args.chunk_size, |chunk| {
        decoder.push_bytes(chunk);

        for result in decoder.by_ref() {
            // Strict mode stops at the first malformed frame.
            let packet = result?;
            writer.write_packet(&packet)?;
        }

        if let Some(ref pb) = pb {
            pb.set_position(decoder.bytes_pushed());
            pb.set_message(packet_message(
                decoder.packets_emitted(),
                decoder.stats().frames_discarded,
            ));
        }

        Ok(true)
    })?;

    let stats = decoder.stats();
    let packets = decoder.packets_emitted();
    let bytes_read = decoder.bytes_pushed();
    let last_trailer = decoder.last_trailer_offset();
    let remainder = remainder_len(bytes_read, last_trailer);
    let open_frame = decoder.finish();

    if let Some(pb) = pb {
        pb.finish_with_message(packet_message(packets, stats.frames_discarded));
    }

    let summary = StreamSummary {
        bytes_read,
        packets: packets as u64,
        last_trailer_offset: last_trailer.map_or(-1, |offset| offset as i64),
        remainder,
        frames_discarded: stats.frames_discarded as u64,
    };
    writer.finish(&summary)?;

    log::info!(
        "Decoded {packets} packets ({} hits) from {bytes_read} bytes",
        stats.hits
    );
    if stats.frames_discarded > 0 {
        log::warn!("Dropped {} malformed frames", stats.frames_discarded);
    }
    if stats.skipped_bytes > 0 {
        log::info!("Skipped {} bytes outside of frames", stats.skipped_bytes);
    }
    if remainder > 0 {
        log::info!("{remainder} bytes after the last trailer were not decoded");
    }
    if !open_frame.is_empty() {
        log::info!(
            "Input ended inside a frame, {} bytes without a trailer",
            open_frame.len()
        );
    }

    Ok(())
}

/// Bytes after the last trailer, the whole input when no packet was decoded.
fn remainder_len(bytes_read: u64, last_trailer: Option<u64>) -> u64 {
    bytes_read - last_trailer.map_or(0, |offset| offset + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moss::process::EXAMPLE_DATA;
    use moss::process::decode::{DecodeOptions, decode_multiple_events};

    #[test]
    fn remainder_counts_dropped_frames() {
        // A frame with regions out of order, then noise.
        let mut bytes = EXAMPLE_DATA.to_vec();
        bytes.extend_from_slice(&[0xD5, 0xC0, 0xC2, 0xC1, 0xC3, 0xE0, 0xFA, 0x12]);

        let mut decoder = StreamDecoder::new(DecodeOptions::resync());
        for chunk in bytes.chunks(5) {
            decoder.push_bytes(chunk);
        }
        assert_eq!(decoder.by_ref().filter(|item| item.is_ok()).count(), 4);

        let expected = decode_multiple_events(&bytes, &DecodeOptions::resync()).unwrap();
        let remainder = remainder_len(decoder.bytes_pushed(), decoder.last_trailer_offset());
        assert_eq!(remainder, 8);
        assert_eq!(remainder as usize, expected.remainder_len(bytes.len()));
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn remainder_without_packets() {
        assert_eq!(remainder_len(0, None), 0);
        assert_eq!(remainder_len(12, None), 12);
        assert_eq!(remainder_len(12, Some(11)), 0);
    }
}
