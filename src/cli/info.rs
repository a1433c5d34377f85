use std::fmt::Write as _;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use moss::process::decode::{DecodeResult, decode_multiple_events};

use super::command::{Cli, InfoArgs};
use crate::input::InputReader;

/// Remainder bytes shown before the listing is cut short.
const MAX_REMAINDER_SHOWN: usize = 64;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing readout stream: {}", args.input.display());

    let spinner = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb.set_message("Reading input...");
            Some(pb)
        }
        None => None,
    };

    let bytes = InputReader::new(&args.input)?.read_all()?;
    if let Some(ref pb) = spinner {
        pb.set_message(format!("Decoding {} bytes...", bytes.len()));
    }

    let result = decode_multiple_events(&bytes, &cli.decode_options())?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    print!("{}", format_report(&bytes, &result)?);

    Ok(())
}

/// Builds the summary printed by `info`.
fn format_report(bytes: &[u8], result: &DecodeResult) -> Result<String, std::fmt::Error> {
    let byte_count = bytes.len();
    let last_byte_idx = byte_count as isize - 1;
    let last_trailer_idx = result.last_trailer_index();
    let remainder = result.remainder(bytes);

    let mut out = String::new();
    writeln!(out, "Read {byte_count} bytes")?;
    writeln!(out, "Decoded {} packets", result.packets.len())?;
    writeln!(
        out,
        "Last trailer at index: {last_trailer_idx}/{last_byte_idx}"
    )?;
    writeln!(out, "Remainder: {} byte(s)", last_byte_idx - last_trailer_idx)?;

    if !remainder.is_empty() {
        let shown = &remainder[..remainder.len().min(MAX_REMAINDER_SHOWN)];
        let mut hex = shown
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        if shown.len() < remainder.len() {
            hex.push_str(" ...");
        }
        writeln!(out, "Remainder byte(s): {hex}")?;
    }

    let stats = &result.stats;
    writeln!(out, "Hits: {}", stats.hits)?;
    if stats.frames_discarded > 0 {
        writeln!(
            out,
            "Dropped frames: {}/{}",
            stats.frames_discarded, stats.frames_seen
        )?;
    }
    if stats.skipped_bytes > 0 {
        writeln!(out, "Skipped bytes outside frames: {}", stats.skipped_bytes)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use moss::process::EXAMPLE_DATA;
    use moss::process::decode::DecodeOptions;

    #[test]
    fn report_with_remainder() {
        let mut bytes = EXAMPLE_DATA.to_vec();
        bytes.extend_from_slice(&[0xFA, 0xD1, 0xC0]);

        let result = decode_multiple_events(&bytes, &DecodeOptions::default()).unwrap();
        let report = format_report(&bytes, &result).unwrap();

        let last = EXAMPLE_DATA.len() as isize - 1;
        assert!(report.contains(&format!("Read {} bytes\n", bytes.len())));
        assert!(report.contains("Decoded 4 packets\n"));
        assert!(report.contains(&format!("Last trailer at index: {last}/{}\n", last + 3)));
        assert!(report.contains("Remainder: 3 byte(s)\n"));
        assert!(report.contains("Remainder byte(s): FA D1 C0\n"));
    }

    #[test]
    fn report_without_packets() {
        let result = decode_multiple_events(&[], &DecodeOptions::default()).unwrap();
        let report = format_report(&[], &result).unwrap();

        assert!(report.contains("Last trailer at index: -1/-1\n"));
        assert!(report.contains("Remainder: 0 byte(s)\n"));
        assert!(!report.contains("Remainder byte(s)"));
    }

    #[test]
    fn report_counts_dropped_frames() -> Result<()> {
        let mut bytes = vec![0x12];
        bytes.extend_from_slice(EXAMPLE_DATA);
        bytes.extend_from_slice(&[0xD5, 0xC0, 0xC2, 0xC1, 0xC3, 0xE0]);

        let result = decode_multiple_events(&bytes, &DecodeOptions::resync())?;
        let report = format_report(&bytes, &result)?;

        assert!(report.contains("Decoded 4 packets\n"));
        assert!(report.contains("Remainder: 6 byte(s)\n"));
        assert!(report.contains("Dropped frames: 1/5\n"));
        assert!(report.contains("Skipped bytes outside frames: 1\n"));
        Ok(())
    }
}
