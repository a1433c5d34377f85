use log::{Level, debug, trace};

use crate::log_or_err;
use crate::process::fsm::FrameBody;
use crate::structs::format::FrameFormat;
use crate::structs::packet::MossPacket;
use crate::structs::word::{MossWord, WordTable};
use crate::utils::errors::DecodeError;

const MIN_PREALLOC: usize = 10;

/// How the decoder reacts to a complete frame that violates the protocol.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    /// Abort the decode and report the offset of the offending byte.
    Strict,
    /// Log the frame, drop it and continue from the next frame header.
    #[default]
    Resync,
}

impl DecodeMode {
    /// Level at which frame problems stop the decode.
    pub fn fail_level(self) -> Level {
        match self {
            DecodeMode::Strict => Level::Warn,
            DecodeMode::Resync => Level::Error,
        }
    }
}

/// Options passed into every decode call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeOptions {
    pub mode: DecodeMode,
    pub format: FrameFormat,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            mode: DecodeMode::Strict,
            ..Self::default()
        }
    }

    pub fn resync() -> Self {
        Self {
            mode: DecodeMode::Resync,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }
}

/// Counters collected during a decode pass.
///
/// Only bytes up to [`DecodeResult::consumed`] are counted, so a remainder
/// that is decoded again later is not counted twice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    /// Complete frames (header through trailer) consumed.
    pub frames_seen: usize,
    /// Complete frames dropped in resync mode.
    pub frames_discarded: usize,
    /// Hits carried by the emitted packets.
    pub hits: usize,
    /// Bytes outside frames that were neither idle nor delimiter words.
    pub skipped_bytes: usize,
}

impl std::ops::AddAssign for DecodeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.frames_seen += rhs.frames_seen;
        self.frames_discarded += rhs.frames_discarded;
        self.hits += rhs.hits;
        self.skipped_bytes += rhs.skipped_bytes;
    }
}

/// Packets decoded from a buffer and the boundary of the consumed bytes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    /// Packets in the order their frames appear in the buffer.
    pub packets: Vec<MossPacket>,
    /// Index of the last byte of the last trailer that completed a packet.
    pub last_trailer_idx: Option<usize>,
    /// Number of leading bytes the decoder is done with: complete frames,
    /// frames dropped in resync mode and filler up to the first open header.
    pub consumed: usize,
    pub stats: DecodeStats,
}

impl DecodeResult {
    fn with_capacity(byte_cnt: usize) -> Self {
        Self {
            packets: Vec::with_capacity((byte_cnt / 1024).max(MIN_PREALLOC)),
            ..Self::default()
        }
    }

    /// Last trailer index with `-1` when no packet was decoded.
    pub fn last_trailer_index(&self) -> isize {
        self.last_trailer_idx.map_or(-1, |idx| idx as isize)
    }

    /// Bytes after the last trailer; the whole buffer when no packet was decoded.
    pub fn remainder<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        let start = self.last_trailer_idx.map_or(0, |idx| idx + 1);
        &bytes[start.min(bytes.len())..]
    }

    pub fn remainder_len(&self, byte_cnt: usize) -> usize {
        byte_cnt.saturating_sub(self.last_trailer_idx.map_or(0, |idx| idx + 1))
    }

    pub fn into_packets(self) -> Vec<MossPacket> {
        self.packets
    }
}

/// Decodes every complete unit frame in `bytes`.
///
/// Bytes outside frames are skipped. A frame whose trailer is missing ends
/// the pass and is left in the remainder, so this only fails in
/// [`DecodeMode::Strict`] when a complete frame breaks the protocol.
///
/// # Example
///
/// ```rust
/// use moss::process::decode::{DecodeOptions, decode_multiple_events};
///
/// let bytes = [0xD1, 0xC0, 0xC1, 0xC2, 0xC3, 0xE0, 0xFA, 0xFA];
/// let result = decode_multiple_events(&bytes, &DecodeOptions::default())?;
///
/// assert_eq!(result.packets.len(), 1);
/// assert_eq!(result.last_trailer_idx, Some(5));
/// assert_eq!(result.remainder(&bytes), &[0xFA, 0xFA]);
/// # Ok::<(), moss::utils::errors::DecodeError>(())
/// ```
pub fn decode_multiple_events(
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<DecodeResult, DecodeError> {
    let mut result = DecodeResult::with_capacity(bytes.len());
    decode_into(bytes, options, &mut result)?;
    Ok(result)
}

/// Decodes the first complete frame and returns it with the bytes after its trailer.
///
/// Protocol violations are reported regardless of the mode.
pub fn decode_event<'a>(
    bytes: &'a [u8],
    options: &DecodeOptions,
) -> Result<(MossPacket, &'a [u8]), DecodeError> {
    options.format.validate()?;
    let scanner = Scanner::new(bytes, &options.format);

    let (Some(header_idx), _) = scanner.find_header(0) else {
        return Err(DecodeError::NoHeaderFound);
    };
    let Some(trailer_idx) = scanner.find_trailer(header_idx) else {
        return Err(DecodeError::EndOfBufferNoTrailer { header_idx });
    };

    let packet = scanner.decode_frame(header_idx, trailer_idx)?;
    Ok((packet, &bytes[trailer_idx + 1..]))
}

/// Decode pass that keeps everything decoded before an error in `result`.
pub(crate) fn decode_into(
    bytes: &[u8],
    options: &DecodeOptions,
    result: &mut DecodeResult,
) -> Result<(), DecodeError> {
    options.format.validate()?;

    let mut pass = DecodePass {
        scanner: Scanner::new(bytes, &options.format),
        fail_level: options.mode.fail_level(),
        result,
    };
    pass.run()?;

    debug!(
        "Decoded {} packets from {} bytes, last trailer at {:?}, {} bytes remain",
        pass.result.packets.len(),
        bytes.len(),
        pass.result.last_trailer_idx,
        pass.result.remainder_len(bytes.len())
    );

    Ok(())
}

struct DecodePass<'a, 'r> {
    scanner: Scanner<'a>,
    fail_level: Level,
    result: &'r mut DecodeResult,
}

impl DecodePass<'_, '_> {
    fn run(&mut self) -> Result<(), DecodeError> {
        let mut cursor = 0;
        // Counters for bytes behind `consumed` only; the rest is rescanned later.
        let mut pending = DecodeStats::default();

        while cursor < self.scanner.bytes.len() {
            let (header, skipped) = self.scanner.find_header(cursor);
            pending.skipped_bytes += skipped;

            let Some(header_idx) = header else {
                // Nothing but filler left, none of it can start a frame later.
                self.commit(self.scanner.bytes.len(), &mut pending);
                break;
            };
            let Some(trailer_idx) = self.scanner.find_trailer(header_idx) else {
                trace!("Frame opened at {header_idx} has no trailer yet");
                self.commit(header_idx, &mut pending);
                break;
            };

            pending.frames_seen += 1;

            match self.scanner.decode_frame(header_idx, trailer_idx) {
                Ok(packet) => {
                    trace!("{packet}");
                    pending.hits += packet.hits().len();
                    self.result.packets.push(packet);
                    self.result.last_trailer_idx = Some(trailer_idx);
                    cursor = trailer_idx + 1;
                }
                Err(err) => {
                    log_or_err!(self, Level::Warn, err);
                    pending.frames_discarded += 1;

                    if let Some(next_header) =
                        self.scanner.find_header_within(header_idx + 1, trailer_idx)
                    {
                        cursor = next_header;
                        continue;
                    }
                    cursor = trailer_idx + 1;
                }
            }

            self.commit(cursor, &mut pending);
        }

        Ok(())
    }

    fn commit(&mut self, consumed: usize, pending: &mut DecodeStats) {
        self.result.consumed = consumed;
        self.result.stats += std::mem::take(pending);
    }
}

/// Read-only view of a buffer classified by one format.
struct Scanner<'a> {
    bytes: &'a [u8],
    table: WordTable,
    format: FrameFormat,
}

impl<'a> Scanner<'a> {
    fn new(bytes: &'a [u8], format: &FrameFormat) -> Self {
        Self {
            bytes,
            table: WordTable::new(format),
            format: *format,
        }
    }

    /// Finds the next unit frame header at or after `from`, returning the
    /// count of non-filler bytes passed over.
    fn find_header(&self, from: usize) -> (Option<usize>, usize) {
        let mut skipped = 0;
        for (i, &byte) in self.bytes[from..].iter().enumerate() {
            match self.table.classify(byte) {
                MossWord::UnitFrameHeader(_) => return (Some(from + i), skipped),
                MossWord::Idle | MossWord::Delimiter => (),
                word => {
                    trace!("Skipping {word} at {} outside of a frame", from + i);
                    skipped += 1;
                }
            }
        }

        (None, skipped)
    }

    fn find_header_within(&self, from: usize, to: usize) -> Option<usize> {
        self.bytes[from..to]
            .iter()
            .position(|&b| matches!(self.table.classify(b), MossWord::UnitFrameHeader(_)))
            .map(|i| from + i)
    }

    fn find_trailer(&self, header_idx: usize) -> Option<usize> {
        self.bytes[header_idx + 1..]
            .iter()
            .position(|&b| b == self.format.trailer)
            .map(|i| header_idx + 1 + i)
    }

    fn decode_frame(&self, header_idx: usize, trailer_idx: usize) -> Result<MossPacket, DecodeError> {
        let MossWord::UnitFrameHeader(unit_id) = self.table.classify(self.bytes[header_idx]) else {
            return Err(DecodeError::NoHeaderFound);
        };

        let mut body = FrameBody::new(&self.format);
        for (i, &byte) in self.bytes[header_idx + 1..trailer_idx].iter().enumerate() {
            body.feed(self.table.classify(byte))
                .map_err(|reason| DecodeError::MalformedFrame {
                    index: header_idx + 1 + i,
                    reason,
                })?;
        }

        let hits = body.finish().map_err(|reason| DecodeError::MalformedFrame {
            index: trailer_idx,
            reason,
        })?;

        Ok(MossPacket::from_decoded(unit_id, hits))
    }
}

/// Decodes buffers with a fixed set of [`DecodeOptions`].
#[derive(Debug, Default, Clone)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<DecodeResult, DecodeError> {
        decode_multiple_events(bytes, &self.options)
    }

    pub fn decode_event<'a>(&self, bytes: &'a [u8]) -> Result<(MossPacket, &'a [u8]), DecodeError> {
        decode_event(bytes, &self.options)
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn set_mode(&mut self, mode: DecodeMode) {
        self.options.mode = mode;
    }

    pub fn set_format(&mut self, format: FrameFormat) {
        self.options.format = format;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::test_util::*;
    use crate::structs::hit::MossHit;
    use crate::utils::errors::FrameErrorReason;

    #[test]
    fn empty_buffer() {
        let result = decode_multiple_events(&[], &DecodeOptions::strict()).unwrap();
        assert!(result.packets.is_empty());
        assert_eq!(result.last_trailer_idx, None);
        assert_eq!(result.last_trailer_index(), -1);
        assert_eq!(result.consumed, 0);
        assert_eq!(result.remainder_len(0), 0);
    }

    #[test]
    fn single_event() {
        let event = fake_event_simple();
        let result = decode_multiple_events(&event, &DecodeOptions::strict()).unwrap();

        assert_eq!(result.packets, vec![simple_packet(0)]);
        assert_eq!(result.last_trailer_idx, Some(event.len() - 1));
        assert!(result.remainder(&event).is_empty());
        assert_eq!(result.stats.hits, 3);
    }

    #[test]
    fn trailing_noise_is_remainder() {
        let mut bytes = fake_event_simple();
        let frame_len = bytes.len();
        bytes.extend_from_slice(&[0xFA, 0x12, 0xFA]);

        let result = decode_multiple_events(&bytes, &DecodeOptions::strict()).unwrap();
        assert_eq!(result.packets.len(), 1);
        assert_eq!(result.last_trailer_idx, Some(frame_len - 1));
        assert_eq!(result.remainder(&bytes), &[0xFA, 0x12, 0xFA]);
        assert_eq!(result.remainder_len(bytes.len()), 3);
        assert_eq!(result.consumed, bytes.len());
        assert_eq!(result.stats.skipped_bytes, 1);
    }

    #[test]
    fn filler_before_open_header_is_consumed() {
        let mut bytes = vec![0xFA, 0xFF, 0x12];
        let header_idx = bytes.len();
        bytes.extend_from_slice(&fake_event_simple()[..4]);

        let result = decode_multiple_events(&bytes, &DecodeOptions::strict()).unwrap();
        assert!(result.packets.is_empty());
        assert_eq!(result.last_trailer_idx, None);
        assert_eq!(result.remainder(&bytes), &bytes[..]);
        assert_eq!(result.consumed, header_idx);
        assert_eq!(result.stats.skipped_bytes, 1);
    }

    #[test]
    fn noise_between_frames_is_skipped() {
        let mut bytes = vec![0x12, 0xFA, 0xE0, 0xC1];
        bytes.extend(fake_event_simple());
        bytes.extend_from_slice(&[0xFF, 0x90, 0xFA]);
        bytes.extend(fake_event_simple());

        let result = decode_multiple_events(&bytes, &DecodeOptions::strict()).unwrap();
        assert_eq!(result.packets, vec![simple_packet(0), simple_packet(0)]);
        assert_eq!(result.stats.skipped_bytes, 4);
        assert_eq!(result.last_trailer_idx, Some(bytes.len() - 1));
    }

    #[test]
    fn multiple_events_in_order() {
        let events = fake_multiple_events();
        let result = decode_multiple_events(&events, &DecodeOptions::strict()).unwrap();

        let ids: Vec<u8> = result.packets.iter().map(|p| p.unit_id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(result.last_trailer_idx, Some(events.len() - 1));
        assert!(result.packets[2].is_empty());
        assert_eq!(
            result.packets[3].hits(),
            &[
                MossHit::new(0, 0, 0),
                MossHit::new(1, 1, 1),
                MossHit::new(2, 2, 2),
                MossHit::new(3, 3, 3),
            ]
        );
    }

    #[test]
    fn truncated_frame_is_not_an_error() {
        let mut bytes = fake_event_simple();
        let frame_len = bytes.len();
        bytes.extend_from_slice(&fake_event_simple()[..7]);

        for options in [DecodeOptions::strict(), DecodeOptions::resync()] {
            let result = decode_multiple_events(&bytes, &options).unwrap();
            assert_eq!(result.packets.len(), 1);
            assert_eq!(result.last_trailer_idx, Some(frame_len - 1));
            assert_eq!(result.consumed, frame_len);
            assert_eq!(result.remainder_len(bytes.len()), 7);
        }
    }

    #[test]
    fn only_partial_frame() {
        let bytes = &fake_event_simple()[..10];
        let result = decode_multiple_events(bytes, &DecodeOptions::strict()).unwrap();
        assert!(result.packets.is_empty());
        assert_eq!(result.last_trailer_idx, None);
        assert_eq!(result.remainder(bytes), bytes);
    }

    #[test]
    fn strict_mode_reports_offset() {
        let mut bytes = fake_event_simple();
        bytes.extend(fake_event_protocol_error());
        bytes.extend(fake_event_simple());

        let err = decode_multiple_events(&bytes, &DecodeOptions::strict()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedFrame {
                index: fake_event_simple().len() + 5,
                reason: FrameErrorReason::UnexpectedWord {
                    expected: "DATA_2",
                    found: MossWord::Data1(0x10),
                },
            }
        );
    }

    #[test]
    fn resync_mode_skips_bad_frame() {
        let mut bytes = fake_event_simple();
        bytes.extend(fake_event_protocol_error());
        bytes.extend(fake_event_simple());

        let result = decode_multiple_events(&bytes, &DecodeOptions::resync()).unwrap();
        assert_eq!(result.packets.len(), 2);
        assert_eq!(result.stats.frames_seen, 3);
        assert_eq!(result.stats.frames_discarded, 1);
        assert_eq!(result.last_trailer_idx, Some(bytes.len() - 1));
    }

    #[test]
    fn resync_recovers_header_inside_broken_frame() {
        // First frame lost its trailer; the second frame's header sits inside it.
        let mut bytes = fake_event_simple();
        bytes.pop();
        let second_start = bytes.len();
        bytes.extend(fake_event_simple());

        let err = decode_multiple_events(&bytes, &DecodeOptions::strict()).unwrap_err();
        assert_eq!(err.index(), Some(second_start));

        let result = decode_multiple_events(&bytes, &DecodeOptions::resync()).unwrap();
        assert_eq!(result.packets, vec![simple_packet(0)]);
        assert_eq!(result.last_trailer_idx, Some(bytes.len() - 1));
        assert_eq!(result.stats.frames_discarded, 1);
    }

    #[test]
    fn discarded_trailing_frame_advances_consumed() {
        let mut bytes = fake_event_simple();
        let frame_len = bytes.len();
        bytes.extend(fake_event_protocol_error());

        let result = decode_multiple_events(&bytes, &DecodeOptions::resync()).unwrap();
        assert_eq!(result.packets.len(), 1);
        assert_eq!(result.last_trailer_idx, Some(frame_len - 1));
        assert_eq!(result.consumed, bytes.len());
    }

    #[test]
    fn decode_event_returns_tail() {
        let events = fake_multiple_events();
        let (packet, rest) = decode_event(&events, &DecodeOptions::default()).unwrap();
        assert_eq!(packet, simple_packet(0));
        assert_eq!(rest.len(), events.len() - fake_event_simple().len());

        let (packet, _) = decode_event(rest, &DecodeOptions::default()).unwrap();
        assert_eq!(packet.unit_id(), 1);
    }

    #[test]
    fn decode_event_errors() {
        let options = DecodeOptions::default();
        assert_eq!(
            decode_event(&[0xFF, 0xFA], &options).unwrap_err(),
            DecodeError::NoHeaderFound
        );
        assert_eq!(
            decode_event(&[0xFA, 0xD2, 0xC0], &options).unwrap_err(),
            DecodeError::EndOfBufferNoTrailer { header_idx: 1 }
        );
        assert!(matches!(
            decode_event(&fake_event_protocol_error(), &options),
            Err(DecodeError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn invalid_format_is_rejected() {
        let options = DecodeOptions::default().with_format(FrameFormat {
            idle: 0xE0,
            ..FrameFormat::MOSS_V1
        });
        assert!(matches!(
            decode_multiple_events(&[], &options),
            Err(DecodeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn custom_format() {
        use crate::structs::format::MarkerRange;

        // Two regions, trailer 0xF0, headers 0xE0..=0xE7.
        let format = FrameFormat {
            version: 2,
            trailer: 0xF0,
            unit_header: MarkerRange::new(0xE0, 0x07, 7),
            region_header: MarkerRange::new(0xC0, 0x01, 1),
            ..FrameFormat::MOSS_V1
        };
        let bytes = [0xE5, 0xC0, 0x00, 0x50, 0x88, 0xC1, 0xF0];
        let result = decode_multiple_events(&bytes, &DecodeOptions::strict().with_format(format))
            .unwrap();

        assert_eq!(result.packets.len(), 1);
        assert_eq!(result.packets[0].unit_id(), 5);
        assert_eq!(result.packets[0].hits(), &[MossHit::new(0, 2, 8)]);
    }

    #[test]
    fn decoder_struct() {
        let mut decoder = Decoder::default();
        assert_eq!(decoder.options().mode, DecodeMode::Resync);
        decoder.set_mode(DecodeMode::Strict);

        let result = decoder.decode(&fake_multiple_events()).unwrap();
        assert_eq!(result.packets.len(), 4);
    }
}
