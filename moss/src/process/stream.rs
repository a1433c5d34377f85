use std::collections::VecDeque;

use log::{debug, error};

use crate::process::decode::{DecodeOptions, DecodeResult, DecodeStats, decode_into};
use crate::structs::packet::MossPacket;
use crate::utils::errors::{DecodeError, FrameErrorReason};

/// Decodes packets from data that arrives in chunks.
///
/// A frame whose trailer has not arrived yet is kept and prepended to the
/// next chunk, so a frame split across chunk boundaries is emitted once, when
/// its trailer arrives. Filler outside frames is dropped as soon as it is
/// scanned.
///
/// # Example
///
/// ```rust
/// use moss::process::stream::StreamDecoder;
///
/// let mut decoder = StreamDecoder::default();
///
/// decoder.push_bytes(&[0xD1, 0xC0, 0xC1]);
/// assert_eq!(decoder.by_ref().count(), 0);
///
/// decoder.push_bytes(&[0xC2, 0xC3, 0xE0, 0xFA, 0xD2]);
/// let packet = decoder.next().unwrap()?;
/// assert_eq!(packet.unit_id(), 1);
/// assert_eq!(decoder.pending(), &[0xD2]);
/// # Ok::<(), moss::utils::errors::DecodeError>(())
/// ```
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    ready: VecDeque<Result<MossPacket, DecodeError>>,
    options: DecodeOptions,
    stats: DecodeStats,
    stream_offset: u64,
    last_trailer_offset: Option<u64>,
    packets_emitted: usize,
}

impl StreamDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Adds raw stream data and decodes every frame it completes.
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        self.process();
    }

    /// Bytes held back because they belong to a frame with no trailer yet.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Absolute stream offset of the last trailer that completed a packet.
    pub fn last_trailer_offset(&self) -> Option<u64> {
        self.last_trailer_offset
    }

    /// Total bytes pushed so far.
    pub fn bytes_pushed(&self) -> u64 {
        self.stream_offset + self.buffer.len() as u64
    }

    pub fn packets_emitted(&self) -> usize {
        self.packets_emitted
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Ends the stream and returns the bytes of the frame left open, if any.
    pub fn finish(self) -> Vec<u8> {
        if !self.buffer.is_empty() {
            debug!(
                "Stream ended inside a frame, {} bytes from offset {}",
                self.buffer.len(),
                self.stream_offset
            );
        }
        self.buffer
    }

    fn process(&mut self) {
        loop {
            let mut result = DecodeResult::default();
            let outcome = decode_into(&self.buffer, &self.options, &mut result);
            self.absorb(&result);

            match outcome {
                Ok(()) => {
                    self.consume(result.consumed);
                    return;
                }
                Err(err) => {
                    // Drop the offending frame and carry on behind its trailer,
                    // or at the header that interrupted it.
                    let resume = match &err {
                        DecodeError::MalformedFrame {
                            index,
                            reason: FrameErrorReason::NestedHeader { .. },
                        } => *index,
                        DecodeError::MalformedFrame { index, .. } => self.buffer[*index..]
                            .iter()
                            .position(|&b| b == self.options.format.trailer)
                            .map_or(self.buffer.len(), |i| index + i + 1),
                        _ => self.buffer.len(),
                    };
                    let err = match err {
                        DecodeError::MalformedFrame { index, reason } => {
                            DecodeError::MalformedFrame {
                                index: self.stream_offset as usize + index,
                                reason,
                            }
                        }
                        other => other,
                    };
                    error!("{err}");
                    self.ready.push_back(Err(err));
                    self.consume(resume);
                }
            }
        }
    }

    fn absorb(&mut self, result: &DecodeResult) {
        if let Some(idx) = result.last_trailer_idx {
            self.last_trailer_offset = Some(self.stream_offset + idx as u64);
        }
        self.stats += result.stats;
        self.packets_emitted += result.packets.len();
        self.ready.extend(result.packets.iter().cloned().map(Ok));
    }

    fn consume(&mut self, cnt: usize) {
        self.buffer.drain(..cnt);
        self.stream_offset += cnt as u64;
    }
}

impl Iterator for StreamDecoder {
    type Item = Result<MossPacket, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ready.pop_front()
    }
}
