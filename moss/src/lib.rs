#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Decoder for the readout stream of MOSS sensors. Every sensor unit sends
//! its hits in a unit frame: a header byte naming the unit, one region header
//! per region in ascending order, three data words per hit and a trailer.
//!
//! ### Stream Organization
//!
//! **Between frames**: idle and delimiter words, plus whatever noise a link
//! produced. None of it is an error.
//! **Inside a frame**: region headers, hit data words and idle padding.
//!
//! ### Word Layout
//!
//! | Word                | MOSS v1 bytes | Payload                        |
//! |---------------------|---------------|--------------------------------|
//! | `UNIT_FRAME_HEADER` | `0xD0..=0xD9` | unit id in the low nibble      |
//! | `REGION_HEADER`     | `0xC0..=0xC3` | region id in the low two bits  |
//! | `DATA_0`            | `0x00..=0x3F` | row\[8:3\]                     |
//! | `DATA_1`            | `0x40..=0x7F` | row\[2:0\], column\[8:6\]      |
//! | `DATA_2`            | `0x80..=0xBF` | column\[5:0\]                  |
//! | `UNIT_FRAME_TRAILER`| `0xE0`        |                                |
//! | `IDLE`              | `0xFF`        |                                |
//! | `DELIMITER`         | `0xFA`        |                                |
//!
//! The layout is not hard-coded: every decode call takes a
//! [`structs::format::FrameFormat`].
//!
//! ## Quick Start
//!
//! ```rust
//! use moss::process::{EXAMPLE_DATA, decode::{DecodeOptions, decode_multiple_events}};
//!
//! let result = decode_multiple_events(EXAMPLE_DATA, &DecodeOptions::default())?;
//!
//! for packet in &result.packets {
//!     println!("{packet}");
//! }
//!
//! // Bytes after the last trailer belong to the next chunk.
//! let rest = result.remainder(EXAMPLE_DATA);
//! assert!(rest.is_empty());
//! # Ok::<(), moss::utils::errors::DecodeError>(())
//! ```
//!
//! For data arriving in chunks, use [`process::stream::StreamDecoder`].

/// Decoding and encoding of unit frames.
///
/// 1. **Decoding** ([`process::decode`]): Finds complete frames in a buffer
///    and turns them into packets.
///
/// 2. **Streaming** ([`process::stream`]): Carries partial frames across
///    chunk boundaries.
///
/// 3. **Encoding** ([`process::encode`]): Writes packets back as frames.
pub mod process;

/// Data structures of the readout protocol.
///
/// - **Frame Format** ([`structs::format`]): Byte layout of a stream
/// - **Protocol Words** ([`structs::word`]): Byte classification
/// - **Hits** ([`structs::hit`]): Pixel addresses
/// - **Packets** ([`structs::packet`]): Hits of one unit frame
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level packing of data words
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
