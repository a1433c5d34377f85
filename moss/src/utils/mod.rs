//! Utility functions and supporting infrastructure.
//!
//! Provides bit-level packing of hit words and the error types shared by the
//! decoder, encoder and packet constructors.

pub mod bitstream_io;
pub mod errors;
