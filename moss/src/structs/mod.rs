//! Data structures representing readout stream components.
//!
//! Contains the byte layout description, the classification of stream
//! words, and the hits and packets produced by decoding.

pub mod format;
pub mod hit;
pub mod packet;
pub mod word;
