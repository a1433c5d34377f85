//! Decoded content of one unit frame.

use std::fmt::Display;

use crate::structs::format::FrameFormat;
use crate::structs::hit::MossHit;
use crate::utils::errors::PacketError;

/// The hits read out of one unit frame, in stream order.
///
/// Packets are validated on construction and immutable afterwards.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct MossPacket {
    unit_id: u8,
    hits: Vec<MossHit>,
}

impl MossPacket {
    /// Creates a packet checked against [`FrameFormat::MOSS_V1`].
    pub fn new(unit_id: u8, hits: Vec<MossHit>) -> Result<Self, PacketError> {
        Self::with_format(unit_id, hits, &FrameFormat::MOSS_V1)
    }

    /// Creates a packet checked against `format`.
    ///
    /// The format must be valid, the unit id must be addressable by its
    /// header marker, every hit must fit the address width and region count,
    /// and hits must be grouped by ascending region as they appear on the wire.
    pub fn with_format(
        unit_id: u8,
        hits: Vec<MossHit>,
        format: &FrameFormat,
    ) -> Result<Self, PacketError> {
        format.validate()?;
        if unit_id > format.unit_header.max_id {
            return Err(PacketError::UnitIdOutOfRange {
                unit_id,
                max: format.unit_header.max_id,
            });
        }

        let regions = format.regions();
        let mut previous = 0;
        for hit in &hits {
            hit.validate(regions)?;
            if hit.region < previous {
                return Err(PacketError::RegionsNotOrdered {
                    previous,
                    found: hit.region,
                });
            }
            previous = hit.region;
        }

        Ok(Self { unit_id, hits })
    }

    /// Hits produced by the frame state machine are valid by construction.
    pub(crate) fn from_decoded(unit_id: u8, hits: Vec<MossHit>) -> Self {
        debug_assert!(hits.windows(2).all(|w| w[0].region <= w[1].region));
        Self { unit_id, hits }
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    pub fn hits(&self) -> &[MossHit] {
        &self.hits
    }

    pub fn into_hits(self) -> Vec<MossHit> {
        self.hits
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn hits_in_region(&self, region: u8) -> impl Iterator<Item = &MossHit> {
        self.hits.iter().filter(move |hit| hit.region == region)
    }
}

impl Display for MossPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unit ID: {id} Hits: {cnt}", id = self.unit_id, cnt = self.hits.len())?;
        for hit in &self.hits {
            write!(f, "\n {hit}")?;
        }

        Ok(())
    }
}
