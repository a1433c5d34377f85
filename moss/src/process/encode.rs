use crate::structs::format::FrameFormat;
use crate::structs::packet::MossPacket;
use crate::utils::bitstream_io::HitWordWriter;
use crate::utils::errors::{EncodeError, PacketError};

/// Serializes packets into unit frames.
///
/// Every frame carries all region headers in ascending order, each followed
/// by the hits of that region. `region_padding` idle words are inserted after
/// the data of every region.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    format: FrameFormat,
    region_padding: usize,
}

impl Encoder {
    /// Creates an encoder for `format`, which must pass [`FrameFormat::validate`].
    pub fn new(format: FrameFormat) -> Result<Self, EncodeError> {
        format.validate()?;
        Ok(Self {
            format,
            region_padding: 0,
        })
    }

    pub fn set_region_padding(&mut self, idle_words: usize) {
        self.region_padding = idle_words;
    }

    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// Appends one frame for `packet` to `dst`.
    pub fn encode(&self, packet: &MossPacket, dst: &mut Vec<u8>) -> Result<(), EncodeError> {
        let format = &self.format;
        let header = format
            .unit_header
            .marker(packet.unit_id())
            .ok_or(PacketError::UnitIdOutOfRange {
                unit_id: packet.unit_id(),
                max: format.unit_header.max_id,
            })?;
        for hit in packet.hits() {
            hit.validate(format.regions())?;
        }

        let mut writer = HitWordWriter::new(
            Vec::with_capacity(2 + format.region_header.count() + packet.hits().len() * 3),
            format.data_tags,
        );
        writer.write_marker(header)?;

        for region in 0..format.regions() {
            writer.write_marker(format.region_header.base | region)?;

            for hit in packet.hits_in_region(region) {
                writer.write_hit(hit)?;
            }
            for _ in 0..self.region_padding {
                writer.write_marker(format.idle)?;
            }
        }

        writer.write_marker(format.trailer)?;
        dst.extend(writer.into_inner());

        Ok(())
    }

    /// Appends one frame per packet to `dst`, in order.
    pub fn encode_all<'a>(
        &self,
        packets: impl IntoIterator<Item = &'a MossPacket>,
        dst: &mut Vec<u8>,
    ) -> Result<(), EncodeError> {
        for packet in packets {
            self.encode(packet, dst)?;
        }

        Ok(())
    }
}

/// Encodes `packet` with the MOSS v1 layout.
pub fn encode_packet(packet: &MossPacket, dst: &mut Vec<u8>) -> Result<(), EncodeError> {
    Encoder::default().encode(packet, dst)
}

/// Encodes `packets` with the MOSS v1 layout into a new buffer.
pub fn encode_packets(packets: &[MossPacket]) -> Result<Vec<u8>, EncodeError> {
    let mut dst = Vec::new();
    Encoder::default().encode_all(packets, &mut dst)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::decode::{DecodeOptions, decode_multiple_events};
    use crate::structs::hit::MossHit;

    #[test]
    fn encode_simple_frame() -> anyhow::Result<()> {
        let packet = MossPacket::new(
            0,
            vec![
                MossHit::new(0, 2, 8),
                MossHit::new(1, 301, 433),
                MossHit::new(3, 2, 8),
            ],
        )?;

        let mut bytes = Vec::new();
        encode_packet(&packet, &mut bytes)?;

        assert_eq!(
            bytes,
            vec![
                0xD0, 0xC0, 0x00, 0x50, 0x88, 0xC1, 0x25, 0x6E, 0xB1, 0xC2, 0xC3, 0x00, 0x50, 0x88,
                0xE0
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_packet_with_padding() -> anyhow::Result<()> {
        let mut encoder = Encoder::default();
        encoder.set_region_padding(1);

        let mut bytes = Vec::new();
        encoder.encode(&MossPacket::new(9, Vec::new())?, &mut bytes)?;

        assert_eq!(
            bytes,
            vec![0xD9, 0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF, 0xC3, 0xFF, 0xE0]
        );
        Ok(())
    }

    #[test]
    fn decode_reproduces_encoded_packets() -> anyhow::Result<()> {
        let packets = vec![
            MossPacket::new(4, vec![MossHit::new(2, 511, 0), MossHit::new(2, 0, 511)])?,
            MossPacket::new(5, Vec::new())?,
        ];

        let mut encoder = Encoder::default();
        encoder.set_region_padding(2);
        let mut bytes = Vec::new();
        encoder.encode_all(&packets, &mut bytes)?;

        let result = decode_multiple_events(&bytes, &DecodeOptions::strict())?;
        assert_eq!(result.packets, packets);
        Ok(())
    }

    #[test]
    fn undecodable_format_is_rejected() {
        // Trailer inside the DATA_0 range.
        let format = FrameFormat {
            trailer: 0x10,
            ..FrameFormat::MOSS_V1
        };
        assert!(matches!(
            Encoder::new(format),
            Err(EncodeError::InvalidFormat(_))
        ));
        assert!(matches!(
            MossPacket::with_format(0, Vec::new(), &format),
            Err(PacketError::InvalidFormat(_))
        ));
    }

    #[test]
    fn custom_format_round_trip() -> anyhow::Result<()> {
        use crate::structs::format::MarkerRange;

        let format = FrameFormat {
            version: 2,
            trailer: 0xF0,
            unit_header: MarkerRange::new(0xE0, 0x07, 7),
            region_header: MarkerRange::new(0xC0, 0x01, 1),
            ..FrameFormat::MOSS_V1
        };
        let packet = MossPacket::with_format(5, vec![MossHit::new(1, 2, 8)], &format)?;

        let mut bytes = Vec::new();
        Encoder::new(format)?.encode(&packet, &mut bytes)?;
        assert_eq!(bytes, vec![0xE5, 0xC0, 0xC1, 0x00, 0x50, 0x88, 0xF0]);

        let result = decode_multiple_events(&bytes, &DecodeOptions::strict().with_format(format))?;
        assert_eq!(result.packets, vec![packet]);
        Ok(())
    }
}
