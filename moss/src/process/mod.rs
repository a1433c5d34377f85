/// Decoding of unit frames into packets.
///
/// Provides [`decode_multiple_events`](decode::decode_multiple_events), the
/// single-frame [`decode_event`](decode::decode_event) and the
/// [`Decoder`](decode::Decoder) wrapper holding [`DecodeOptions`](decode::DecodeOptions).
pub mod decode;

/// Serialization of packets into unit frames.
pub mod encode;

/// Protocol state machine for the body of a unit frame.
mod fsm;

/// Incremental decoding of data that arrives in chunks.
///
/// Provides the [`StreamDecoder`](stream::StreamDecoder), which keeps the
/// frame still waiting for its trailer between pushes.
pub mod stream;

/// Four frames from units 0 to 3 with a mix of hits, idle words and an empty frame.
pub const EXAMPLE_DATA: &[u8] = &[
    0xD0, 0xFF, 0xFF, 0xC0, 0x00, 0x50, 0x88, 0xC1, 0x25, 0x6E, 0xB1, 0xC2, 0xC3, 0x00, 0x50, 0x88,
    0xE0, 0xD1, 0xFF, 0xFF, 0xC0, 0x00, 0x50, 0x88, 0xC1, 0x25, 0x6E, 0xB1, 0xC2, 0xC3, 0x00, 0x50,
    0x88, 0xE0, 0xD2, 0xC0, 0xC1, 0xC2, 0xFF, 0xC3, 0xE0, 0xD3, 0xC0, 0x00, 0x40, 0x80, 0xC1, 0x00,
    0x48, 0x81, 0xC2, 0x00, 0x50, 0x82, 0xC3, 0x00, 0x58, 0x83, 0xFF, 0xE0,
];

#[cfg(test)]
pub(crate) mod test_util {
    use crate::structs::hit::MossHit;
    use crate::structs::packet::MossPacket;

    pub(crate) const IDLE: u8 = 0xFF;
    pub(crate) const UNIT_FRAME_TRAILER: u8 = 0xE0;
    pub(crate) const UNIT_FRAME_HEADER_0: u8 = 0xD0;
    pub(crate) const REGION_HEADER_0: u8 = 0xC0;
    pub(crate) const REGION_HEADER_1: u8 = 0xC1;
    pub(crate) const REGION_HEADER_2: u8 = 0xC2;
    pub(crate) const REGION_HEADER_3: u8 = 0xC3;

    pub(crate) fn fake_event_simple() -> Vec<u8> {
        vec![
            UNIT_FRAME_HEADER_0,
            IDLE,
            IDLE,
            REGION_HEADER_0,
            // row 2, col 8
            0x00,
            0x50,
            0x88,
            REGION_HEADER_1,
            // row 301, col 433
            0x25,
            0x6E,
            0xB1,
            REGION_HEADER_2,
            REGION_HEADER_3,
            // row 2, col 8
            0x00,
            0x50,
            0x88,
            UNIT_FRAME_TRAILER,
        ]
    }

    /// The packet decoded from [`fake_event_simple`] with a different unit id.
    pub(crate) fn simple_packet(unit_id: u8) -> MossPacket {
        MossPacket::new(
            unit_id,
            vec![
                MossHit::new(0, 2, 8),
                MossHit::new(1, 301, 433),
                MossHit::new(3, 2, 8),
            ],
        )
        .unwrap()
    }

    pub(crate) fn fake_multiple_events() -> Vec<u8> {
        super::EXAMPLE_DATA.to_vec()
    }

    /// DATA_1 repeated where DATA_2 is expected, at offset 5.
    pub(crate) fn fake_event_protocol_error() -> Vec<u8> {
        vec![
            0xD1,
            REGION_HEADER_0,
            REGION_HEADER_1,
            0x00,
            0x50,
            0x50,
            0x88,
            REGION_HEADER_2,
            REGION_HEADER_3,
            UNIT_FRAME_TRAILER,
        ]
    }

    #[test]
    fn example_data_decodes() {
        use crate::process::decode::{DecodeOptions, decode_multiple_events};

        let result = decode_multiple_events(super::EXAMPLE_DATA, &DecodeOptions::strict()).unwrap();
        assert_eq!(result.packets.len(), 4);
        assert_eq!(result.packets[1], simple_packet(1));
    }
}
