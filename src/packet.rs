//! Addressed-packet codec for the TTC bus.
//!
//! This module implements the variable-length, self-delimited frame format
//! carried on the telemetry/telecommand bus:
//!
//! ```text
//! [START=0x7E][SRC:1][DST:1][LEN:1][TYPE:1][PAYLOAD:0..248][CRC16:2]
//! ```
//!
//! The CRC16 is computed with seed 0 over `SRC..PAYLOAD` inclusive and
//! transmitted big-endian. Decoding is incremental: [`PacketCodec`] consumes
//! one byte at a time so it can run directly against a byte stream without
//! buffering a whole frame first. Each bus using this format owns one codec
//! instance; the decode cursor is a field of that instance, never shared
//! between buses.
//!
//! ## Error recovery
//!
//! Every terminal decode outcome except "more bytes needed" returns the
//! cursor to the start-marker state, so a corrupt frame costs at most one
//! frame of desynchronization. A packet addressed to another node is
//! consumed to the end to keep the stream in sync, but is never surfaced as
//! a completed packet.

use crate::consts::{
    CRC16_SEED, PAYLOAD_MAX_LEN, PAYLOAD_MAX_LEN_USIZE, PKT_MAX_LEN_USIZE, PKT_START,
};
use crate::crc::crc16_ccitt;
use heapless::Vec;
use thiserror::Error;

/// Byte position of the start marker.
const POS_START: u16 = 0;
/// Byte position of the source address.
const POS_SRC: u16 = 1;
/// Byte position of the destination address.
const POS_DST: u16 = 2;
/// Byte position of the payload length.
const POS_LEN: u16 = 3;
/// Byte position of the frame type.
const POS_TYPE: u16 = 4;
/// Offset subtracted from the cursor to index into the payload.
const PAYLOAD_OFFSET: u16 = 5;

/// Addressed-packet frame types.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Data packet, no acknowledgement requested.
    Data = 1,
    /// Data packet, acknowledgement requested.
    DataAck = 2,
    /// Command packet, no acknowledgement requested.
    Command = 3,
    /// Command packet, acknowledgement requested.
    CommandAck = 4,
    /// Positive acknowledgement.
    Ack = 5,
    /// Negative acknowledgement.
    Nack = 6,
}

impl PacketType {
    fn from_wire(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(PacketType::Data),
            2 => Some(PacketType::DataAck),
            3 => Some(PacketType::Command),
            4 => Some(PacketType::CommandAck),
            5 => Some(PacketType::Ack),
            6 => Some(PacketType::Nack),
            _ => None,
        }
    }
}

/// Terminal decode failures.
///
/// Except for [`DecodeError::BadStart`], which leaves the cursor parked at
/// the start-marker state, and the mid-frame [`DecodeError::WrongAddress`]
/// report, every variant resets the decoder to the start-marker state.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A byte other than the start marker arrived while waiting for a frame.
    #[error("expected start marker, got {byte:#04x}")]
    BadStart {
        /// The offending byte.
        byte: u8,
    },
    /// The frame is addressed to another node.
    ///
    /// Reported once at the destination byte and again at the final CRC
    /// byte of a well-formed frame; the bytes in between are consumed
    /// silently so the decoder stays aligned with the stream.
    #[error("packet addressed to node {dst:#04x}")]
    WrongAddress {
        /// Destination address carried by the frame.
        dst: u8,
    },
    /// The length byte exceeds the maximum payload length.
    #[error("payload length {len} exceeds maximum")]
    PayloadTooLong {
        /// The length byte as received.
        len: u8,
    },
    /// The frame-type byte is not a known tag.
    #[error("unknown frame type tag {tag:#04x}")]
    UnknownType {
        /// The tag byte as received.
        tag: u8,
    },
    /// The received CRC16 does not match the computed one.
    #[error("crc mismatch: computed {expected:#06x}, received {actual:#06x}")]
    CrcMismatch {
        /// CRC computed over the received header and payload.
        expected: u16,
        /// CRC carried by the frame.
        actual: u16,
    },
    /// The cursor advanced past the end of the frame.
    #[error("decode cursor overran the frame at position {pos}")]
    Overrun {
        /// Cursor position at which the overrun was detected.
        pos: u16,
    },
}

/// A complete addressed packet.
///
/// The start marker and CRC are wire artifacts: they are produced by
/// [`Packet::encode`] and checked during decode, but not stored.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Address of the sending node.
    pub src_addr: u8,
    /// Address of the receiving node.
    pub dst_addr: u8,
    /// Frame type.
    pub packet_type: PacketType,
    /// Payload bytes.
    pub payload: Vec<u8, PAYLOAD_MAX_LEN_USIZE>,
}

impl Packet {
    /// Serializes the packet into its wire form, appending the CRC16.
    pub fn encode(&self) -> Vec<u8, PKT_MAX_LEN_USIZE> {
        let mut out = Vec::new();
        let _ = out.push(PKT_START);
        let _ = out.push(self.src_addr);
        let _ = out.push(self.dst_addr);
        let _ = out.push(self.payload.len() as u8);
        let _ = out.push(self.packet_type as u8);
        let _ = out.extend_from_slice(&self.payload);
        let crc = crc16_ccitt(CRC16_SEED, &out[1..]);
        let _ = out.extend_from_slice(&crc.to_be_bytes());
        out
    }
}

/// Incremental encoder/decoder for one addressed-packet bus.
///
/// Holds the node address used for destination filtering and for the source
/// field of outgoing packets, plus the decode cursor for the byte stream of
/// its bus. Create one instance per bus at initialization and keep it for
/// the lifetime of the process.
#[derive(Debug)]
pub struct PacketCodec {
    address: u8,
    pos: u16,
    wrong_dst: bool,
    src_addr: u8,
    dst_addr: u8,
    length: u8,
    packet_type: PacketType,
    crc_hi: u8,
    payload: Vec<u8, PAYLOAD_MAX_LEN_USIZE>,
}

impl PacketCodec {
    /// Creates a codec for a bus on which this node answers to `address`.
    pub fn new(address: u8) -> Self {
        Self {
            address,
            pos: POS_START,
            wrong_dst: false,
            src_addr: 0,
            dst_addr: 0,
            length: 0,
            packet_type: PacketType::Data,
            crc_hi: 0,
            payload: Vec::new(),
        }
    }

    /// The node address this codec filters on.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Returns the decode cursor to the start-marker state, discarding any
    /// partially decoded frame.
    pub fn reset(&mut self) {
        self.pos = POS_START;
        self.wrong_dst = false;
        self.payload.clear();
    }

    /// Consumes one byte from the bus stream.
    ///
    /// Returns `Ok(None)` while the frame is incomplete and `Ok(Some(_))`
    /// on the final byte of a well-formed frame addressed to this node.
    /// Failures are reported per [`DecodeError`]; after any terminal
    /// outcome the codec is ready for the next start marker.
    pub fn decode_byte(&mut self, byte: u8) -> Result<Option<Packet>, DecodeError> {
        match self.pos {
            POS_START => {
                if byte == PKT_START {
                    self.pos += 1;
                    self.wrong_dst = false;
                    Ok(None)
                } else {
                    Err(DecodeError::BadStart { byte })
                }
            }
            POS_SRC => {
                self.src_addr = byte;
                self.pos += 1;
                Ok(None)
            }
            POS_DST => {
                self.dst_addr = byte;
                self.pos += 1;
                if byte == self.address {
                    Ok(None)
                } else {
                    self.wrong_dst = true;
                    Err(DecodeError::WrongAddress { dst: byte })
                }
            }
            POS_LEN => {
                if byte > PAYLOAD_MAX_LEN {
                    self.reset();
                    Err(DecodeError::PayloadTooLong { len: byte })
                } else {
                    self.length = byte;
                    self.pos += 1;
                    Ok(None)
                }
            }
            POS_TYPE => match PacketType::from_wire(byte) {
                Some(packet_type) => {
                    self.packet_type = packet_type;
                    self.payload.clear();
                    self.pos += 1;
                    Ok(None)
                }
                None => {
                    self.reset();
                    Err(DecodeError::UnknownType { tag: byte })
                }
            },
            pos => {
                let crc_hi_pos = POS_TYPE + self.length as u16 + 1;
                if pos < crc_hi_pos {
                    // Payload byte; its index in the payload is pos - 5.
                    debug_assert_eq!(self.payload.len() as u16, pos - PAYLOAD_OFFSET);
                    let _ = self.payload.push(byte);
                    self.pos += 1;
                    Ok(None)
                } else if pos == crc_hi_pos {
                    self.crc_hi = byte;
                    self.pos += 1;
                    Ok(None)
                } else if pos == crc_hi_pos + 1 {
                    let actual = u16::from_be_bytes([self.crc_hi, byte]);
                    let expected = self.frame_crc();
                    let wrong_dst = self.wrong_dst;
                    let dst = self.dst_addr;
                    let packet = Packet {
                        src_addr: self.src_addr,
                        dst_addr: self.dst_addr,
                        packet_type: self.packet_type,
                        payload: core::mem::take(&mut self.payload),
                    };
                    self.reset();
                    if actual != expected {
                        Err(DecodeError::CrcMismatch { expected, actual })
                    } else if wrong_dst {
                        Err(DecodeError::WrongAddress { dst })
                    } else {
                        Ok(Some(packet))
                    }
                } else {
                    self.reset();
                    Err(DecodeError::Overrun { pos })
                }
            }
        }
    }

    fn frame_crc(&self) -> u16 {
        let header = [
            self.src_addr,
            self.dst_addr,
            self.length,
            self.packet_type as u8,
        ];
        crc16_ccitt(crc16_ccitt(CRC16_SEED, &header), &self.payload)
    }

    /// Builds a packet of the given type from this node to `dst`.
    ///
    /// Returns `None` if `payload` exceeds the maximum payload length.
    pub fn make_packet(&self, payload: &[u8], dst: u8, packet_type: PacketType) -> Option<Packet> {
        let payload = Vec::from_slice(payload).ok()?;
        Some(Packet {
            src_addr: self.address,
            dst_addr: dst,
            packet_type,
            payload,
        })
    }

    /// Builds a data packet, requesting an acknowledgement if `ack` is set.
    pub fn make_data(&self, data: &[u8], dst: u8, ack: bool) -> Option<Packet> {
        let packet_type = if ack {
            PacketType::DataAck
        } else {
            PacketType::Data
        };
        self.make_packet(data, dst, packet_type)
    }

    /// Builds a single-byte command packet, requesting an acknowledgement
    /// if `ack` is set.
    pub fn make_command(&self, cmd: u8, dst: u8, ack: bool) -> Packet {
        let packet_type = if ack {
            PacketType::CommandAck
        } else {
            PacketType::Command
        };
        let mut payload = Vec::new();
        let _ = payload.push(cmd);
        Packet {
            src_addr: self.address,
            dst_addr: dst,
            packet_type,
            payload,
        }
    }

    /// Builds a payload-less positive acknowledgement to `dst`.
    pub fn make_ack(&self, dst: u8) -> Packet {
        Packet {
            src_addr: self.address,
            dst_addr: dst,
            packet_type: PacketType::Ack,
            payload: Vec::new(),
        }
    }

    /// Builds a payload-less negative acknowledgement to `dst`.
    pub fn make_nack(&self, dst: u8) -> Packet {
        Packet {
            src_addr: self.address,
            dst_addr: dst,
            packet_type: PacketType::Nack,
            payload: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{ADDR_EPS, ADDR_OBC, ADDR_TTC};

    fn feed(codec: &mut PacketCodec, bytes: &[u8]) -> Result<Option<Packet>, DecodeError> {
        let mut last = Ok(None);
        for &b in bytes {
            last = codec.decode_byte(b);
        }
        last
    }

    #[test]
    fn test_round_trip_all_types() {
        let codec = PacketCodec::new(ADDR_EPS);
        let mut decoder = PacketCodec::new(ADDR_TTC);
        for packet_type in [
            PacketType::Data,
            PacketType::DataAck,
            PacketType::Command,
            PacketType::CommandAck,
            PacketType::Ack,
            PacketType::Nack,
        ] {
            let pkt = codec
                .make_packet(&[0x11, 0x22, 0x33], ADDR_TTC, packet_type)
                .unwrap();
            let wire = pkt.encode();
            let decoded = feed(&mut decoder, &wire).unwrap().unwrap();
            assert_eq!(decoded, pkt);
        }
    }

    #[test]
    fn test_round_trip_payload_edges() {
        let codec = PacketCodec::new(ADDR_EPS);
        let mut decoder = PacketCodec::new(ADDR_OBC);
        for len in [0usize, 1, 248] {
            let payload: std::vec::Vec<u8> = (0..len).map(|i| i as u8).collect();
            let pkt = codec
                .make_packet(&payload, ADDR_OBC, PacketType::Data)
                .unwrap();
            let wire = pkt.encode();
            assert_eq!(wire.len(), 7 + len);
            let decoded = feed(&mut decoder, &wire).unwrap().unwrap();
            assert_eq!(decoded.payload.as_slice(), payload.as_slice());
        }
    }

    #[test]
    fn test_payload_over_max_rejected_by_builder() {
        let codec = PacketCodec::new(ADDR_EPS);
        let payload = [0u8; 249];
        assert!(codec.make_packet(&payload, ADDR_TTC, PacketType::Data).is_none());
    }

    #[test]
    fn test_not_ready_until_final_byte() {
        let codec = PacketCodec::new(ADDR_TTC);
        let pkt = codec.make_command(0x05, ADDR_EPS, false);
        let wire = pkt.encode();
        let mut decoder = PacketCodec::new(ADDR_EPS);
        for (i, &b) in wire.iter().enumerate() {
            let result = decoder.decode_byte(b);
            if i + 1 < wire.len() {
                assert_eq!(result, Ok(None), "byte {i} should not complete the frame");
            } else {
                assert!(matches!(result, Ok(Some(_))));
            }
        }
    }

    #[test]
    fn test_end_to_end_ack_vector() {
        // Zero-payload ACK from node 2 to node 1, exactly 7 bytes on the wire.
        let crc = crc16_ccitt(0, &[0x02, 0x01, 0x00, 0x05]);
        let wire = [
            0x7E,
            0x02,
            0x01,
            0x00,
            0x05,
            (crc >> 8) as u8,
            crc as u8,
        ];
        let mut decoder = PacketCodec::new(ADDR_EPS);
        let decoded = feed(&mut decoder, &wire).unwrap().unwrap();
        assert_eq!(decoded.src_addr, ADDR_TTC);
        assert_eq!(decoded.dst_addr, ADDR_EPS);
        assert_eq!(decoded.packet_type, PacketType::Ack);
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_bad_start_does_not_advance() {
        let mut decoder = PacketCodec::new(ADDR_EPS);
        assert_eq!(
            decoder.decode_byte(0x00),
            Err(DecodeError::BadStart { byte: 0x00 })
        );
        // A valid frame still decodes from the very next byte.
        let codec = PacketCodec::new(ADDR_TTC);
        let wire = codec.make_ack(ADDR_EPS).encode();
        assert!(matches!(feed(&mut decoder, &wire), Ok(Some(_))));
    }

    #[test]
    fn test_single_byte_corruption_is_caught() {
        let codec = PacketCodec::new(ADDR_TTC);
        let pkt = codec
            .make_packet(&[0xDE, 0xAD], ADDR_EPS, PacketType::Data)
            .unwrap();
        let wire = pkt.encode();
        // Corrupt each non-CRC byte after the start marker in turn.
        for i in 1..wire.len() - 2 {
            let mut corrupted: std::vec::Vec<u8> = wire.to_vec();
            corrupted[i] ^= 0x04;
            let mut decoder = PacketCodec::new(ADDR_EPS);
            let result = feed(&mut decoder, &corrupted);
            assert!(
                !matches!(result, Ok(Some(_))),
                "corruption at byte {i} went undetected"
            );
        }
    }

    #[test]
    fn test_oversized_length_resets_decoder() {
        let mut decoder = PacketCodec::new(ADDR_EPS);
        assert_eq!(decoder.decode_byte(0x7E), Ok(None));
        assert_eq!(decoder.decode_byte(ADDR_TTC), Ok(None));
        assert_eq!(decoder.decode_byte(ADDR_EPS), Ok(None));
        assert_eq!(
            decoder.decode_byte(249),
            Err(DecodeError::PayloadTooLong { len: 249 })
        );
        // Cursor is back at the start marker: the next frame decodes clean.
        let codec = PacketCodec::new(ADDR_TTC);
        let wire = codec.make_ack(ADDR_EPS).encode();
        assert!(matches!(feed(&mut decoder, &wire), Ok(Some(_))));
    }

    #[test]
    fn test_unknown_type_resets_decoder() {
        let mut decoder = PacketCodec::new(ADDR_EPS);
        for b in [0x7E, ADDR_TTC, ADDR_EPS, 0x00] {
            assert_eq!(decoder.decode_byte(b), Ok(None));
        }
        assert_eq!(
            decoder.decode_byte(0x07),
            Err(DecodeError::UnknownType { tag: 0x07 })
        );
        let codec = PacketCodec::new(ADDR_TTC);
        let wire = codec.make_ack(ADDR_EPS).encode();
        assert!(matches!(feed(&mut decoder, &wire), Ok(Some(_))));
    }

    #[test]
    fn test_wrong_destination_consumed_in_sync() {
        let codec = PacketCodec::new(ADDR_TTC);
        let stranger = codec
            .make_packet(&[0xAB], ADDR_OBC, PacketType::Data)
            .unwrap()
            .encode();
        let mut decoder = PacketCodec::new(ADDR_EPS);
        let mut wrong_addr_reports = 0;
        for &b in stranger.iter() {
            if let Err(DecodeError::WrongAddress { dst }) = decoder.decode_byte(b) {
                assert_eq!(dst, ADDR_OBC);
                wrong_addr_reports += 1;
            }
        }
        // Reported at the destination byte and again at the final byte.
        assert_eq!(wrong_addr_reports, 2);
        // The frame never surfaces, and the stream stays aligned for ours.
        let wire = codec.make_ack(ADDR_EPS).encode();
        assert!(matches!(feed(&mut decoder, &wire), Ok(Some(_))));
    }

    #[test]
    fn test_crc_mismatch_reports_both_values() {
        let codec = PacketCodec::new(ADDR_TTC);
        let mut wire = codec.make_ack(ADDR_EPS).encode();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        let mut decoder = PacketCodec::new(ADDR_EPS);
        match feed(&mut decoder, &wire) {
            Err(DecodeError::CrcMismatch { expected, actual }) => {
                assert_eq!(actual, expected ^ 0x00FF);
            }
            other => panic!("expected crc mismatch, got {other:?}"),
        }
    }
}
