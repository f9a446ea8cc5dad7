//! Register-access frame codec for the OBC bus.
//!
//! The on-board computer addresses the parameter table through fixed-shape
//! frames:
//!
//! ```text
//! read request           [ADDR:1][CRC8:1]
//! write request/response [ADDR:1][VALUE:4 big-endian][CRC8:1]
//! ```
//!
//! The trailing CRC8 (polynomial `0x07`, seed 0) covers all preceding
//! bytes. Unlike the addressed-packet codec there is no incremental state:
//! the bus layer below already delivers whole frames, delimited by its own
//! end-of-frame condition, so decoding is a pure function of the frame
//! bytes.

use crate::consts::{CRC8_SEED, REG_READ_LEN, REG_WRITE_LEN};
use crate::crc::crc8;
use thiserror::Error;

/// A decoded register operation.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOp {
    /// Read the value of one register.
    Read {
        /// Register address.
        addr: u8,
    },
    /// Write a value into one register.
    Write {
        /// Register address.
        addr: u8,
        /// Value to store.
        value: u32,
    },
}

/// Register-frame decode failures.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The frame length is not a legal request shape.
    #[error("invalid frame length {len}, expected 2 or 6")]
    Length {
        /// Received frame length in bytes.
        len: usize,
    },
    /// The trailing CRC8 does not match the frame contents.
    #[error("crc mismatch: computed {expected:#04x}, received {actual:#04x}")]
    Crc {
        /// CRC computed over the frame body.
        expected: u8,
        /// CRC carried by the frame.
        actual: u8,
    },
}

/// Decodes one complete register-access frame.
pub fn decode(frame: &[u8]) -> Result<RegisterOp, FrameError> {
    let (crc, body) = match frame.len() {
        REG_READ_LEN | REG_WRITE_LEN => match frame.split_last() {
            Some(parts) => parts,
            None => return Err(FrameError::Length { len: frame.len() }),
        },
        len => return Err(FrameError::Length { len }),
    };
    let expected = crc8(CRC8_SEED, body);
    if *crc != expected {
        return Err(FrameError::Crc {
            expected,
            actual: *crc,
        });
    }
    if body.len() == 1 {
        Ok(RegisterOp::Read { addr: body[0] })
    } else {
        Ok(RegisterOp::Write {
            addr: body[0],
            value: u32::from_be_bytes([body[1], body[2], body[3], body[4]]),
        })
    }
}

/// Encodes the 6-byte response frame answering a register read.
///
/// Also used as the write acknowledgement echo when that behavior is
/// enabled in the dispatcher configuration.
pub fn encode_response(addr: u8, value: u32) -> [u8; REG_WRITE_LEN] {
    let mut frame = [0u8; REG_WRITE_LEN];
    frame[0] = addr;
    frame[1..5].copy_from_slice(&value.to_be_bytes());
    frame[5] = crc8(CRC8_SEED, &frame[..5]);
    frame
}

/// Encodes the 2-byte read request for `addr`.
///
/// Provided for peers and test harnesses; this node only answers reads.
pub fn encode_read(addr: u8) -> [u8; REG_READ_LEN] {
    let mut frame = [0u8; REG_READ_LEN];
    frame[0] = addr;
    frame[1] = crc8(CRC8_SEED, &frame[..1]);
    frame
}
