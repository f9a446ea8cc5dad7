//! Constants shared across the link protocols.
//!
//! This module defines the wire-format constants for both bus protocols,
//! the node address map, and the buffer sizing used by the interrupt-context
//! receivers.
//!
//! ## Key Concepts
//!
//! - **Addressed packets**: variable-length frames delimited by a start
//!   marker and protected by a 16-bit CRC, carried on the TTC bus.
//! - **Register frames**: fixed-shape 2- or 6-byte frames protected by an
//!   8-bit CRC, carried on the OBC bus.
//! - **Node addresses**: every module on the shared buses has a one-byte
//!   address; packets not addressed to this node are consumed but ignored.
//! - **Buffer sizing**: receive buffers are sized for the largest legal
//!   frame of the protocol carried on that bus.

/// Start marker opening every addressed packet on the wire.
pub const PKT_START: u8 = 0x7E;

/// Address of the power-supply controller (this node).
pub const ADDR_EPS: u8 = 1;

/// Address of the telemetry/telecommand transceiver module.
pub const ADDR_TTC: u8 = 2;

/// Address of the on-board computer.
pub const ADDR_OBC: u8 = 3;

/// Minimum addressed-packet wire length in bytes (zero-length payload).
pub const PKT_MIN_LEN: u8 = 7;

/// Maximum addressed-packet wire length in bytes.
pub const PKT_MAX_LEN: u8 = 255;

/// See [`PKT_MAX_LEN`].
pub const PKT_MAX_LEN_USIZE: usize = PKT_MAX_LEN as usize;

/// Maximum payload carried by one addressed packet.
pub const PAYLOAD_MAX_LEN: u8 = 248;

/// See [`PAYLOAD_MAX_LEN`].
pub const PAYLOAD_MAX_LEN_USIZE: usize = PAYLOAD_MAX_LEN as usize;

/// Seed for the addressed-packet CRC16.
pub const CRC16_SEED: u16 = 0;

/// Seed for the register-frame CRC8.
pub const CRC8_SEED: u8 = 0;

/// Polynomial of the register-frame CRC8.
pub const CRC8_POLY: u8 = 0x07;

/// Wire length of a register read request.
pub const REG_READ_LEN: usize = 2;

/// Wire length of a register write request or read response.
pub const REG_WRITE_LEN: usize = 6;

/// Receive buffer capacity for the register-access bus.
///
/// Sized with headroom above the 6-byte maximum frame so a babbling master
/// is caught by the length check rather than by buffer overflow.
pub const REG_RX_BUF_LEN: usize = 16;

/// Receive buffer capacity for the addressed-packet bus.
pub const PKT_RX_BUF_LEN: usize = PKT_MAX_LEN_USIZE;

/// Default time the dispatch task blocks waiting for bus activity before
/// logging a liveness warning and re-entering the wait.
pub const DEFAULT_WAIT_TIMEOUT_MS: u32 = 60_000;
