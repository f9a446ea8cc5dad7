//! Bus-side primitives shared by the interrupt receivers and the dispatch
//! task.
//!
//! Each physical bus contributes three pieces: a [`rx::FrameReceiver`] fed
//! from its receive interrupt, a bit in the [`signal::SignalSet`] raised at
//! its end-of-frame condition, and a [`FrameSink`] implementation wrapping
//! its transmit primitive. The dispatch task is the only consumer on the
//! other side of all three.

pub mod isr;
pub mod rx;
pub mod signal;

use thiserror::Error;

/// Identifies one physical command bus.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    /// The register-access bus to the on-board computer.
    Obc,
    /// The addressed-packet bus to the telemetry transceiver.
    Ttc,
}

impl Bus {
    /// The completion-signal bit assigned to this bus.
    pub const fn mask(self) -> u8 {
        match self {
            Bus::Obc => 1 << 0,
            Bus::Ttc => 1 << 1,
        }
    }
}

/// Transmit-path failure reported by a bus back end.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("frame transmission failed on the physical bus")]
pub struct SendError;

/// The per-bus physical transmit primitive.
///
/// Implementations wrap the lower-layer transport (serial port, two-wire
/// slave interface) and queue one complete, already-framed unit of wire
/// data. Called only from task context.
pub trait FrameSink {
    /// Queues `frame` for transmission on this bus.
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), SendError>;
}
