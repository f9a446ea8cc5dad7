//! The dispatch task: single consumer of both command buses.
//!
//! One [`Dispatcher`] serializes command decoding, register access, and
//! response framing for both buses. It blocks on the shared
//! [`SignalSet`](crate::bus::signal::SignalSet) with a bounded timeout; on
//! wake it copies each completed frame out of the interrupt-owned receiver
//! under a critical section, decodes it with that bus's codec, performs the
//! register operation, and sends the response (where the protocol calls for
//! one) back on the originating bus.
//!
//! No failure here is fatal: corrupt frames, unknown registers, and
//! transmit errors are logged and dropped, and a failure on one bus never
//! affects the other. The worst observable outcome is silence.
//!
//! ## Payload mapping on the packet bus
//!
//! Addressed packets carry register operations in their payload:
//!
//! - `Command`/`CommandAck`, 1-byte payload — read of that register
//!   address, answered with a `Data` packet whose payload is
//!   `[addr, value:4 big-endian]`.
//! - `Data`/`DataAck`, 5-byte payload — write of `[addr, value:4]`.
//!
//! The `*Ack` variants request an explicit `Ack`/`Nack` outcome packet; the
//! plain variants are fire-and-forget. On the register-access bus the wire
//! format has no room for an ack-request flag, so write acknowledgement is
//! a [`DispatchConfig`] option instead.

use heapless::Vec;
use log::{debug, error, warn};

use crate::bus::isr::{SharedReceiver, take_latched};
use crate::bus::signal::SignalSet;
use crate::bus::{Bus, FrameSink};
use crate::consts::{ADDR_EPS, DEFAULT_WAIT_TIMEOUT_MS};
use crate::packet::{DecodeError, Packet, PacketCodec, PacketType};
use crate::params::Registers;
use crate::register::{self, RegisterOp};

/// Blocking wait on a [`SignalSet`], implemented by the host scheduler
/// glue.
///
/// The dispatch task is the sole blocking consumer; implementations should
/// suspend the calling task (not spin) until a completion bit is pending or
/// the timeout elapses.
pub trait SignalWait {
    /// Blocks until at least one completion bit is pending or `timeout_ms`
    /// elapses. Returns the drained bits, 0 on timeout.
    fn wait(&mut self, signals: &SignalSet, timeout_ms: u32) -> u8;
}

/// Dispatch loop configuration.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Node address used to filter addressed packets and stamp responses.
    pub address: u8,
    /// Echo a response frame for register writes on the register-access
    /// bus. Off by default: the bus master treats writes as
    /// fire-and-forget unless the mission profile asks otherwise.
    pub ack_writes: bool,
    /// Maximum time one pass blocks waiting for bus activity.
    pub wait_timeout_ms: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            address: ADDR_EPS,
            ack_writes: false,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

/// Outcome of one pass of the dispatch loop.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    /// Number of bus frames taken off the receivers this pass.
    Frames(u8),
    /// The wait timed out with no bus activity.
    Idle,
}

/// The single consumer loop shared by both buses.
///
/// `O` and `T` are the transmit primitives of the register-access and
/// packet buses; `R` is the external register table.
#[derive(Debug)]
pub struct Dispatcher<O, T, R> {
    obc: O,
    ttc: T,
    registers: R,
    codec: PacketCodec,
    config: DispatchConfig,
}

impl<O, T, R> Dispatcher<O, T, R>
where
    O: FrameSink,
    T: FrameSink,
    R: Registers,
{
    /// Creates the dispatcher with its bus sinks and register table.
    pub fn new(obc: O, ttc: T, registers: R, config: DispatchConfig) -> Self {
        Self {
            obc,
            ttc,
            registers,
            codec: PacketCodec::new(config.address),
            config,
        }
    }

    /// One blocking pass of the task loop.
    ///
    /// Parks on `signals` via `wait`; a timeout is logged as a liveness
    /// warning and reported as [`Served::Idle`] so the caller simply loops
    /// back into the next wait.
    pub fn run_once<W, const OBC: usize, const TTC: usize>(
        &mut self,
        wait: &mut W,
        signals: &SignalSet,
        obc_rx: &SharedReceiver<OBC>,
        ttc_rx: &SharedReceiver<TTC>,
    ) -> Served
    where
        W: SignalWait,
    {
        signals.set_waiting(true);
        let bits = wait.wait(signals, self.config.wait_timeout_ms);
        signals.set_waiting(false);
        if bits == 0 {
            warn!(
                "no command received in {} ms",
                self.config.wait_timeout_ms
            );
            return Served::Idle;
        }
        self.service(bits, obc_rx, ttc_rx)
    }

    /// Services every bus whose completion bit is set in `bits`.
    ///
    /// Frames within one bus are handled in arrival order; no ordering is
    /// guaranteed across buses.
    pub fn service<const OBC: usize, const TTC: usize>(
        &mut self,
        bits: u8,
        obc_rx: &SharedReceiver<OBC>,
        ttc_rx: &SharedReceiver<TTC>,
    ) -> Served {
        let mut served = 0;
        if bits & Bus::Obc.mask() != 0 {
            let mut frame = [0u8; OBC];
            let len = take_latched(obc_rx, &mut frame);
            self.serve_obc(&frame[..len]);
            served += 1;
        }
        if bits & Bus::Ttc.mask() != 0 {
            let mut frame = [0u8; TTC];
            let len = take_latched(ttc_rx, &mut frame);
            self.serve_ttc(&frame[..len]);
            served += 1;
        }
        Served::Frames(served)
    }

    /// Handles one completed frame from the register-access bus.
    fn serve_obc(&mut self, frame: &[u8]) {
        match register::decode(frame) {
            Ok(RegisterOp::Read { addr }) => match self.registers.read(addr) {
                Ok(value) => {
                    let response = register::encode_response(addr, value);
                    if self.obc.send_frame(&response).is_err() {
                        error!("read response lost on the register bus");
                    }
                }
                Err(e) => warn!("register read dropped: {}", e),
            },
            Ok(RegisterOp::Write { addr, value }) => match self.registers.write(addr, value) {
                Ok(()) => {
                    if self.config.ack_writes {
                        let response = register::encode_response(addr, value);
                        if self.obc.send_frame(&response).is_err() {
                            error!("write echo lost on the register bus");
                        }
                    }
                }
                Err(e) => warn!("register write dropped: {}", e),
            },
            Err(e) => warn!("register frame dropped: {}", e),
        }
    }

    /// Handles one completed frame from the packet bus.
    fn serve_ttc(&mut self, frame: &[u8]) {
        let mut packet = None;
        for &byte in frame {
            match self.codec.decode_byte(byte) {
                Ok(Some(pkt)) => {
                    packet = Some(pkt);
                    break;
                }
                Ok(None) => {}
                Err(DecodeError::BadStart { byte }) => {
                    // Noise between frames; keep hunting for the marker.
                    debug!("discarded {:#04x} while waiting for a frame", byte);
                }
                Err(DecodeError::WrongAddress { dst }) => {
                    // Keep consuming so the stream stays aligned.
                    debug!("packet for node {:#04x} ignored", dst);
                }
                // The codec already returned its cursor to the start
                // marker; later bytes of this frame may still carry one.
                Err(e) => warn!("packet dropped: {}", e),
            }
        }
        // A frame ending mid-packet leaves the codec parked; the next
        // completed frame continues the same decode.
        if let Some(pkt) = packet {
            self.handle_packet(pkt);
        }
    }

    fn handle_packet(&mut self, pkt: Packet) {
        match pkt.packet_type {
            PacketType::Command | PacketType::CommandAck => {
                let want_ack = pkt.packet_type == PacketType::CommandAck;
                if pkt.payload.len() != 1 {
                    warn!(
                        "read request with payload length {} dropped",
                        pkt.payload.len()
                    );
                    if want_ack {
                        let nack = self.codec.make_nack(pkt.src_addr);
                        self.send_packet(&nack);
                    }
                    return;
                }
                let addr = pkt.payload[0];
                match self.registers.read(addr) {
                    Ok(value) => {
                        let mut data: Vec<u8, 5> = Vec::new();
                        let _ = data.push(addr);
                        let _ = data.extend_from_slice(&value.to_be_bytes());
                        if let Some(response) = self.codec.make_data(&data, pkt.src_addr, false) {
                            self.send_packet(&response);
                        }
                    }
                    Err(e) => {
                        warn!("register read dropped: {}", e);
                        if want_ack {
                            let nack = self.codec.make_nack(pkt.src_addr);
                            self.send_packet(&nack);
                        }
                    }
                }
            }
            PacketType::Data | PacketType::DataAck => {
                let want_ack = pkt.packet_type == PacketType::DataAck;
                if pkt.payload.len() != 5 {
                    warn!(
                        "write request with payload length {} dropped",
                        pkt.payload.len()
                    );
                    if want_ack {
                        let nack = self.codec.make_nack(pkt.src_addr);
                        self.send_packet(&nack);
                    }
                    return;
                }
                let addr = pkt.payload[0];
                let value = u32::from_be_bytes([
                    pkt.payload[1],
                    pkt.payload[2],
                    pkt.payload[3],
                    pkt.payload[4],
                ]);
                match self.registers.write(addr, value) {
                    Ok(()) => {
                        if want_ack {
                            let ack = self.codec.make_ack(pkt.src_addr);
                            self.send_packet(&ack);
                        }
                    }
                    Err(e) => {
                        warn!("register write dropped: {}", e);
                        if want_ack {
                            let nack = self.codec.make_nack(pkt.src_addr);
                            self.send_packet(&nack);
                        }
                    }
                }
            }
            PacketType::Ack | PacketType::Nack => {
                debug!(
                    "outcome packet from node {:#04x} ignored",
                    pkt.src_addr
                );
            }
        }
    }

    fn send_packet(&mut self, pkt: &Packet) {
        if self.ttc.send_frame(&pkt.encode()).is_err() {
            error!("response lost on the packet bus");
        }
    }

    /// The register table handle, for host-side maintenance access.
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.registers
    }
}
