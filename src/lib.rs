//! # epslink
//!
//! A portable, no_std telemetry/command link stack for a satellite
//! power-supply controller.
//!
//! The controller sits on two independent physical buses: a register-access
//! bus to the on-board computer and an addressed-packet bus to the
//! telemetry transceiver. This crate implements everything between the bus
//! interrupts and the parameter table:
//!
//! - two CRC engines (16-bit CCITT, 8-bit polynomial `0x07`)
//! - an incremental, byte-at-a-time codec for the addressed-packet format
//! - a stateless codec for the fixed-shape register-access frames
//! - double-buffered, interrupt-fed frame receivers with non-blocking
//!   completion signals
//! - the single dispatch task that serializes decoding, register access,
//!   and response framing across both buses
//!
//! Peripheral drivers, the parameter table's storage, and the control
//! algorithms stay outside; they plug in through the
//! [`FrameSink`](bus::FrameSink) and [`Registers`](params::Registers)
//! traits.
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` and enables the `std` features of `thiserror`, `critical-section`, and `log` (host-side tests and tools) |
//! | `defmt-0-3` | Derives `defmt::Format` for the wire types |
//!
//! ## Usage
//!
//! Each bus contributes an interrupt handler feeding a shared receiver and
//! an end-of-frame condition raising its completion bit:
//!
//! ```rust,ignore
//! static TTC_RX: SharedReceiver<PKT_RX_BUF_LEN> = shared_receiver();
//! static SIGNALS: SignalSet = SignalSet::new();
//!
//! #[interrupt]
//! fn UART0_RX() {
//!     if break_detected() {
//!         if isr_frame_end(&TTC_RX, &SIGNALS, Bus::Ttc) == WakeRequest::Reschedule {
//!             yield_from_isr();
//!         }
//!     } else {
//!         isr_rx_byte(&TTC_RX, read_rx_register());
//!     }
//! }
//! ```
//!
//! The dispatch task owns everything else:
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::new(obc_port, ttc_port, table, DispatchConfig::default());
//! loop {
//!     let _ = dispatcher.run_once(&mut rtos_wait, &SIGNALS, &OBC_RX, &TTC_RX);
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - Interrupt handlers must only call the `isr_*` helpers; everything else
//!   is task context.
//! - One `PacketCodec` instance exists per addressed-packet bus; the decode
//!   cursor is never shared across buses.
//! - No error in this stack is fatal: corrupt frames are dropped, the
//!   cursor resyncs on the next start marker, and a silent bus only shows
//!   up as absence of traffic.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded
//! environments.

#![deny(
    bad_style,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]
#![cfg_attr(not(feature = "std"), no_std)]

pub use critical_section;
pub use heapless;

pub mod bus;
pub mod consts;
pub mod crc;
pub mod dispatch;
pub mod packet;
pub mod params;
pub mod register;
