//! Critical-section helpers for receivers shared with interrupt handlers.
//!
//! A bus receiver is written by that bus's interrupt handler and read by
//! the dispatch task, so it lives in a `critical_section`-protected static.
//! These helpers wrap the locking so interrupt glue stays a one-liner:
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

use super::Bus;
use super::rx::FrameReceiver;
use super::signal::{SignalSet, WakeRequest};
use core::cell::RefCell;
use critical_section::Mutex;

/// A per-bus receiver shared between one interrupt handler and the
/// dispatch task.
pub type SharedReceiver<const N: usize> = Mutex<RefCell<Option<FrameReceiver<N>>>>;

/// Const-initializes an empty shared receiver, for use in a `static`.
pub const fn shared_receiver<const N: usize>() -> SharedReceiver<N> {
    Mutex::new(RefCell::new(None))
}

/// Installs a fresh receiver into `shared`. Call once at bus
/// initialization, before enabling the bus interrupt.
pub fn install_receiver<const N: usize>(shared: &SharedReceiver<N>) {
    critical_section::with(|cs| {
        let _ = shared.borrow(cs).replace(Some(FrameReceiver::new()));
    });
}

/// Feeds one received byte into the shared receiver. Call from the bus
/// receive interrupt. Does nothing if no receiver is installed.
pub fn isr_rx_byte<const N: usize>(shared: &SharedReceiver<N>, byte: u8) {
    critical_section::with(|cs| {
        if let Some(rx) = shared.borrow(cs).borrow_mut().as_mut() {
            rx.push_byte(byte);
        }
    });
}

/// Latches the completed frame and raises the bus's completion bit. Call
/// from the bus end-of-frame interrupt (break character, stop condition).
///
/// The returned [`WakeRequest`] tells the interrupt glue whether to request
/// a reschedule on handler exit.
pub fn isr_frame_end<const N: usize>(
    shared: &SharedReceiver<N>,
    signals: &SignalSet,
    bus: Bus,
) -> WakeRequest {
    let completed = critical_section::with(|cs| {
        if let Some(rx) = shared.borrow(cs).borrow_mut().as_mut() {
            let _ = rx.frame_end();
            true
        } else {
            false
        }
    });
    if completed {
        signals.raise(bus)
    } else {
        WakeRequest::None
    }
}

/// Copies the latched frame of `shared` into `out`, truncating to the
/// buffer capacity. Task context; runs inside one critical section so a
/// concurrent end-of-frame cannot swap the buffers mid-copy.
///
/// Returns the copied length, or 0 if no receiver is installed.
pub fn take_latched<const N: usize>(shared: &SharedReceiver<N>, out: &mut [u8; N]) -> usize {
    critical_section::with(|cs| {
        if let Some(rx) = shared.borrow(cs).borrow().as_ref() {
            let frame = rx.latched();
            out[..frame.len()].copy_from_slice(frame);
            frame.len()
        } else {
            0
        }
    })
}
