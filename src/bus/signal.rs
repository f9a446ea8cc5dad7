//! Non-blocking frame-completion signals.
//!
//! A [`SignalSet`] carries one bit per bus, set from interrupt context when
//! that bus completes a frame and drained by the dispatch task. Raising a
//! bit never blocks and never allocates; it only tells the caller whether
//! the dispatch task was parked on the set, so the interrupt glue can
//! request a reschedule on its way out of the handler.

use super::Bus;
use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Whether the interrupt glue should request a scheduler yield.
///
/// Returned by [`SignalSet::raise`]; marked `must_use` because dropping it
/// silently would leave a higher-priority dispatch task unscheduled until
/// the next tick.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WakeRequest {
    /// The dispatch task was blocked on this set; yield to it on interrupt
    /// exit if its priority exceeds the preempted context's.
    Reschedule,
    /// No task was waiting; return from the interrupt normally.
    None,
}

/// One completion bit per bus.
#[derive(Debug)]
pub struct SignalSet {
    bits: AtomicU8,
    waiting: AtomicBool,
}

impl SignalSet {
    /// Creates a set with no bits pending.
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
            waiting: AtomicBool::new(false),
        }
    }

    /// Marks `bus` as having a completed frame. Interrupt safe, never
    /// blocks.
    pub fn raise(&self, bus: Bus) -> WakeRequest {
        self.bits.fetch_or(bus.mask(), Ordering::Release);
        if self.waiting.load(Ordering::Acquire) {
            WakeRequest::Reschedule
        } else {
            WakeRequest::None
        }
    }

    /// Takes and clears every pending bit.
    ///
    /// Returns `WouldBlock` when no bus has completed a frame; the dispatch
    /// task's wait implementation decides how long to park before retrying.
    pub fn poll(&self) -> nb::Result<u8, Infallible> {
        let bits = self.bits.swap(0, Ordering::Acquire);
        if bits == 0 {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(bits)
        }
    }

    /// Records whether the dispatch task is about to block on this set.
    ///
    /// Set before parking and cleared after waking so that
    /// [`raise`](Self::raise) can report the need for a reschedule.
    pub fn set_waiting(&self, waiting: bool) {
        self.waiting.store(waiting, Ordering::Release);
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_empty_would_block() {
        let signals = SignalSet::new();
        assert_eq!(signals.poll(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_raise_and_drain_single_bus() {
        let signals = SignalSet::new();
        let _ = signals.raise(Bus::Obc);
        assert_eq!(signals.poll(), Ok(Bus::Obc.mask()));
        // Drained on consumption.
        assert_eq!(signals.poll(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_bits_accumulate_across_buses() {
        let signals = SignalSet::new();
        let _ = signals.raise(Bus::Obc);
        let _ = signals.raise(Bus::Ttc);
        assert_eq!(signals.poll(), Ok(Bus::Obc.mask() | Bus::Ttc.mask()));
    }

    #[test]
    fn test_raise_reports_waiting_task() {
        let signals = SignalSet::new();
        assert_eq!(signals.raise(Bus::Ttc), WakeRequest::None);
        signals.set_waiting(true);
        assert_eq!(signals.raise(Bus::Ttc), WakeRequest::Reschedule);
        signals.set_waiting(false);
        assert_eq!(signals.raise(Bus::Ttc), WakeRequest::None);
    }
}
