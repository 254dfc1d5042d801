//! Interrupt-fed capture window.
//!
//! Provides [`CaptureBuffer`], the fixed-capacity ring the input-capture
//! interrupt writes into, and the [`CaptureHandler`] / [`InputCapture`] traits
//! that connect it to a timer peripheral.
//!
//! The interrupt is the only writer and the foreground the only reader. Every
//! access goes through a short critical section, so a foreground read always
//! sees a consistent window and the interrupt never waits on anything.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

use crate::time::{WaitBound, WaitTimeout, wait_until};

/// Timer input-capture channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureChannel {
    C1,
    C2,
    C3,
    C4,
}

/// Edge polarity a capture channel triggers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgePolarity {
    Rising,
    Falling,
}

/// A single input-capture event as delivered by the timer driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CaptureEvent {
    /// Channel that captured.
    pub channel: CaptureChannel,

    /// Edge that triggered the capture.
    pub edge: EdgePolarity,

    /// Counter value latched by the capture, in timer ticks.
    pub value: u16,
}

/// Receives capture events dispatched by a timer driver.
///
/// Called from interrupt context: implementations must not block.
pub trait CaptureHandler {
    /// Handles one capture event.
    fn on_capture(&self, event: CaptureEvent);
}

/// Trait for the timer peripheral that produces capture events.
pub trait InputCapture {
    /// Error reported by the peripheral driver.
    type Error;

    /// Starts input capture with interrupts on the given channel.
    fn start(&mut self, channel: CaptureChannel) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy)]
struct Window<const N: usize> {
    samples: [u16; N],
    cursor: usize,
    full: bool,
}

/// Fixed-capacity ring of captured tick counts.
///
/// The write cursor always points at the next slot to fill. When it wraps
/// back to zero the window is flagged full; the flag stays set until
/// [`reset`](Self::reset). Samples arriving before the foreground consumed
/// the window overwrite the oldest slots.
///
/// # Type Parameters
/// * `N` - Window capacity in samples
pub struct CaptureBuffer<const N: usize> {
    channel: CaptureChannel,
    edge: EdgePolarity,
    window: Mutex<RefCell<Window<N>>>,
}

impl<const N: usize> CaptureBuffer<N> {
    /// Creates an empty buffer accepting events from `channel` on `edge`.
    ///
    /// `const` so the buffer can be placed in a `static` shared with the
    /// interrupt handler. A zero-capacity buffer fails to compile.
    pub const fn new(channel: CaptureChannel, edge: EdgePolarity) -> Self {
        const { assert!(N > 0, "capture window needs at least one slot") };
        Self {
            channel,
            edge,
            window: Mutex::new(RefCell::new(Window {
                samples: [0; N],
                cursor: 0,
                full: false,
            })),
        }
    }

    /// Returns the window capacity.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns the channel this buffer listens to.
    pub fn channel(&self) -> CaptureChannel {
        self.channel
    }

    /// Appends a sample, wrapping the cursor and flagging the window full
    /// when the last slot is written.
    pub fn push(&self, sample: u16) {
        critical_section::with(|cs| {
            let mut window = self.window.borrow_ref_mut(cs);
            let cursor = window.cursor;
            window.samples[cursor] = sample;
            window.cursor += 1;
            if window.cursor >= N {
                window.cursor = 0;
                window.full = true;
            }
        });
    }

    /// Discards the in-flight window: clears the cursor and the full flag.
    ///
    /// Slot contents are left as they are and get overwritten as new
    /// samples arrive.
    pub fn reset(&self) {
        critical_section::with(|cs| {
            let mut window = self.window.borrow_ref_mut(cs);
            window.cursor = 0;
            window.full = false;
        });
    }

    /// Returns true once every slot has been written since the last reset.
    pub fn is_full(&self) -> bool {
        critical_section::with(|cs| self.window.borrow_ref(cs).full)
    }

    /// Returns the index of the next slot to be written.
    pub fn cursor(&self) -> usize {
        critical_section::with(|cs| self.window.borrow_ref(cs).cursor)
    }

    /// Returns a copy of all slots, taken atomically with respect to the
    /// capture interrupt.
    pub fn samples(&self) -> [u16; N] {
        critical_section::with(|cs| self.window.borrow_ref(cs).samples)
    }

    /// Blocks until the window is full.
    ///
    /// With [`WaitBound::Forever`] this never returns if the oscillator has
    /// stopped.
    pub fn wait_full<Dl: DelayNs>(
        &self,
        delay: &mut Dl,
        poll_us: u32,
        bound: WaitBound,
    ) -> Result<(), WaitTimeout> {
        wait_until(delay, poll_us, bound, || self.is_full())
    }
}

impl<const N: usize> CaptureHandler for CaptureBuffer<N> {
    fn on_capture(&self, event: CaptureEvent) {
        if event.channel != self.channel || event.edge != self.edge {
            return;
        }
        self.push(event.value);
    }
}
