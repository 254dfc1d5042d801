//! Time abstraction traits and the polling wait primitive.

use embedded_hal::delay::DelayNs;

/// Trait for abstracting the monotonic millisecond time source.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait for querying the core clock that drives the capture timer.
///
/// The frequency is read on every conversion rather than cached, since the
/// clock tree may be reconfigured at run time.
pub trait CoreClock {
    /// Returns the core (HCLK) frequency in hertz.
    fn core_clock_hz(&self) -> u32;

    /// Returns the number of capture timer ticks per microsecond.
    #[inline]
    fn ticks_per_micro(&self) -> f64 {
        self.core_clock_hz() as f64 / 1_000_000.0
    }
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    ///
    /// Implementations backed by a wrapping counter must use wrapping
    /// arithmetic here.
    fn duration_since(&self, earlier: Self) -> Self::Duration;
}

/// How long a blocking wait may poll before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitBound {
    /// Poll until the condition holds, however long that takes.
    #[default]
    Forever,

    /// Give up after this many unsuccessful polls.
    Polls(u32),
}

/// A bounded wait ran out of polls before its condition held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitTimeout;

/// Polls `ready` until it returns true, delaying `poll_us` between polls.
///
/// With [`WaitBound::Forever`] this only returns once the condition holds.
pub fn wait_until<Dl, F>(
    delay: &mut Dl,
    poll_us: u32,
    bound: WaitBound,
    mut ready: F,
) -> Result<(), WaitTimeout>
where
    Dl: DelayNs,
    F: FnMut() -> bool,
{
    let mut polls: u32 = 0;
    loop {
        if ready() {
            return Ok(());
        }

        if let WaitBound::Polls(limit) = bound {
            if polls >= limit {
                return Err(WaitTimeout);
            }
            polls += 1;
        }

        delay.delay_us(poll_us);
    }
}
