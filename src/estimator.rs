//! Robust period estimation over a capture window.

use embedded_hal::delay::DelayNs;

use crate::capture::CaptureBuffer;
use crate::config::MeterConfig;
use crate::display::DisplaySink;
use crate::time::WaitBound;
use crate::types::MeterError;

/// Summary of the capture window the estimator settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindowReading {
    /// Sum of all samples in the window, in ticks.
    pub sum: u32,

    /// Largest minus smallest sample, in ticks.
    pub spread: u16,

    /// Attempts taken, including the accepted one.
    pub attempts: u8,

    stable: bool,
}

impl WindowReading {
    /// True if the spread was within tolerance, false if the estimator ran
    /// out of attempts and returned its last noisy window.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    /// Mean period in ticks for a window of `capacity` samples.
    pub fn mean(&self, capacity: usize) -> f64 {
        self.sum as f64 / capacity as f64
    }
}

/// Sum, min and max of a window.
fn summarize(samples: &[u16]) -> (u32, u16, u16) {
    let mut sum: u32 = 0;
    let mut min = u16::MAX;
    let mut max = u16::MIN;
    for &sample in samples {
        min = min.min(sample);
        max = max.max(sample);
        sum += u32::from(sample);
    }
    (sum, min, max)
}

/// Turns capture windows into a tick sum, rejecting windows that straddle a
/// transient.
#[derive(Debug, Clone, Copy)]
pub struct PeriodEstimator {
    tolerance: u16,
    max_attempts: u8,
    retry_delay_ms: u32,
    poll_interval_us: u32,
    full_wait: WaitBound,
}

impl PeriodEstimator {
    /// Creates an estimator from the relevant parts of `config`.
    pub fn new(config: &MeterConfig) -> Self {
        Self {
            tolerance: config.spread_tolerance,
            max_attempts: config.max_attempts,
            retry_delay_ms: config.retry_delay_ms,
            poll_interval_us: config.poll_interval_us,
            full_wait: config.full_wait,
        }
    }

    /// Estimates the window tick sum.
    ///
    /// With `reset` the buffer is cleared first and the call blocks until a
    /// complete fresh window has been captured. Otherwise whatever the
    /// buffer currently holds is used.
    ///
    /// A window whose spread reaches the tolerance is discarded: the display
    /// is cleared, the buffer reset and, after the retry delay, the buffer is
    /// read again without waiting for it to fill. Once the attempts run out
    /// the sum of the last window examined is returned even though it is
    /// still noisy.
    ///
    /// # Errors
    /// * `OscillatorStopped` - A bounded wait for the fresh window expired
    pub fn measure<const N: usize, Dl, D>(
        &self,
        buffer: &CaptureBuffer<N>,
        delay: &mut Dl,
        display: &mut D,
        reset: bool,
    ) -> Result<WindowReading, MeterError>
    where
        Dl: DelayNs,
        D: DisplaySink,
    {
        if reset {
            buffer.reset();
            buffer
                .wait_full(delay, self.poll_interval_us, self.full_wait)
                .map_err(|_| MeterError::OscillatorStopped)?;
        }

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let (sum, min, max) = summarize(&buffer.samples());
            let spread = max - min;

            if spread < self.tolerance {
                return Ok(WindowReading {
                    sum,
                    spread,
                    attempts: attempt,
                    stable: true,
                });
            }

            debug!("noisy window: attempt {}, spread {}", attempt, spread);
            display.clear();
            buffer.reset();
            delay.delay_ms(self.retry_delay_ms);

            if attempt >= self.max_attempts {
                warn!("window still noisy after {} attempts", attempt);
                return Ok(WindowReading {
                    sum,
                    spread,
                    attempts: attempt,
                    stable: false,
                });
            }
        }
    }
}
