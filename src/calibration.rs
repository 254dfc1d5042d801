//! Two-phase self-calibration.
//!
//! The oscillator is first run with the measurement socket shorted, giving
//! the period of its own tank (LC). The reference capacitor is then switched
//! in, giving a longer period (LCC). From the two, the tank's inductance
//! follows without knowing its capacitance.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::capture::CaptureBuffer;
use crate::config::MeterConfig;
use crate::display::DisplaySink;
use crate::estimator::PeriodEstimator;
use crate::inductance;
use crate::time::WaitBound;
use crate::types::{MeterError, SwitchLine};

/// Baseline periods from the last accepted calibration, in mean ticks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Period with the socket shorted.
    pub lc: f64,

    /// Period with the socket shorted and the reference capacitor connected.
    pub lcc: f64,
}

impl Calibration {
    /// True if adding the reference capacitor lengthened the period.
    pub fn is_valid(&self) -> bool {
        self.lcc > self.lc
    }

    /// Inductance of the oscillator's own tank in µH.
    pub fn intrinsic_inductance_uh(&self, ticks_per_micro: f64, cal_cap_uf: f64) -> f64 {
        inductance::intrinsic_inductance(self.lc, self.lcc, ticks_per_micro, cal_cap_uf)
    }

    /// Capacitance of the oscillator's own tank in µF.
    pub fn intrinsic_capacitance_uf(&self, cal_cap_uf: f64) -> f64 {
        inductance::intrinsic_capacitance(self.lc, self.lcc, cal_cap_uf)
    }
}

/// Drives the short and calibration-capacitor lines and measures the
/// oscillator in both configurations.
pub struct CalibrationEngine<S: OutputPin, C: OutputPin> {
    short: S,
    cal_cap: C,
    short_settle_ms: u32,
    cap_settle_ms: u32,
    release_settle_ms: u32,
    retry_delay_ms: u32,
    poll_interval_us: u32,
    full_wait: WaitBound,
}

impl<S: OutputPin, C: OutputPin> CalibrationEngine<S, C> {
    /// Creates an engine owning both control lines.
    pub fn new(short: S, cal_cap: C, config: &MeterConfig) -> Self {
        Self {
            short,
            cal_cap,
            short_settle_ms: config.short_settle_ms,
            cap_settle_ms: config.cap_settle_ms,
            release_settle_ms: config.release_settle_ms,
            retry_delay_ms: config.calibration_retry_delay_ms,
            poll_interval_us: config.poll_interval_us,
            full_wait: config.full_wait,
        }
    }

    /// Releases the control lines.
    pub fn release(self) -> (S, C) {
        (self.short, self.cal_cap)
    }

    /// Runs calibration until it yields LCC > LC.
    ///
    /// Each attempt shorts the socket, measures LC on a fresh window, adds
    /// the reference capacitor, measures LCC, then opens both lines and lets
    /// the circuit settle back to the socket configuration. A physically
    /// implausible result clears the display and, after a pause, starts over.
    /// There is no attempt limit: faulty hardware keeps this looping.
    ///
    /// Before returning, resets the buffer and waits for a fresh window so
    /// the caller's next read holds only samples taken after the lines were
    /// released.
    ///
    /// Returns the accepted calibration and the number of attempts taken.
    ///
    /// # Errors
    /// * `OscillatorStopped` - A bounded wait for a full window expired
    /// * `Switch` - A control line could not be driven
    pub fn calibrate<const N: usize, Dl, D>(
        &mut self,
        estimator: &PeriodEstimator,
        buffer: &CaptureBuffer<N>,
        delay: &mut Dl,
        display: &mut D,
    ) -> Result<(Calibration, u32), MeterError>
    where
        Dl: DelayNs,
        D: DisplaySink,
    {
        let mut attempts: u32 = 0;
        let calibration = loop {
            attempts += 1;

            let candidate = match self.attempt(estimator, buffer, delay, display) {
                Ok(candidate) => candidate,
                Err(e) => {
                    // Leave the socket connected to the oscillator
                    if let Err(release) = self.set_cal_cap(false) {
                        warn!("could not release after {}: {}", e, release);
                    }
                    if let Err(release) = self.set_short(false) {
                        warn!("could not release after {}: {}", e, release);
                    }
                    return Err(e);
                }
            };
            if candidate.is_valid() {
                break candidate;
            }

            warn!(
                "calibration rejected: LC {} >= LCC {}",
                candidate.lc, candidate.lcc
            );
            display.clear();
            delay.delay_ms(self.retry_delay_ms);
        };

        buffer.reset();
        buffer
            .wait_full(delay, self.poll_interval_us, self.full_wait)
            .map_err(|_| MeterError::OscillatorStopped)?;

        info!(
            "calibrated after {} attempt(s): LC {} LCC {}",
            attempts, calibration.lc, calibration.lcc
        );
        Ok((calibration, attempts))
    }

    /// A single pass: short, measure LC, add the capacitor, measure LCC,
    /// release both lines and settle.
    fn attempt<const N: usize, Dl, D>(
        &mut self,
        estimator: &PeriodEstimator,
        buffer: &CaptureBuffer<N>,
        delay: &mut Dl,
        display: &mut D,
    ) -> Result<Calibration, MeterError>
    where
        Dl: DelayNs,
        D: DisplaySink,
    {
        self.set_short(true)?;
        delay.delay_ms(self.short_settle_ms);
        let lc = estimator.measure(buffer, delay, display, true)?.mean(N);

        self.set_cal_cap(true)?;
        delay.delay_ms(self.cap_settle_ms);
        let lcc = estimator.measure(buffer, delay, display, true)?.mean(N);
        trace!("attempt measured LC {} LCC {}", lc, lcc);

        self.set_cal_cap(false)?;
        self.set_short(false)?;
        delay.delay_ms(self.release_settle_ms);

        Ok(Calibration { lc, lcc })
    }

    fn set_short(&mut self, on: bool) -> Result<(), MeterError> {
        drive(&mut self.short, on).map_err(|_| MeterError::Switch(SwitchLine::Short))
    }

    fn set_cal_cap(&mut self, on: bool) -> Result<(), MeterError> {
        drive(&mut self.cal_cap, on)
            .map_err(|_| MeterError::Switch(SwitchLine::CalibrationCapacitor))
    }
}

fn drive<P: OutputPin>(pin: &mut P, on: bool) -> Result<(), P::Error> {
    if on { pin.set_high() } else { pin.set_low() }
}
