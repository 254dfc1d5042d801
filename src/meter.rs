//! Measurement cycle.
//!
//! Provides [`LcMeter`], which owns the hardware collaborators, runs the
//! mandatory start-up calibration and then converts one capture window into
//! an inductance reading per [`tick`](LcMeter::tick), re-calibrating on a
//! timer or when consecutive readings drift apart.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::calibration::{Calibration, CalibrationEngine};
use crate::capture::{CaptureBuffer, InputCapture};
use crate::config::MeterConfig;
use crate::display::{DisplaySink, show_inductance, show_no_component};
use crate::estimator::{PeriodEstimator, WindowReading};
use crate::inductance;
use crate::time::{CoreClock, TimeDuration, TimeInstant, TimeSource};
use crate::types::{MeterError, Reading, RecalibrationCause};

/// The current state of the measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeterState {
    /// Created, no calibration yet. Ticks are refused.
    Startup,
    /// Calibration in progress.
    Calibrating,
    /// Calibrated; every tick produces a reading.
    Measuring,
}

/// Outcome of one measurement tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// What was shown on the display.
    pub reading: Reading,

    /// The capture window the reading was computed from.
    pub window: WindowReading,

    /// Set if this tick re-ran calibration after reporting.
    pub recalibration: Option<RecalibrationCause>,
}

/// LC-oscillator inductance meter.
///
/// # Type Parameters
/// * `'a` - Lifetime of the shared capture buffer and time source
/// * `I` - Time instant type
/// * `T` - Time source, also reporting the core clock
/// * `Dl` - Busy-wait delay
/// * `D` - Display sink
/// * `S` - Short control line
/// * `C` - Calibration-capacitor control line
/// * `N` - Capture window capacity
pub struct LcMeter<'a, I, T, Dl, D, S, C, const N: usize>
where
    I: TimeInstant,
    T: TimeSource<I> + CoreClock,
    Dl: DelayNs,
    D: DisplaySink,
    S: OutputPin,
    C: OutputPin,
{
    buffer: &'a CaptureBuffer<N>,
    time_source: &'a T,
    delay: Dl,
    display: D,
    engine: CalibrationEngine<S, C>,
    estimator: PeriodEstimator,
    config: MeterConfig,
    state: MeterState,
    calibration: Calibration,
    calibrated_at: Option<I>,
    previous_sum: Option<u32>,
}

impl<'a, I, T, Dl, D, S, C, const N: usize> LcMeter<'a, I, T, Dl, D, S, C, N>
where
    I: TimeInstant,
    T: TimeSource<I> + CoreClock,
    Dl: DelayNs,
    D: DisplaySink,
    S: OutputPin,
    C: OutputPin,
{
    /// Creates a meter in `Startup` state with a zeroed calibration.
    pub fn new(
        buffer: &'a CaptureBuffer<N>,
        time_source: &'a T,
        delay: Dl,
        display: D,
        short: S,
        cal_cap: C,
        config: MeterConfig,
    ) -> Self {
        Self {
            buffer,
            time_source,
            delay,
            display,
            engine: CalibrationEngine::new(short, cal_cap, &config),
            estimator: PeriodEstimator::new(&config),
            config,
            state: MeterState::Startup,
            calibration: Calibration::default(),
            calibrated_at: None,
            previous_sum: None,
        }
    }

    /// Starts input capture on the buffer's channel, then runs the start-up
    /// calibration.
    ///
    /// Returns once calibration succeeded; the meter is then `Measuring`.
    pub fn start<P: InputCapture>(&mut self, capture: &mut P) -> Result<(), MeterError> {
        capture
            .start(self.buffer.channel())
            .map_err(|_| MeterError::CaptureStart)?;
        info!("input capture started on {}", self.buffer.channel());

        self.display.clear();
        self.calibrate()?;
        Ok(())
    }

    /// Runs a full calibration now.
    ///
    /// Restarts the re-calibration interval from the moment calibration
    /// begins. Returns the number of attempts calibration took. On error the
    /// previous calibration, state and interval are kept.
    pub fn calibrate(&mut self) -> Result<u32, MeterError> {
        let resume_state = self.state;
        let resume_calibrated_at = self.calibrated_at;
        self.state = MeterState::Calibrating;
        self.calibrated_at = Some(self.time_source.now());

        let result = self.engine.calibrate(
            &self.estimator,
            self.buffer,
            &mut self.delay,
            &mut self.display,
        );

        match result {
            Ok((calibration, attempts)) => {
                self.calibration = calibration;
                self.state = MeterState::Measuring;

                let cap = self.config.calibration_capacitance_uf;
                info!(
                    "intrinsic L {} uH, intrinsic C {} uF",
                    calibration.intrinsic_inductance_uh(self.time_source.ticks_per_micro(), cap),
                    calibration.intrinsic_capacitance_uf(cap)
                );
                Ok(attempts)
            }
            Err(e) => {
                self.state = resume_state;
                self.calibrated_at = resume_calibrated_at;
                Err(e)
            }
        }
    }

    /// Takes one reading and shows it.
    ///
    /// Reuses whatever window the buffer currently holds. A window at or
    /// above the open-circuit threshold shows the "no value" message, holds
    /// it, and ends the tick without evaluating re-calibration. Otherwise
    /// the inductance is shown and then calibration re-runs if the interval
    /// has elapsed or the tick sum drifted from the previous one.
    ///
    /// # Errors
    /// * `NotStarted` - Called before [`start`](Self::start) succeeded
    /// * Any error from a triggered re-calibration
    pub fn tick(&mut self) -> Result<TickReport, MeterError> {
        if self.state != MeterState::Measuring {
            return Err(MeterError::NotStarted);
        }

        let window =
            self.estimator
                .measure(self.buffer, &mut self.delay, &mut self.display, false)?;

        if window.sum >= self.config.open_ticks {
            debug!("open circuit: tick sum {}", window.sum);
            show_no_component(&mut self.display);
            self.delay.delay_ms(self.config.no_component_hold_ms);
            return Ok(TickReport {
                reading: Reading::NoComponent,
                window,
                recalibration: None,
            });
        }

        let micro_henries = self.inductance_of(window.mean(N));
        show_inductance(&mut self.display, micro_henries);

        let recalibration = self.recalibration_cause(window.sum);
        if let Some(cause) = recalibration {
            info!("re-calibrating: {}", cause);
            self.calibrate()?;
        }
        self.previous_sum = Some(window.sum);

        Ok(TickReport {
            reading: Reading::Inductance(micro_henries),
            window,
            recalibration,
        })
    }

    /// Inductance in µH for a mean period in ticks under the current
    /// calibration.
    pub fn inductance_of(&self, mean_ticks: f64) -> f64 {
        let intrinsic = self.intrinsic_inductance_uh();
        inductance::external_inductance(intrinsic, self.calibration.lc, mean_ticks)
    }

    /// Inductance of the oscillator's own tank in µH.
    pub fn intrinsic_inductance_uh(&self) -> f64 {
        self.calibration.intrinsic_inductance_uh(
            self.time_source.ticks_per_micro(),
            self.config.calibration_capacitance_uf,
        )
    }

    fn recalibration_cause(&self, sum: u32) -> Option<RecalibrationCause> {
        let interval_elapsed = match self.calibrated_at {
            Some(at) => {
                let elapsed = self.time_source.now().duration_since(at);
                elapsed.as_millis() >= u64::from(self.config.recalibration_interval_ms)
            }
            None => true,
        };
        if interval_elapsed {
            return Some(RecalibrationCause::Interval);
        }

        // Raw sums against half the window size
        let drift_threshold = (N / 2) as u32;
        match self.previous_sum {
            Some(previous) if previous.abs_diff(sum) > drift_threshold => {
                Some(RecalibrationCause::Drift)
            }
            _ => None,
        }
    }

    /// Returns the current state of the measurement cycle.
    pub fn state(&self) -> MeterState {
        self.state
    }

    /// Returns the last accepted calibration.
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Returns the display sink.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Returns the delay, for pacing the caller's loop.
    pub fn delay_mut(&mut self) -> &mut Dl {
        &mut self.delay
    }

    /// Returns the tick sum of the last valid reading, if any.
    pub fn previous_sum(&self) -> Option<u32> {
        self.previous_sum
    }
}
