//! Meter configuration and its validating builder.

use crate::time::WaitBound;
use crate::types::ConfigError;

/// Capture window capacity used by the reference hardware.
pub const DEFAULT_WINDOW: usize = 8;

/// Reference capacitance switched in during calibration, in µF.
pub const CALIBRATION_CAPACITANCE_UF: f64 = 0.001066;

/// Window tick sum at or above which the socket is considered open.
pub const OPEN_TICKS: u32 = 330_000;

/// Largest accepted spread (max - min) within a window, exclusive.
pub const SPREAD_TOLERANCE: u16 = 100;

/// Window estimation attempts before settling for a noisy window.
pub const MAX_ATTEMPTS: u8 = 10;

/// Tunable parameters of the acquisition and calibration core.
///
/// Defaults match the reference hardware: 48 MHz capture timer, 8-sample
/// window and a 1066 pF calibration capacitor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeterConfig {
    /// Reference capacitance in µF.
    pub calibration_capacitance_uf: f64,

    /// Open-circuit threshold on the window tick sum.
    pub open_ticks: u32,

    /// Windows with a spread at or above this are rejected as noisy.
    pub spread_tolerance: u16,

    /// Total estimation attempts per measurement.
    pub max_attempts: u8,

    /// Pause after rejecting a noisy window.
    pub retry_delay_ms: u32,

    /// Settle time after shorting the socket.
    pub short_settle_ms: u32,

    /// Settle time after connecting the calibration capacitor.
    pub cap_settle_ms: u32,

    /// Settle time after releasing both control lines.
    pub release_settle_ms: u32,

    /// Pause before retrying an implausible calibration.
    pub calibration_retry_delay_ms: u32,

    /// Re-calibrate at least this often.
    pub recalibration_interval_ms: u32,

    /// How long the "no value" message is held.
    pub no_component_hold_ms: u32,

    /// Bound on waits for a full capture window.
    pub full_wait: WaitBound,

    /// Delay between polls while waiting for a full window.
    pub poll_interval_us: u32,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            calibration_capacitance_uf: CALIBRATION_CAPACITANCE_UF,
            open_ticks: OPEN_TICKS,
            spread_tolerance: SPREAD_TOLERANCE,
            max_attempts: MAX_ATTEMPTS,
            retry_delay_ms: 1000,
            short_settle_ms: 100,
            cap_settle_ms: 100,
            release_settle_ms: 200,
            calibration_retry_delay_ms: 2000,
            recalibration_interval_ms: 10_000,
            no_component_hold_ms: 1000,
            full_wait: WaitBound::Forever,
            poll_interval_us: 10,
        }
    }
}

impl MeterConfig {
    /// Creates a builder seeded with the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks the invariants the builder enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.calibration_capacitance_uf.is_finite() && self.calibration_capacitance_uf > 0.0)
        {
            return Err(ConfigError::InvalidCapacitance);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.spread_tolerance == 0 {
            return Err(ConfigError::ZeroTolerance);
        }
        if self.open_ticks == 0 {
            return Err(ConfigError::ZeroOpenThreshold);
        }
        if self.poll_interval_us == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

/// Builder for constructing validated meter configurations.
#[derive(Debug)]
pub struct ConfigBuilder {
    config: MeterConfig,
}

impl ConfigBuilder {
    /// Creates a builder seeded with [`MeterConfig::default`].
    pub fn new() -> Self {
        Self {
            config: MeterConfig::default(),
        }
    }

    /// Sets the reference capacitance in µF.
    pub fn calibration_capacitance_uf(mut self, value: f64) -> Self {
        self.config.calibration_capacitance_uf = value;
        self
    }

    /// Sets the open-circuit tick sum threshold.
    pub fn open_ticks(mut self, ticks: u32) -> Self {
        self.config.open_ticks = ticks;
        self
    }

    /// Sets the spread tolerance in ticks.
    pub fn spread_tolerance(mut self, ticks: u16) -> Self {
        self.config.spread_tolerance = ticks;
        self
    }

    /// Sets the number of estimation attempts and the pause between them.
    pub fn retries(mut self, max_attempts: u8, retry_delay_ms: u32) -> Self {
        self.config.max_attempts = max_attempts;
        self.config.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Sets the three relay settle times.
    pub fn settle_times(mut self, short_ms: u32, cap_ms: u32, release_ms: u32) -> Self {
        self.config.short_settle_ms = short_ms;
        self.config.cap_settle_ms = cap_ms;
        self.config.release_settle_ms = release_ms;
        self
    }

    /// Sets the pause before retrying a rejected calibration.
    pub fn calibration_retry_delay_ms(mut self, ms: u32) -> Self {
        self.config.calibration_retry_delay_ms = ms;
        self
    }

    /// Sets the periodic re-calibration interval.
    pub fn recalibration_interval_ms(mut self, ms: u32) -> Self {
        self.config.recalibration_interval_ms = ms;
        self
    }

    /// Sets how long the "no value" message is held.
    pub fn no_component_hold_ms(mut self, ms: u32) -> Self {
        self.config.no_component_hold_ms = ms;
        self
    }

    /// Bounds waits for a full capture window.
    ///
    /// Default is [`WaitBound::Forever`].
    pub fn full_wait(mut self, bound: WaitBound) -> Self {
        self.config.full_wait = bound;
        self
    }

    /// Sets the poll interval used while waiting for a full window.
    pub fn poll_interval_us(mut self, us: u32) -> Self {
        self.config.poll_interval_us = us;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    /// * `InvalidCapacitance` - Capacitance is zero, negative or not finite
    /// * `ZeroAttempts` - No estimation attempts allowed
    /// * `ZeroTolerance` - Spread tolerance is zero
    /// * `ZeroOpenThreshold` - Open-circuit threshold is zero
    /// * `ZeroPollInterval` - Poll interval is zero
    pub fn build(self) -> Result<MeterConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
