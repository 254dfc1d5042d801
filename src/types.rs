//! Core types shared by the estimator, calibration engine and measurement cycle.

/// One of the two control lines switched by the calibration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchLine {
    /// Shorts the external measurement socket.
    Short,

    /// Connects the reference capacitor across the tank.
    CalibrationCapacitor,
}

/// Result of one measurement tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
    /// External inductance in microhenries.
    Inductance(f64),

    /// The oscillator period is at or above the open-circuit threshold.
    NoComponent,
}

impl Reading {
    /// Returns the inductance in microhenries, if a component is connected.
    pub fn micro_henries(&self) -> Option<f64> {
        match self {
            Reading::Inductance(value) => Some(*value),
            Reading::NoComponent => None,
        }
    }
}

/// Why the measurement cycle re-ran calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecalibrationCause {
    /// The re-calibration interval elapsed.
    Interval,

    /// Consecutive tick sums drifted apart by more than the drift threshold.
    Drift,
}

/// Errors that can occur while measuring.
///
/// With unbounded waits and infallible pins none of these can occur; the
/// core recovers from noisy windows and implausible calibrations internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeterError {
    /// A bounded wait for a full capture window expired.
    OscillatorStopped,

    /// Driving a control line failed.
    Switch(SwitchLine),

    /// The timer driver refused to start input capture.
    CaptureStart,

    /// A measurement was requested before the start-up calibration.
    NotStarted,
}

impl core::fmt::Display for MeterError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MeterError::OscillatorStopped => {
                write!(f, "capture window did not fill, oscillator may have stopped")
            }
            MeterError::Switch(line) => {
                write!(f, "failed to drive the {:?} control line", line)
            }
            MeterError::CaptureStart => {
                write!(f, "input capture could not be started")
            }
            MeterError::NotStarted => {
                write!(f, "meter has not been started and calibrated")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MeterError {}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Calibration capacitance must be a positive, finite value.
    InvalidCapacitance,

    /// At least one estimation attempt is required.
    ZeroAttempts,

    /// Spread tolerance of zero would reject every window.
    ZeroTolerance,

    /// Open-circuit threshold of zero would report every window as open.
    ZeroOpenThreshold,

    /// Poll interval must be non-zero.
    ZeroPollInterval,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::InvalidCapacitance => {
                write!(f, "calibration capacitance must be positive and finite")
            }
            ConfigError::ZeroAttempts => {
                write!(f, "period estimator needs at least one attempt")
            }
            ConfigError::ZeroTolerance => {
                write!(f, "spread tolerance must be non-zero")
            }
            ConfigError::ZeroOpenThreshold => {
                write!(f, "open-circuit threshold must be non-zero")
            }
            ConfigError::ZeroPollInterval => {
                write!(f, "poll interval must be non-zero")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
