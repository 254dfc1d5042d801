#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`CaptureBuffer`**: Fixed-capacity window filled by the input-capture interrupt
//! - **`CaptureHandler`**: Trait the timer driver dispatches capture events to
//! - **`InputCapture`**: Trait to implement for your capture timer
//! - **`PeriodEstimator`**: Turns a window into a tick sum, retrying noisy windows
//! - **`CalibrationEngine`**: Measures the oscillator shorted and with the reference capacitor
//! - **`LcMeter`**: Runs the measurement cycle and re-calibrates when needed
//! - **`DisplaySink`**: Trait to implement for your character display
//! - **`TimeSource`** / **`CoreClock`**: Traits to implement for your timing system
//! - **`MeterConfig`**: Tunable thresholds and delays, defaults from the reference hardware
//!
//! The control lines use `embedded_hal::digital::OutputPin` and delays use
//! `embedded_hal::delay::DelayNs`, so most HAL types plug in directly.

#[macro_use]
mod fmt;

pub mod time;
pub mod types;
pub mod config;
pub mod capture;
pub mod estimator;
pub mod calibration;
pub mod inductance;
pub mod display;
pub mod meter;

pub use calibration::{Calibration, CalibrationEngine};
pub use capture::{CaptureBuffer, CaptureChannel, CaptureEvent, CaptureHandler, EdgePolarity, InputCapture};
pub use config::{ConfigBuilder, DEFAULT_WINDOW, MeterConfig, OPEN_TICKS};
pub use display::{DisplaySink, Line};
pub use estimator::{PeriodEstimator, WindowReading};
pub use meter::{LcMeter, MeterState, TickReport};
pub use time::{CoreClock, TimeDuration, TimeInstant, TimeSource, WaitBound, WaitTimeout};
pub use types::{ConfigError, MeterError, Reading, RecalibrationCause, SwitchLine};
