//! Shared test infrastructure for lc-meter integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use lc_meter::{
    CaptureBuffer, CaptureChannel, CaptureEvent, CaptureHandler, CoreClock, DisplaySink,
    EdgePolarity, InputCapture, LcMeter, Line, MeterConfig, TimeDuration, TimeInstant, TimeSource,
};

/// Window capacity used throughout the tests
pub const WINDOW: usize = 8;

/// Core clock of the reference hardware: 48 ticks per microsecond
pub const CORE_CLOCK_HZ: u32 = 48_000_000;

pub type TestBuffer = CaptureBuffer<WINDOW>;

pub type TestMeter<'a> =
    LcMeter<'a, TestInstant, MockClock, MockDelay<'a>, MockLcd, MockPin<'a>, MockPin<'a>, WINDOW>;

pub fn new_buffer() -> TestBuffer {
    CaptureBuffer::new(CaptureChannel::C1, EdgePolarity::Falling)
}

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Mock instant type for testing (milliseconds since start)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Clock
// ============================================================================

/// Mock clock with microsecond resolution and controllable advancement
pub struct MockClock {
    now_us: Cell<u64>,
    core_hz: Cell<u32>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            now_us: Cell::new(0),
            core_hz: Cell::new(CORE_CLOCK_HZ),
        }
    }

    pub fn advance_us(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }

    pub fn now_ms(&self) -> u64 {
        self.now_us.get() / 1000
    }

    pub fn set_core_clock_hz(&self, hz: u32) {
        self.core_hz.set(hz);
    }
}

impl TimeSource<TestInstant> for MockClock {
    fn now(&self) -> TestInstant {
        TestInstant(self.now_ms())
    }
}

impl CoreClock for MockClock {
    fn core_clock_hz(&self) -> u32 {
        self.core_hz.get()
    }
}

// ============================================================================
// Mock Control Lines
// ============================================================================

/// Levels of the two control lines, shared between the pins and the oscillator
pub struct Switches {
    pub short: Cell<bool>,
    pub cal_cap: Cell<bool>,
    cal_connects: Cell<u32>,
}

impl Switches {
    pub fn new() -> Self {
        Self {
            short: Cell::new(false),
            cal_cap: Cell::new(false),
            cal_connects: Cell::new(0),
        }
    }

    /// Number of times the calibration capacitor has been connected
    pub fn cal_connects(&self) -> u32 {
        self.cal_connects.get()
    }

    pub fn short_pin(&self) -> MockPin<'_> {
        MockPin {
            switches: self,
            cal_cap: false,
        }
    }

    pub fn cal_cap_pin(&self) -> MockPin<'_> {
        MockPin {
            switches: self,
            cal_cap: true,
        }
    }
}

/// Output pin driving one of the shared switch levels
pub struct MockPin<'a> {
    switches: &'a Switches,
    cal_cap: bool,
}

impl ErrorType for MockPin<'_> {
    type Error = Infallible;
}

impl OutputPin for MockPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.cal_cap {
            self.switches.cal_cap.set(false);
        } else {
            self.switches.short.set(false);
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.cal_cap {
            if !self.switches.cal_cap.get() {
                self.switches
                    .cal_connects
                    .set(self.switches.cal_connects.get() + 1);
            }
            self.switches.cal_cap.set(true);
        } else {
            self.switches.short.set(true);
        }
        Ok(())
    }
}

/// Pin whose driver always reports an error
pub struct FailingPin;

#[derive(Debug)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl ErrorType for FailingPin {
    type Error = PinFault;
}

impl OutputPin for FailingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }
}

// ============================================================================
// Simulated Oscillator
// ============================================================================

/// Simulated LC oscillator feeding the capture buffer through its handler.
///
/// Every call to [`emit_window`](Self::emit_window) delivers one window of
/// falling-edge captures. Scripted windows are delivered first; after that
/// the period depends on the switch levels.
pub struct SimOscillator<'a> {
    buffer: &'a TestBuffer,
    switches: &'a Switches,
    lc_period: Cell<u16>,
    lcc_period: Cell<u16>,
    socket_window: Cell<[u16; WINDOW]>,
    faulty_connects: Cell<u32>,
    scripted: RefCell<VecDeque<[u16; WINDOW]>>,
    stopped: Cell<bool>,
    windows_emitted: Cell<u32>,
}

impl<'a> SimOscillator<'a> {
    pub fn new(buffer: &'a TestBuffer, switches: &'a Switches) -> Self {
        Self {
            buffer,
            switches,
            lc_period: Cell::new(1000),
            lcc_period: Cell::new(1100),
            socket_window: Cell::new([1050; WINDOW]),
            faulty_connects: Cell::new(0),
            scripted: RefCell::new(VecDeque::new()),
            stopped: Cell::new(false),
            windows_emitted: Cell::new(0),
        }
    }

    /// Sets the periods seen with the socket shorted, without and with the
    /// calibration capacitor
    pub fn set_calibration_periods(&self, lc: u16, lcc: u16) {
        self.lc_period.set(lc);
        self.lcc_period.set(lcc);
    }

    /// Sets a constant period for the socket configuration
    pub fn set_socket_period(&self, period: u16) {
        self.socket_window.set([period; WINDOW]);
    }

    /// Sets the exact samples delivered in the socket configuration
    pub fn set_socket_window(&self, window: [u16; WINDOW]) {
        self.socket_window.set(window);
    }

    /// The first `count` capacitor connections measure shorter than LC
    pub fn set_faulty_connects(&self, count: u32) {
        self.faulty_connects.set(count);
    }

    /// Queues windows delivered before any switch-dependent window
    pub fn script(&self, windows: &[[u16; WINDOW]]) {
        self.scripted.borrow_mut().extend(windows.iter().copied());
    }

    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn windows_emitted(&self) -> u32 {
        self.windows_emitted.get()
    }

    fn current_window(&self) -> [u16; WINDOW] {
        if let Some(window) = self.scripted.borrow_mut().pop_front() {
            return window;
        }

        if self.switches.short.get() {
            if self.switches.cal_cap.get() {
                if self.switches.cal_connects() <= self.faulty_connects.get() {
                    [self.lc_period.get() - 10; WINDOW]
                } else {
                    [self.lcc_period.get(); WINDOW]
                }
            } else {
                [self.lc_period.get(); WINDOW]
            }
        } else {
            self.socket_window.get()
        }
    }

    /// Delivers one window of captures to the buffer
    pub fn emit_window(&self) {
        if self.stopped.get() {
            return;
        }

        for value in self.current_window() {
            self.buffer.on_capture(CaptureEvent {
                channel: CaptureChannel::C1,
                edge: EdgePolarity::Falling,
                value,
            });
        }
        self.windows_emitted.set(self.windows_emitted.get() + 1);
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

/// Delay that advances the mock clock and lets the oscillator run
pub struct MockDelay<'a> {
    clock: &'a MockClock,
    oscillator: &'a SimOscillator<'a>,
    millis: Vec<u32>,
}

impl<'a> MockDelay<'a> {
    pub fn new(clock: &'a MockClock, oscillator: &'a SimOscillator<'a>) -> Self {
        Self {
            clock,
            oscillator,
            millis: Vec::new(),
        }
    }

    /// Millisecond delays requested so far, in order
    pub fn millis(&self) -> &[u32] {
        &self.millis
    }

    /// Number of millisecond delays of exactly `ms`
    pub fn count_of(&self, ms: u32) -> usize {
        self.millis.iter().filter(|&&d| d == ms).count()
    }
}

impl DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_us(u64::from(ns / 1000));
        self.oscillator.emit_window();
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_us(u64::from(us));
        self.oscillator.emit_window();
    }

    fn delay_ms(&mut self, ms: u32) {
        self.millis.push(ms);
        self.clock.advance_ms(u64::from(ms));
        self.oscillator.emit_window();
    }
}

// ============================================================================
// Mock Display
// ============================================================================

/// 2x16 character display that keeps its contents for inspection
pub struct MockLcd {
    lines: [[char; 16]; 2],
    row: usize,
    column: usize,
    clears: u32,
}

impl MockLcd {
    pub fn new() -> Self {
        Self {
            lines: [[' '; 16]; 2],
            row: 0,
            column: 0,
            clears: 0,
        }
    }

    /// Text of a line with trailing blanks removed
    pub fn line(&self, line: Line) -> String {
        let row = match line {
            Line::First => 0,
            Line::Second => 1,
        };
        let text: String = self.lines[row].iter().collect();
        text.trim_end().to_string()
    }

    pub fn clears(&self) -> u32 {
        self.clears
    }
}

impl DisplaySink for MockLcd {
    fn clear(&mut self) {
        self.lines = [[' '; 16]; 2];
        self.row = 0;
        self.column = 0;
        self.clears += 1;
    }

    fn set_cursor(&mut self, line: Line, column: u8) {
        self.row = match line {
            Line::First => 0,
            Line::Second => 1,
        };
        self.column = column as usize;
    }

    fn write_char(&mut self, c: char) {
        if self.column < 16 {
            self.lines[self.row][self.column] = c;
        }
        self.column += 1;
    }
}

// ============================================================================
// Mock Capture Timer
// ============================================================================

/// Capture timer that records which channel was started
pub struct MockCaptureTimer {
    pub started: Option<CaptureChannel>,
    pub fail: bool,
}

impl MockCaptureTimer {
    pub fn new() -> Self {
        Self {
            started: None,
            fail: false,
        }
    }
}

impl InputCapture for MockCaptureTimer {
    type Error = ();

    fn start(&mut self, channel: CaptureChannel) -> Result<(), Self::Error> {
        if self.fail {
            return Err(());
        }
        self.started = Some(channel);
        Ok(())
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Builds a meter over the shared mocks
pub fn new_meter<'a>(
    buffer: &'a TestBuffer,
    clock: &'a MockClock,
    switches: &'a Switches,
    oscillator: &'a SimOscillator<'a>,
    config: MeterConfig,
) -> TestMeter<'a> {
    LcMeter::new(
        buffer,
        clock,
        MockDelay::new(clock, oscillator),
        MockLcd::new(),
        switches.short_pin(),
        switches.cal_cap_pin(),
        config,
    )
}

/// Compare two floats with a relative tolerance
pub fn approx_eq(a: f64, b: f64, relative: f64) -> bool {
    (a - b).abs() <= relative * b.abs().max(f64::MIN_POSITIVE)
}
