use core::cell::Cell;
use critical_section::Mutex;
use lc_meter::{CoreClock, TimeDuration, TimeInstant, TimeSource};

/// Global millisecond counter incremented by SysTick interrupt
///
/// It wraps after ~49.7 days of continuous operation.
static MILLIS_COUNTER: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Increments the global millisecond counter.
///
/// Call from the SysTick interrupt handler every 1ms.
pub fn tick() {
    critical_section::with(|cs| {
        let counter = MILLIS_COUNTER.borrow(cs);
        counter.set(counter.get().wrapping_add(1));
    });
}

/// Duration type using milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HalDuration(pub u64);

impl TimeDuration for HalDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Milliseconds since startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HalInstant(u32);

impl HalInstant {
    pub fn as_millis(&self) -> u32 {
        self.0
    }
}

impl TimeInstant for HalInstant {
    type Duration = HalDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        HalDuration(self.0.wrapping_sub(earlier.0) as u64)
    }
}

/// SysTick-driven time source that also reports the core clock feeding TIM3
pub struct HalTimeSource {
    sysclk_hz: u32,
}

impl HalTimeSource {
    pub fn new(sysclk_hz: u32) -> Self {
        Self { sysclk_hz }
    }
}

impl TimeSource<HalInstant> for HalTimeSource {
    fn now(&self) -> HalInstant {
        critical_section::with(|cs| HalInstant(MILLIS_COUNTER.borrow(cs).get()))
    }
}

impl CoreClock for HalTimeSource {
    fn core_clock_hz(&self) -> u32 {
        self.sysclk_hz
    }
}
