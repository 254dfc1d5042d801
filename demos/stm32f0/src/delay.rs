use embedded_hal::delay::DelayNs;

/// Busy-wait delay counting core cycles
#[derive(Debug, Clone, Copy)]
pub struct CycleDelay {
    sysclk_hz: u32,
}

impl CycleDelay {
    pub fn new(sysclk_hz: u32) -> Self {
        Self { sysclk_hz }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = u64::from(ns) * u64::from(self.sysclk_hz) / 1_000_000_000;
        cortex_m::asm::delay(cycles.max(1) as u32);
    }

    fn delay_us(&mut self, us: u32) {
        let cycles = u64::from(us) * u64::from(self.sysclk_hz) / 1_000_000;
        cortex_m::asm::delay(cycles.min(u64::from(u32::MAX)) as u32);
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}
