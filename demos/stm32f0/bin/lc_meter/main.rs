#![no_std]
#![no_main]

use cortex_m_rt::entry;
use embedded_hal::delay::DelayNs;
use panic_halt as _;
use rtt_target::{rprintln, rtt_init_print};

use stm32f0xx_hal::pac::interrupt;

use lc_meter::{LcMeter, MeterConfig, Reading};
use stm32f0_demos::capture_timer::{self, CAPTURE};
use stm32f0_demos::time_source::HalTimeSource;

mod hardware_setup;

use hardware_setup::init_hardware;

/// Pause between readings
const TICK_PERIOD_MS: u32 = 1000;

/// SysTick interrupt handler - called every 1ms
#[cortex_m_rt::exception]
fn SysTick() {
    stm32f0_demos::time_source::tick();
}

/// TIM3 capture interrupt: one oscillator period per falling edge
#[interrupt]
fn TIM3() {
    capture_timer::on_interrupt();
}

#[entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("Starting LC meter...");

    let mut hw = init_hardware();
    let time_source = HalTimeSource::new(hw.sysclk_hz);

    let mut meter = LcMeter::new(
        &CAPTURE,
        &time_source,
        hw.delay,
        hw.lcd,
        hw.short,
        hw.calib,
        MeterConfig::default(),
    );

    if let Err(e) = meter.start(&mut hw.capture) {
        rprintln!("Start-up failed: {}", e);
        loop {
            cortex_m::asm::wfi();
        }
    }
    let calibration = meter.calibration();
    rprintln!(
        "Calibrated: LC {} LCC {} ticks, L0 {} uH",
        calibration.lc,
        calibration.lcc,
        meter.intrinsic_inductance_uh()
    );

    loop {
        match meter.tick() {
            Ok(report) => {
                match report.reading {
                    Reading::Inductance(uh) => rprintln!("L = {} uH", uh),
                    Reading::NoComponent => rprintln!("No component"),
                }
                if let Some(cause) = report.recalibration {
                    rprintln!("Re-calibrated ({:?})", cause);
                }
            }
            Err(e) => rprintln!("Measurement error: {}", e),
        }

        meter.delay_mut().delay_ms(TICK_PERIOD_MS);
    }
}
