use cortex_m::peripheral::SYST;
use rtt_target::rprintln;
use stm32f0xx_hal::{
    gpio::{Output, Pin, PushPull},
    pac,
    prelude::*,
};

use stm32f0_demos::capture_timer::Tim3Capture;
use stm32f0_demos::delay::CycleDelay;
use stm32f0_demos::hd44780::Hd44780;
use stm32f0_demos::pin::Eh1Pin;

/// Any push-pull output, pin number erased
pub type ControlPin = Eh1Pin<Pin<Output<PushPull>>>;

pub type Lcd = Hd44780<ControlPin>;

/// Core clock; TIM3 counts at this rate
pub const SYSCLK_HZ: u32 = 48_000_000;

/// Container for all initialized hardware peripherals
pub struct HardwareContext {
    pub capture: Tim3Capture,
    pub lcd: Lcd,
    pub short: ControlPin,
    pub calib: ControlPin,
    pub delay: CycleDelay,
    pub sysclk_hz: u32,
}

/// Initialize all hardware peripherals
///
/// Pin assignment:
/// - PA6: oscillator output (TIM3_CH1)
/// - PA5: socket short relay
/// - PA7: calibration capacitor relay
/// - PA0..PA3: LCD D4..D7
/// - PA4: LCD E
/// - PB1: LCD RS
pub fn init_hardware() -> HardwareContext {
    let mut dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    let mut rcc = dp.RCC.configure().sysclk(SYSCLK_HZ.hz()).freeze(&mut dp.FLASH);
    let sysclk_hz = rcc.clocks.sysclk().0;
    rprintln!("System clock configured: {} Hz", sysclk_hz);
    configure_systick(sysclk_hz, &mut cp.SYST);

    let gpioa = dp.GPIOA.split(&mut rcc);
    let gpiob = dp.GPIOB.split(&mut rcc);

    let (short, calib, rs, en, data) = cortex_m::interrupt::free(|cs| {
        // Oscillator input stays in alternate mode for the timer
        let _ = gpioa.pa6.into_alternate_af1(cs);

        let pin = |p: Pin<Output<PushPull>>| Eh1Pin(p);
        (
            pin(gpioa.pa5.into_push_pull_output(cs).downgrade()),
            pin(gpioa.pa7.into_push_pull_output(cs).downgrade()),
            pin(gpiob.pb1.into_push_pull_output(cs).downgrade()),
            pin(gpioa.pa4.into_push_pull_output(cs).downgrade()),
            [
                pin(gpioa.pa0.into_push_pull_output(cs).downgrade()),
                pin(gpioa.pa1.into_push_pull_output(cs).downgrade()),
                pin(gpioa.pa2.into_push_pull_output(cs).downgrade()),
                pin(gpioa.pa3.into_push_pull_output(cs).downgrade()),
            ],
        )
    });

    let delay = CycleDelay::new(sysclk_hz);
    let lcd = Hd44780::new(rs, en, data, delay);
    rprintln!("LCD initialized");

    HardwareContext {
        capture: Tim3Capture::new(dp.TIM3),
        lcd,
        short,
        calib,
        delay,
        sysclk_hz,
    }
}

/// Configure SysTick timer for 1ms interrupts
fn configure_systick(sysclk_hz: u32, syst: &mut SYST) {
    syst.set_clock_source(cortex_m::peripheral::syst::SystClkSource::Core);
    syst.set_reload((sysclk_hz / 1_000) - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();

    rprintln!("SysTick configured for 1ms interrupts");
}
