use lc_meter::{
    CaptureBuffer, CaptureChannel, CaptureEvent, CaptureHandler, DEFAULT_WINDOW, EdgePolarity,
    InputCapture,
};
use stm32f0xx_hal::pac::{self, Interrupt, NVIC};

/// Window filled by the TIM3 capture interrupt
pub static CAPTURE: CaptureBuffer<DEFAULT_WINDOW> =
    CaptureBuffer::new(CaptureChannel::C1, EdgePolarity::Falling);

const CC1IF: u32 = 1 << 1;

/// TIM3 channel 1 input capture in slave reset mode.
///
/// Every falling edge on TI1 latches the counter into CCR1 and restarts the
/// counter, so each captured value is one oscillator period in core ticks.
pub struct Tim3Capture {
    tim: pac::TIM3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// Only TI1 can drive the slave-mode reset.
    UnsupportedChannel(CaptureChannel),
}

impl Tim3Capture {
    pub fn new(tim: pac::TIM3) -> Self {
        // SAFETY: single read-modify-write of the TIM3 clock enable bit
        // before the timer is in use.
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb1enr.modify(|_, w| w.tim3en().set_bit());
        Self { tim }
    }
}

impl InputCapture for Tim3Capture {
    type Error = CaptureError;

    fn start(&mut self, channel: CaptureChannel) -> Result<(), Self::Error> {
        if channel != CaptureChannel::C1 {
            return Err(CaptureError::UnsupportedChannel(channel));
        }

        let tim = &self.tim;
        // SAFETY: raw values written match the reference manual layouts of
        // the TIM3 registers.
        unsafe {
            tim.psc.write(|w| w.bits(0));
            tim.arr.write(|w| w.bits(0xFFFF));
            // CC1S = 01: IC1 mapped on TI1
            tim.ccmr1_input().write(|w| w.bits(0b01));
            // CC1P = 1, CC1E = 1: falling edge, capture enabled
            tim.ccer.write(|w| w.bits(0b11));
            // TS = 101 (TI1FP1), SMS = 100 (reset mode)
            tim.smcr.write(|w| w.bits((0b101 << 4) | 0b100));
            tim.dier.write(|w| w.bits(CC1IF));
            tim.cr1.modify(|r, w| w.bits(r.bits() | 1));
            NVIC::unmask(Interrupt::TIM3);
        }
        Ok(())
    }
}

/// Forwards a pending channel 1 capture to [`CAPTURE`].
///
/// Call from the TIM3 interrupt handler.
pub fn on_interrupt() {
    // SAFETY: the handler only reads SR and CCR1; reading CCR1 clears CC1IF.
    let tim = unsafe { &*pac::TIM3::ptr() };
    if tim.sr.read().bits() & CC1IF == 0 {
        return;
    }

    let value = tim.ccr1.read().bits() as u16;
    CAPTURE.on_capture(CaptureEvent {
        channel: CaptureChannel::C1,
        edge: EdgePolarity::Falling,
        value,
    });
}
