use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_02::digital::v2::OutputPin as OutputPin02;

/// Exposes an `embedded-hal` 0.2 push-pull pin as an `embedded-hal` 1.0 `OutputPin`
pub struct Eh1Pin<P>(pub P);

impl<P: OutputPin02<Error = Infallible>> ErrorType for Eh1Pin<P> {
    type Error = Infallible;
}

impl<P: OutputPin02<Error = Infallible>> OutputPin for Eh1Pin<P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}
