#![no_std]

pub mod capture_timer;
pub mod delay;
pub mod hd44780;
pub mod pin;
pub mod time_source;
