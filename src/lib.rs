//! Cycle-counted WS2811/WS2812 one-wire output on plain GPIO.
//!
//! The encoders here replace a PWM or DMA peripheral with a busy loop that
//! watches a core cycle counter. Each bit is a high pulse of T0H or T1H
//! followed by low for the rest of a fixed bit period; every rising edge is
//! scheduled from the counter value observed at the previous one, so timing
//! error never builds up over a frame.
//!
//! - [`SingleBusEncoder`] drives one pin at the 800 kHz or 400 kHz class.
//! - [`MultiBusEncoder`] drives up to [`MAX_BUSES`] pins in lockstep at 800 kHz.
//!
//! Both take their clock ([`CycleClock`]) and port ([`PinBank`]) by value, so
//! the same code runs on hardware and against the [`sim`] recorder. Both
//! require a [`critical_section::CriticalSection`]: interrupts that stall the
//! loop for more than a few hundred nanoseconds make the LEDs latch early or
//! read the wrong colors, and nothing in software can notice.
#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod error;
pub mod hardware;
pub mod multi_bus;
pub mod sim;
pub mod single_bus;
pub mod timing;

pub use clock::{wait_cycles, CycleClock};
pub use error::{Error, Result};
pub use hardware::{HardwareController, PinBank, PinMask, SetClearRegisters};
pub use multi_bus::{send_multibus_pixels_800, BusDescriptor, BusSet, MultiBusEncoder};
pub use single_bus::{send_pixels_400, send_pixels_800, SingleBusEncoder};
pub use timing::{BitRate, CycleBudget, StripTimings};

#[cfg(target_arch = "riscv32")]
pub use clock::McycleClock;

// One cursor advance per bit time, eight bit times per byte.
pub const MAX_BUSES: usize = 8;
