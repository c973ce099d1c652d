use crate::error::{Error, Result};
use core::convert::Infallible;
use embedded_hal::digital::OutputPin;

pub type DynamicPin<'a> = &'a mut dyn OutputPin<Error = Infallible>;

/// Output lines that can be driven together by bit mask.
///
/// Bit `n` of a mask addresses pin `n`. Every bit set in a single `raise`
/// call is expected to change in the same bus write, which is what gives the
/// multi-bus encoder its shared rising edge.
pub trait PinBank {
    fn raise(&mut self, mask: u32);
    fn lower(&mut self, mask: u32);
}

impl<P: PinBank + ?Sized> PinBank for &mut P {
    #[inline(always)]
    fn raise(&mut self, mask: u32) {
        (**self).raise(mask);
    }

    #[inline(always)]
    fn lower(&mut self, mask: u32) {
        (**self).lower(mask);
    }
}

/// A single output bit, checked to fit the 32-bit output register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMask {
    pin: u8,
    bits: u32,
}

impl PinMask {
    pub fn from_pin(pin: u8) -> Result<Self> {
        let bits = 1_u32.checked_shl(u32::from(pin)).ok_or(Error::PinOutOfRange { pin })?;
        Ok(PinMask { pin, bits })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    #[inline(always)]
    pub fn bits(&self) -> u32 {
        self.bits
    }
}

/// Drives an array of `embedded-hal` pins, `pins[n]` answering to mask bit `n`.
///
/// Each pin is written separately, so the pins of one mask change a few
/// instructions apart instead of in the same cycle.
pub struct HardwareController<'a, const N: usize> {
    pins: [DynamicPin<'a>; N],
}

impl<'a, const N: usize> HardwareController<'a, N> {
    pub fn new(pins: [DynamicPin<'a>; N]) -> Self {
        HardwareController { pins }
    }

    pub fn set_low(&mut self, pin: usize) {
        if let Some(p) = self.pins.get_mut(pin) {
            p.set_low().ok();
        }
    }

    pub fn set_high(&mut self, pin: usize) {
        if let Some(p) = self.pins.get_mut(pin) {
            p.set_high().ok();
        }
    }
}

impl<'a, const N: usize> PinBank for HardwareController<'a, N> {
    #[inline(always)]
    fn raise(&mut self, mask: u32) {
        for (index, pin) in self.pins.iter_mut().enumerate().take(32) {
            if mask & (1 << index) != 0 {
                pin.set_high().ok();
            }
        }
    }

    #[inline(always)]
    fn lower(&mut self, mask: u32) {
        for (index, pin) in self.pins.iter_mut().enumerate().take(32) {
            if mask & (1 << index) != 0 {
                pin.set_low().ok();
            }
        }
    }
}

/// A GPIO port with write-1-to-set and write-1-to-clear output registers.
///
/// One store changes every masked line at once.
pub struct SetClearRegisters {
    set: *mut u32,
    clear: *mut u32,
}

impl SetClearRegisters {
    /// # Safety
    ///
    /// `set` and `clear` must be the port's W1TS and W1TC registers (or other
    /// memory valid for volatile 32-bit writes) for as long as this value
    /// lives, and nothing else may drive the bits written through it.
    pub const unsafe fn new(set: *mut u32, clear: *mut u32) -> Self {
        SetClearRegisters { set, clear }
    }
}

impl PinBank for SetClearRegisters {
    #[inline(always)]
    fn raise(&mut self, mask: u32) {
        // SAFETY: validity of the register is the constructor's contract
        unsafe { core::ptr::write_volatile(self.set, mask) }
    }

    #[inline(always)]
    fn lower(&mut self, mask: u32) {
        // SAFETY: see raise
        unsafe { core::ptr::write_volatile(self.clear, mask) }
    }
}
