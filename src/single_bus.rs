use crate::clock::{wait_cycles, CycleClock};
use crate::hardware::{PinBank, PinMask};
use crate::timing::{BitRate, CycleBudget};
use bitvec::prelude::*;
use critical_section::CriticalSection;
use embedded_time::rate::Hertz;

/// Sends one pixel buffer down one data line.
pub struct SingleBusEncoder<C, P> {
    clock: C,
    pins: P,
    budget: CycleBudget,
}

impl<C, P> SingleBusEncoder<C, P>
where
    C: CycleClock,
    P: PinBank,
{
    pub fn new(clock: C, pins: P, budget: CycleBudget) -> Self {
        SingleBusEncoder { clock, pins, budget }
    }

    pub fn budget(&self) -> &CycleBudget {
        &self.budget
    }

    /// Give back the clock and the pins.
    pub fn release(self) -> (C, P) {
        (self.clock, self.pins)
    }

    /// Send every byte of `pixels` on `pin`, MSB first, blocking until the
    /// last bit's high phase is over.
    ///
    /// The critical section token is there because any interruption longer
    /// than a few hundred nanoseconds corrupts the frame on the wire. The
    /// final low phase is not waited out; the inter-frame latch delay belongs
    /// to the caller.
    pub fn send(&mut self, _cs: CriticalSection<'_>, pixels: &[u8], pin: PinMask) {
        if pixels.is_empty() {
            return;
        }
        let budget = self.budget;
        let mask = pin.bits();

        #[cfg(feature = "defmt")]
        defmt::trace!("single bus: {} bytes on pin {}", pixels.len(), pin.pin());

        // pretend a full period has already elapsed so the first bit goes out immediately
        let mut bit_start = self.clock.read().wrapping_sub(budget.bit_period);

        for bit in pixels.view_bits::<Msb0>().iter().by_vals() {
            // pick the high time before the edge so nothing but the write follows it
            let high_time = budget.high_time(bit);

            bit_start = wait_cycles(&self.clock, bit_start, budget.bit_period);
            self.pins.raise(mask);

            wait_cycles(&self.clock, bit_start, high_time);
            self.pins.lower(mask);
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("single bus: done");
    }
}

/// Send `pixels` at the 800 kHz rate inside a critical section.
pub fn send_pixels_800<C, P>(clock: C, pins: P, core_clock: impl Into<Hertz>, pixels: &[u8], pin: PinMask)
where
    C: CycleClock,
    P: PinBank,
{
    send_pixels(clock, pins, CycleBudget::for_rate(core_clock, BitRate::Khz800), pixels, pin);
}

/// Send `pixels` at the 400 kHz rate inside a critical section.
pub fn send_pixels_400<C, P>(clock: C, pins: P, core_clock: impl Into<Hertz>, pixels: &[u8], pin: PinMask)
where
    C: CycleClock,
    P: PinBank,
{
    send_pixels(clock, pins, CycleBudget::for_rate(core_clock, BitRate::Khz400), pixels, pin);
}

fn send_pixels<C, P>(clock: C, pins: P, budget: CycleBudget, pixels: &[u8], pin: PinMask)
where
    C: CycleClock,
    P: PinBank,
{
    let mut encoder = SingleBusEncoder::new(clock, pins, budget);
    critical_section::with(|cs| encoder.send(cs, pixels, pin));
}
