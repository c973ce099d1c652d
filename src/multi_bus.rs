use crate::clock::{wait_cycles, CycleClock};
use crate::error::{Error, Result};
use crate::hardware::{PinBank, PinMask};
use crate::timing::{BitRate, CycleBudget};
use crate::MAX_BUSES;
use arrayvec::ArrayVec;
use critical_section::CriticalSection;
use embedded_time::rate::Hertz;

/// One data line and the buffer it is sending.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusDescriptor<'a> {
    pin: PinMask,
    pixels: &'a [u8],
    cursor: usize,
}

impl<'a> BusDescriptor<'a> {
    pub fn pin(&self) -> PinMask {
        self.pin
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    #[inline(always)]
    fn current(&self) -> u8 {
        self.pixels.get(self.cursor).copied().unwrap_or(0)
    }

    /// Step to the next byte; true while there is still a byte to send.
    #[inline(always)]
    fn advance(&mut self) -> bool {
        if self.cursor < self.pixels.len() {
            self.cursor += 1;
        }
        self.cursor < self.pixels.len()
    }
}

/// The lines of one multi-bus frame.
///
/// Every bus must carry the same number of bytes and use its own pin, and
/// there can be no more than [`MAX_BUSES`] of them: the encoder moves one bus
/// to its next byte per bit time, so a byte period has exactly eight slots.
#[derive(Debug, Clone, Default)]
pub struct BusSet<'a> {
    buses: ArrayVec<BusDescriptor<'a>, MAX_BUSES>,
}

impl<'a> BusSet<'a> {
    pub fn new(buses: &[(&'a [u8], u8)]) -> Result<Self> {
        if buses.len() > MAX_BUSES {
            return Err(Error::TooManyBuses { count: buses.len() });
        }
        let mut set = BusSet::default();
        for &(pixels, pin) in buses {
            set.push(pixels, pin)?;
        }
        Ok(set)
    }

    pub fn push(&mut self, pixels: &'a [u8], pin: u8) -> Result<()> {
        if self.buses.is_full() {
            return Err(Error::TooManyBuses { count: self.buses.len() + 1 });
        }
        let pin = PinMask::from_pin(pin)?;
        if self.buses.iter().any(|bus| bus.pin == pin) {
            return Err(Error::DuplicatePin { pin: pin.pin() });
        }
        if let Some(first) = self.buses.first() {
            if first.pixels.len() != pixels.len() {
                return Err(Error::UnequalLengths {
                    bus: self.buses.len(),
                    expected: first.pixels.len(),
                    found: pixels.len(),
                });
            }
        }
        self.buses.push(BusDescriptor { pin, pixels, cursor: 0 });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    /// Bytes per bus, zero for an empty set.
    pub fn frame_len(&self) -> usize {
        self.buses.first().map_or(0, |bus| bus.pixels.len())
    }

    /// Every pin in the set, as one port mask.
    pub fn all_pins(&self) -> u32 {
        self.buses.iter().fold(0, |mask, bus| mask | bus.pin.bits())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusDescriptor<'a>> {
        self.buses.iter()
    }
}

/// Sends up to eight buffers at once, all lines rising on the same write.
///
/// Only the 800 kHz class has enough room between T0H and T1H for the cursor
/// bookkeeping, but the budget is taken as given.
pub struct MultiBusEncoder<C, P> {
    clock: C,
    pins: P,
    budget: CycleBudget,
}

impl<C, P> MultiBusEncoder<C, P>
where
    C: CycleClock,
    P: PinBank,
{
    pub fn new(clock: C, pins: P, budget: CycleBudget) -> Self {
        MultiBusEncoder { clock, pins, budget }
    }

    pub fn budget(&self) -> &CycleBudget {
        &self.budget
    }

    pub fn release(self) -> (C, P) {
        (self.clock, self.pins)
    }

    /// Send one frame on every bus in `buses`.
    ///
    /// Per bit: all lines go high together, the lines sending a zero drop at
    /// T0H, the lines sending a one drop at T1H. Each bus's byte is sampled
    /// once at the start of the byte period and its cursor is moved during
    /// the bit whose index matches the bus's position in the set.
    pub fn send(&mut self, _cs: CriticalSection<'_>, mut buses: BusSet<'_>) {
        if buses.frame_len() == 0 {
            return;
        }
        let budget = self.budget;
        let all_pins = buses.all_pins();
        let mut sampled = [0_u8; MAX_BUSES];

        #[cfg(feature = "defmt")]
        defmt::trace!("multi bus: {} buses x {} bytes", buses.len(), buses.frame_len());

        let mut bit_start = self.clock.read().wrapping_sub(budget.bit_period);
        loop {
            let mut more_pixels = false;
            for (byte, bus) in sampled.iter_mut().zip(buses.buses.iter()) {
                *byte = bus.current();
            }

            for bit_index in 0..8 {
                let bit_mask = 0x80_u8 >> bit_index;
                let mut ones = 0_u32;
                let mut zeros = 0_u32;
                for (byte, bus) in sampled.iter().zip(buses.buses.iter()) {
                    if byte & bit_mask != 0 {
                        ones |= bus.pin.bits();
                    } else {
                        zeros |= bus.pin.bits();
                    }
                }

                bit_start = wait_cycles(&self.clock, bit_start, budget.bit_period);
                self.pins.raise(all_pins);

                wait_cycles(&self.clock, bit_start, budget.zero_high);
                self.pins.lower(zeros);

                // spare time until T1H: move one bus on to its next byte
                if let Some(bus) = buses.buses.get_mut(bit_index) {
                    more_pixels |= bus.advance();
                }

                wait_cycles(&self.clock, bit_start, budget.one_high);
                self.pins.lower(ones);
            }

            if !more_pixels {
                break;
            }
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("multi bus: done");
    }
}

/// Send every bus in `buses` at the 800 kHz rate inside a critical section.
pub fn send_multibus_pixels_800<C, P>(clock: C, pins: P, core_clock: impl Into<Hertz>, buses: BusSet<'_>)
where
    C: CycleClock,
    P: PinBank,
{
    let budget = CycleBudget::for_rate(core_clock, BitRate::Khz800);
    let mut encoder = MultiBusEncoder::new(clock, pins, budget);
    critical_section::with(|cs| encoder.send(cs, buses));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_set_checks_lengths() {
        let a = [1_u8, 2, 3];
        let b = [4_u8, 5];
        assert_eq!(
            BusSet::new(&[(&a[..], 0), (&b[..], 1)]).map(|s| s.len()),
            Err(Error::UnequalLengths { bus: 1, expected: 3, found: 2 })
        );
    }

    #[test]
    fn bus_set_checks_pins() {
        let a = [0_u8; 3];
        assert_eq!(
            BusSet::new(&[(&a[..], 3), (&a[..], 3)]).map(|s| s.len()),
            Err(Error::DuplicatePin { pin: 3 })
        );
        assert_eq!(BusSet::new(&[(&a[..], 40)]).map(|s| s.len()), Err(Error::PinOutOfRange { pin: 40 }));
    }

    #[test]
    fn bus_set_caps_at_eight() {
        let a = [0_u8; 1];
        let pins: [(&[u8], u8); 9] = core::array::from_fn(|i| (&a[..], i as u8));
        assert_eq!(BusSet::new(&pins).map(|s| s.len()), Err(Error::TooManyBuses { count: 9 }));

        let mut set = BusSet::new(&pins[..8]).unwrap();
        assert_eq!(set.len(), 8);
        assert_eq!(set.push(&a, 20), Err(Error::TooManyBuses { count: 9 }));
    }

    #[test]
    fn bus_set_summary() {
        let a = [9_u8; 4];
        let set = BusSet::new(&[(&a[..], 1), (&a[..], 6)]).unwrap();
        assert_eq!(set.all_pins(), 0b100_0010);
        assert_eq!(set.frame_len(), 4);
        assert_eq!(set.iter().map(|bus| bus.pin().pin()).collect::<Vec<_>>(), vec![1, 6]);
        assert!(BusSet::default().is_empty());
        assert_eq!(BusSet::default().frame_len(), 0);
    }

    #[test]
    fn cursor_reports_remaining_bytes() {
        let pixels = [0xAA, 0x55];
        let mut bus = BusDescriptor { pin: PinMask::from_pin(0).unwrap(), pixels: &pixels, cursor: 0 };
        assert_eq!(bus.current(), 0xAA);
        assert!(bus.advance());
        assert_eq!(bus.current(), 0x55);
        assert!(!bus.advance());
        assert!(!bus.advance());
        assert_eq!(bus.current(), 0);
    }
}
