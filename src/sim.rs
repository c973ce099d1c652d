//! Deterministic stand-ins for the cycle counter and the GPIO port.
//!
//! On hardware the only way to check an encoder is to put a logic analyser on
//! the data line. This module is that analyser: [`SimulatedClock`] moves
//! forward by a fixed latency on every read, [`RecordingPins`] stamps every
//! port write with the clock value at the moment of the write, and
//! [`decode_pulses`] turns the recorded waveform back into bytes.

use crate::clock::CycleClock;
use crate::hardware::PinBank;
use crate::timing::CycleBudget;
use arrayvec::ArrayVec;
use core::cell::Cell;

/// A cycle counter that only moves when it is read (or told to).
#[derive(Debug)]
pub struct SimulatedClock {
    now: Cell<u32>,
    read_latency: u32,
}

impl SimulatedClock {
    /// `read_latency` is how far the counter moves per read. It must be
    /// non-zero or a spin-wait will never see time pass.
    pub fn new(start: u32, read_latency: u32) -> Self {
        SimulatedClock { now: Cell::new(start), read_latency }
    }

    /// Current counter value, without the cost of a read.
    pub fn now(&self) -> u32 {
        self.now.get()
    }

    pub fn read_latency(&self) -> u32 {
        self.read_latency
    }

    pub fn advance(&self, cycles: u32) {
        self.now.set(self.now.get().wrapping_add(cycles));
    }
}

impl CycleClock for SimulatedClock {
    fn read(&self) -> u32 {
        let value = self.now.get();
        self.advance(self.read_latency);
        value
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    High,
    Low,
}

/// One port write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub cycle: u32,
    pub mask: u32,
    pub level: Level,
}

/// One high phase on one pin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pulse {
    pub rise: u32,
    pub fall: u32,
}

impl Pulse {
    pub fn high_time(&self) -> u32 {
        self.fall.wrapping_sub(self.rise)
    }
}

/// A port that remembers up to `N` writes.
pub struct RecordingPins<'c, const N: usize> {
    clock: &'c SimulatedClock,
    transitions: ArrayVec<Transition, N>,
    overflowed: bool,
}

impl<'c, const N: usize> RecordingPins<'c, N> {
    pub fn new(clock: &'c SimulatedClock) -> Self {
        RecordingPins { clock, transitions: ArrayVec::new(), overflowed: false }
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// True once a write had to be dropped for lack of room.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// The high phases seen on the pin(s) in `mask`, in order.
    ///
    /// A pulse starts at the first write that raises the pin while it is low
    /// and ends at the first write that lowers it again.
    pub fn pulses(&self, mask: u32) -> ArrayVec<Pulse, N> {
        let mut pulses = ArrayVec::new();
        let mut high_since = None;
        for t in self.transitions.iter().filter(|t| t.mask & mask != 0) {
            match (t.level, high_since) {
                (Level::High, None) => high_since = Some(t.cycle),
                (Level::Low, Some(rise)) => {
                    pulses.push(Pulse { rise, fall: t.cycle });
                    high_since = None;
                }
                _ => {}
            }
        }
        pulses
    }

    fn record(&mut self, mask: u32, level: Level) {
        let transition = Transition { cycle: self.clock.now(), mask, level };
        if self.transitions.try_push(transition).is_err() {
            self.overflowed = true;
        }
    }
}

impl<'c, const N: usize> PinBank for RecordingPins<'c, N> {
    fn raise(&mut self, mask: u32) {
        self.record(mask, Level::High);
    }

    fn lower(&mut self, mask: u32) {
        self.record(mask, Level::Low);
    }
}

/// Read bytes back out of a pulse train, MSB first.
///
/// A pulse longer than the midpoint of T0H and T1H is a one. Trailing bits
/// that do not make up a whole byte are dropped, as are bytes beyond `B`.
pub fn decode_pulses<const B: usize>(pulses: &[Pulse], budget: &CycleBudget) -> ArrayVec<u8, B> {
    let threshold = budget.decision_threshold();
    let mut bytes = ArrayVec::new();
    for chunk in pulses.chunks_exact(8) {
        let byte = chunk
            .iter()
            .fold(0_u8, |acc, p| (acc << 1) | u8::from(p.high_time() > threshold));
        if bytes.try_push(byte).is_err() {
            break;
        }
    }
    bytes
}
