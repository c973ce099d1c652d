/// A free-running core cycle counter.
///
/// The counter wraps at `u32::MAX`; every comparison against it goes through
/// `wrapping_sub` so an overflow in the middle of a frame is harmless.
/// Implementations sit inside the timed loops, so `read` has to be a single
/// register access with nothing else attached to it.
pub trait CycleClock {
    fn read(&self) -> u32;

    /// Cycles elapsed from `base` to now, correct across one wraparound.
    #[inline(always)]
    fn elapsed_since(&self, base: u32) -> u32 {
        self.read().wrapping_sub(base)
    }
}

impl<C: CycleClock + ?Sized> CycleClock for &C {
    #[inline(always)]
    fn read(&self) -> u32 {
        (**self).read()
    }
}

/// Spin until at least `threshold` cycles have passed since `base`.
///
/// Returns the counter value that satisfied the wait. Callers reuse it as
/// their next reference point instead of `base + threshold`, which keeps any
/// overshoot local to one edge.
#[inline(always)]
pub fn wait_cycles<C: CycleClock + ?Sized>(clock: &C, base: u32, threshold: u32) -> u32 {
    loop {
        let now = clock.read();
        if now.wrapping_sub(base) >= threshold {
            return now;
        }
    }
}

/// The RISC-V `mcycle` CSR, truncated to its low 32 bits.
#[cfg(target_arch = "riscv32")]
#[derive(Default, Debug, Copy, Clone)]
pub struct McycleClock;

#[cfg(target_arch = "riscv32")]
impl CycleClock for McycleClock {
    #[inline(always)]
    fn read(&self) -> u32 {
        riscv::register::mcycle::read() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Scripted {
        values: [u32; 6],
        index: Cell<usize>,
    }

    impl CycleClock for Scripted {
        fn read(&self) -> u32 {
            let i = self.index.get();
            self.index.set(i + 1);
            self.values[i]
        }
    }

    #[test]
    fn wait_returns_the_first_value_past_the_threshold() {
        let clock = Scripted { values: [10, 12, 14, 17, 30, 40], index: Cell::new(0) };
        assert_eq!(wait_cycles(&clock, 10, 5), 17);
        assert_eq!(clock.index.get(), 4);
    }

    #[test]
    fn wait_survives_counter_wraparound() {
        let clock = Scripted {
            values: [u32::MAX - 2, u32::MAX, 0, 1, 2, 3],
            index: Cell::new(0),
        };
        // base is 4 cycles before the wrap, so 1 is the 6th cycle after it
        assert_eq!(wait_cycles(&clock, u32::MAX - 3, 5), 1);
    }

    #[test]
    fn elapsed_through_a_reference() {
        let clock = Scripted { values: [5, 0, 0, 0, 0, 0], index: Cell::new(0) };
        let by_ref = &clock;
        assert_eq!(by_ref.elapsed_since(u32::MAX), 6);
    }
}
