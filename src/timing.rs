use embedded_time::{fixed_point::FixedPoint, rate::Hertz};

/// Protocol phase lengths, each expressed as the rate whose period it equals.
///
/// Storing rates rather than nanoseconds lets a budget be a plain integer
/// division of the core clock, the same way the datasheet figures are usually
/// quoted for cycle-counting drivers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StripTimings {
    /// 1 / T0H
    pub zero_h: u32,
    /// 1 / T1H
    pub one_h: u32,
    /// 1 / full bit period
    pub full_cycle: u32,
}

impl StripTimings {
    // 0.4us / 0.8us / 1.25us
    pub const WS2812_ADAFRUIT: StripTimings =
        StripTimings { zero_h: 2_500_000, one_h: 1_250_000, full_cycle: 800_000 };
    // 0.5us / 1.2us / 2.5us
    pub const WS2811_ADAFRUIT: StripTimings =
        StripTimings { zero_h: 2_000_000, one_h: 833_333, full_cycle: 400_000 };
}

/// The two bit-rate classes of the one-wire protocol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitRate {
    Khz800,
    Khz400,
}

impl BitRate {
    pub fn timings(self) -> &'static StripTimings {
        match self {
            BitRate::Khz800 => &StripTimings::WS2812_ADAFRUIT,
            BitRate::Khz400 => &StripTimings::WS2811_ADAFRUIT,
        }
    }
}

/// Per-bit cycle counts for one bit-rate class at one core clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleBudget {
    pub bit_period: u32,
    pub zero_high: u32,
    pub one_high: u32,
}

impl CycleBudget {
    /// Compute the budget once, up front, from the core clock rate.
    ///
    /// A phase whose rate is zero yields a zero-cycle budget for that phase.
    pub fn new(core_clock: impl Into<Hertz>, timings: &StripTimings) -> Self {
        let core: Hertz = core_clock.into();
        let cycles = |rate: u32| core.integer().checked_div(rate).unwrap_or(0);
        CycleBudget {
            bit_period: cycles(timings.full_cycle),
            zero_high: cycles(timings.zero_h),
            one_high: cycles(timings.one_h),
        }
    }

    pub fn for_rate(core_clock: impl Into<Hertz>, rate: BitRate) -> Self {
        CycleBudget::new(core_clock, rate.timings())
    }

    /// High time for a single data bit.
    #[inline(always)]
    pub fn high_time(&self, bit: bool) -> u32 {
        match bit {
            true => self.one_high,
            false => self.zero_high,
        }
    }

    /// Midpoint between T0H and T1H, used when reading a pulse train back.
    pub fn decision_threshold(&self) -> u32 {
        ((u64::from(self.zero_high) + u64::from(self.one_high)) / 2) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_time::rate::Extensions;

    #[test]
    fn ws2812_at_160mhz() {
        let budget = CycleBudget::for_rate(160_000_000_u32.Hz(), BitRate::Khz800);
        assert_eq!(budget, CycleBudget { bit_period: 200, zero_high: 64, one_high: 128 });
    }

    #[test]
    fn ws2811_at_80mhz() {
        let budget = CycleBudget::for_rate(80_000_000_u32.Hz(), BitRate::Khz400);
        // 80_000_000 / 833_333 truncates to 96
        assert_eq!(budget, CycleBudget { bit_period: 200, zero_high: 40, one_high: 96 });
    }

    #[test]
    fn zero_rate_gives_zero_cycles() {
        let timings = StripTimings { zero_h: 0, one_h: 1_000_000, full_cycle: 500_000 };
        let budget = CycleBudget::new(Hertz(10_000_000_u32), &timings);
        assert_eq!(budget.zero_high, 0);
        assert_eq!(budget.one_high, 10);
        assert_eq!(budget.bit_period, 20);
    }

    #[test]
    fn high_time_and_threshold() {
        let budget = CycleBudget { bit_period: 200, zero_high: 64, one_high: 128 };
        assert_eq!(budget.high_time(true), 128);
        assert_eq!(budget.high_time(false), 64);
        assert_eq!(budget.decision_threshold(), 96);
    }
}
