use derive_more::{Display, Error};

/// Result alias used by every fallible constructor in this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Problems found while building the inputs of a transmission.
///
/// The timed loops themselves never fail; everything that could make them
/// misbehave is rejected here, before the first edge goes out.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[display("pin {pin} does not fit in a 32-bit output register")]
    PinOutOfRange { pin: u8 },
    #[display("{count} buses requested, at most {} can share one timing loop", crate::MAX_BUSES)]
    TooManyBuses { count: usize },
    #[display("bus {bus} holds {found} bytes but bus 0 holds {expected}")]
    UnequalLengths { bus: usize, expected: usize, found: usize },
    #[display("pin {pin} is already driven by another bus")]
    DuplicatePin { pin: u8 },
}
