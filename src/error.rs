//! Our error types for the INA234.

use thiserror::Error;

use crate::register::RegisterAddress;

pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Custom error type for INA234 communications.
#[derive(Error, Debug)]
pub enum Error<E: embedded_hal::i2c::Error> {
    /// The bus transfer failed or did not complete within its bound. Never retried internally.
    #[error("I2C transfer failed or timed out")]
    TransportTimeout(E),
    #[error(transparent)]
    ConfigurationOutOfRange(#[from] OutOfRange),
}

/// A configuration value whose raw register value would not fit its field.
///
/// Nothing is written to the device when this is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("{register:?} needs raw value {value}, which does not fit its field")]
pub struct OutOfRange {
    pub register: RegisterAddress,
    /// The quotient before truncation, or the non-positive input which produced it.
    pub value: f64,
}
