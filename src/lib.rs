//! This crate provides a register-level driver for the Texas Instruments INA234, a 12-bit
//! current, voltage and power monitor on an I2C bus.
//!
//! It is `no_std` and works with any bus implementing [embedded_hal::i2c::I2c]. Enable the
//! `defmt` feature for register transfer logging and `defmt::Format` on the public types.
//!
//! The device is described by a [DeviceConfig], built with a [DeviceConfigBuilder] from
//! the shunt resistor value:
//!
//! ```ignore
//! let config = DeviceConfigBuilder::new(1.0)
//!     .with_adc_range(AdcRange::Range20_48mV)
//!     .with_mode(OperatingMode::ContinuousShuntAndBus)
//!     .build()?;
//! let mut ina = Ina234::new(i2c, DEFAULT_ADDRESS, config)?;
//! let current_a = ina.read_current_a()?;
//! ```
//!
//! Note that every read of the status flags clears a latched alert. See
//! [Ina234::read_status].

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod config;
pub mod error;
pub mod ina234;
pub mod register;
pub mod scaling;
pub mod types;

#[cfg(test)]
mod mock_i2c;

pub use config::{AlertConfig, DeviceConfig, DeviceConfigBuilder, DeviceConfigBuilderError};
pub use error::{Error, OutOfRange};
pub use ina234::{DEFAULT_ADDRESS, Ina234};
pub use scaling::{Measurements, ScalingFactors};
pub use types::{
    AdcRange, AlertLatch, AlertPolarity, AlertSource, AlertTrigger, Averaging, ConversionTime,
    DeviceError, OperatingMode, StatusFlags,
};
