//! Device and alert configuration.
//!
//! These are the sources of truth for what the driver writes to the device. Register
//! images are derived from them just before a write and never kept.

use fugit::MicrosDurationU32;
use thiserror::Error;

use crate::{
    error::OutOfRange,
    scaling::{self, DEFAULT_MAX_EXPECTED_CURRENT_A, ScalingFactors},
    types::{
        AdcRange, AlertLatch, AlertPolarity, AlertTrigger, Averaging, ConversionTime,
        OperatingMode,
    },
};

/// Measurement configuration. Use [`DeviceConfigBuilder`] to create one.
///
/// `adc_range`, `shunt_resistance_mohm` and `max_expected_current_a` together determine the
/// calibration register. Change them through the driver so calibration is rewritten.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub adc_range: AdcRange,
    pub averaging: Averaging,
    pub bus_conversion_time: ConversionTime,
    pub shunt_conversion_time: ConversionTime,
    pub mode: OperatingMode,
    /// Shunt resistor in milliohms.
    pub shunt_resistance_mohm: f32,
    /// Design maximum current in amps. Sets the current LSB.
    pub max_expected_current_a: f32,
}

impl DeviceConfig {
    pub fn scaling(&self) -> ScalingFactors {
        ScalingFactors::from_config(self)
    }

    /// Check every field which can be out of range.
    ///
    /// The shunt resistance and maximum current must be positive numbers and the
    /// resulting calibration value must fit its 15-bit field.
    pub fn validate(&self) -> Result<(), DeviceConfigBuilderError> {
        if !(self.shunt_resistance_mohm.is_finite() && self.shunt_resistance_mohm > 0.0) {
            return Err(DeviceConfigBuilderError::InvalidShuntResistance);
        }
        if !(self.max_expected_current_a.is_finite() && self.max_expected_current_a > 0.0) {
            return Err(DeviceConfigBuilderError::InvalidMaxCurrent);
        }
        self.calibration()?;
        Ok(())
    }

    /// Value of the `SHUNT_CAL` field for this configuration.
    ///
    /// Also fails when the shunt resistance or maximum current is not positive.
    pub fn calibration(&self) -> Result<u16, OutOfRange> {
        scaling::shunt_calibration(self)
    }

    /// Nominal length of one conversion cycle, including averaging.
    ///
    /// `None` in the shutdown modes, where no conversions happen.
    pub fn conversion_cycle(&self) -> Option<MicrosDurationU32> {
        let shunt = self.shunt_conversion_time.duration();
        let bus = self.bus_conversion_time.duration();
        let per_sample = match (self.mode.measures_shunt(), self.mode.measures_bus()) {
            (true, true) => shunt + bus,
            (true, false) => shunt,
            (false, true) => bus,
            (false, false) => return None,
        };
        Some(per_sample * self.averaging.samples())
    }
}

/// Use this type to create a [`DeviceConfig`].
///
/// Fields start at the device's power-on values and the reference 5 A maximum current.
pub struct DeviceConfigBuilder {
    config: DeviceConfig,
}

impl DeviceConfigBuilder {
    pub fn new(shunt_resistance_mohm: f32) -> Self {
        DeviceConfigBuilder {
            config: DeviceConfig {
                adc_range: AdcRange::default(),
                averaging: Averaging::default(),
                bus_conversion_time: ConversionTime::default(),
                shunt_conversion_time: ConversionTime::default(),
                mode: OperatingMode::default(),
                shunt_resistance_mohm,
                max_expected_current_a: DEFAULT_MAX_EXPECTED_CURRENT_A,
            },
        }
    }

    /// Let's build it!
    ///
    /// See [DeviceConfig::validate] for what is rejected.
    pub fn build(self) -> Result<DeviceConfig, DeviceConfigBuilderError> {
        self.config.validate()?;
        Ok(self.config)
    }

    pub fn with_adc_range(mut self, range: AdcRange) -> Self {
        self.config.adc_range = range;
        self
    }

    pub fn with_averaging(mut self, averaging: Averaging) -> Self {
        self.config.averaging = averaging;
        self
    }

    pub fn with_bus_conversion_time(mut self, time: ConversionTime) -> Self {
        self.config.bus_conversion_time = time;
        self
    }

    pub fn with_shunt_conversion_time(mut self, time: ConversionTime) -> Self {
        self.config.shunt_conversion_time = time;
        self
    }

    pub fn with_mode(mut self, mode: OperatingMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the design maximum current. Units: A.
    pub fn with_max_expected_current(mut self, current_a: f32) -> Self {
        self.config.max_expected_current_a = current_a;
        self
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DeviceConfigBuilderError {
    #[error("Shunt resistance must be a positive number of milliohms")]
    InvalidShuntResistance,
    #[error("Maximum expected current must be a positive number of amps")]
    InvalidMaxCurrent,
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),
}

/// Alert pin configuration.
///
/// `limit` is in the unit implied by `trigger`: millivolts for shunt comparators, volts for
/// bus comparators and watts for power.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertConfig {
    pub trigger: AlertTrigger,
    pub polarity: AlertPolarity,
    pub latch: AlertLatch,
    /// Also assert the pin when a conversion completes.
    pub conversion_ready: bool,
    pub limit: f32,
}

impl AlertConfig {
    pub fn new(trigger: AlertTrigger, limit: f32) -> Self {
        AlertConfig {
            trigger,
            limit,
            ..Default::default()
        }
    }

    pub fn with_polarity(mut self, polarity: AlertPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// A latched alert stays asserted until the status register is read.
    pub fn with_latch(mut self, latch: AlertLatch) -> Self {
        self.latch = latch;
        self
    }

    pub fn with_conversion_ready(mut self, enabled: bool) -> Self {
        self.conversion_ready = enabled;
        self
    }

    /// Raw alert limit register value under the given scaling.
    pub fn raw_limit(&self, scaling: &ScalingFactors) -> Result<i16, OutOfRange> {
        scaling::alert_limit_raw(self, scaling)
    }

    /// Whether the limit depends on the ADC range.
    pub fn compares_shunt(&self) -> bool {
        matches!(
            self.trigger,
            AlertTrigger::ShuntOverLimit | AlertTrigger::ShuntUnderLimit
        )
    }
}
