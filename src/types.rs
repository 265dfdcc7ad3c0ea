//! This module contains the typed values held in the INA234 register fields.

use fugit::MicrosDurationU32;
use strum_macros::{EnumCount, EnumIter, FromRepr};

/// Full scale range of the shunt voltage ADC. `ADCRANGE` bit of the configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdcRange {
    /// ±81.92 mV, 40 µV per LSB.
    #[default]
    Range81_92mV = 0,
    /// ±20.48 mV, 10 µV per LSB.
    Range20_48mV = 1,
}

impl AdcRange {
    /// Full scale shunt voltage in millivolts.
    pub const fn full_scale_mv(&self) -> f64 {
        match self {
            AdcRange::Range81_92mV => 81.92,
            AdcRange::Range20_48mV => 20.48,
        }
    }
}

/// Number of ADC samples averaged per result. `AVG` field of the configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumCount, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Averaging {
    #[default]
    Samples1 = 0,
    Samples4 = 1,
    Samples16 = 2,
    Samples64 = 3,
    Samples128 = 4,
    Samples256 = 5,
    Samples512 = 6,
    Samples1024 = 7,
}

impl Averaging {
    /// How many samples are averaged.
    pub const fn samples(&self) -> u32 {
        match self {
            Averaging::Samples1 => 1,
            Averaging::Samples4 => 4,
            Averaging::Samples16 => 16,
            Averaging::Samples64 => 64,
            Averaging::Samples128 => 128,
            Averaging::Samples256 => 256,
            Averaging::Samples512 => 512,
            Averaging::Samples1024 => 1024,
        }
    }
}

/// ADC conversion time. Shared by the `VBUSCT` and `VSHCT` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumCount, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConversionTime {
    Us140 = 0,
    Us204 = 1,
    Us332 = 2,
    Us588 = 3,
    /// Power-on default.
    #[default]
    Us1100 = 4,
    Us2116 = 5,
    Us4156 = 6,
    Us8244 = 7,
}

impl ConversionTime {
    /// Duration of one conversion.
    pub fn duration(&self) -> MicrosDurationU32 {
        let us = match self {
            ConversionTime::Us140 => 140,
            ConversionTime::Us204 => 204,
            ConversionTime::Us332 => 332,
            ConversionTime::Us588 => 588,
            ConversionTime::Us1100 => 1100,
            ConversionTime::Us2116 => 2116,
            ConversionTime::Us4156 => 4156,
            ConversionTime::Us8244 => 8244,
        };
        MicrosDurationU32::micros(us)
    }
}

/// Operating mode. `MODE` field of the configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumCount, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OperatingMode {
    Shutdown = 0,
    SingleShotShunt = 1,
    SingleShotBus = 2,
    SingleShotShuntAndBus = 3,
    /// Second encoding of shutdown.
    Shutdown2 = 4,
    ContinuousShunt = 5,
    ContinuousBus = 6,
    /// Power-on default.
    #[default]
    ContinuousShuntAndBus = 7,
}

impl OperatingMode {
    /// Whether the shunt channel is converted in this mode.
    pub const fn measures_shunt(&self) -> bool {
        matches!(
            self,
            OperatingMode::SingleShotShunt
                | OperatingMode::SingleShotShuntAndBus
                | OperatingMode::ContinuousShunt
                | OperatingMode::ContinuousShuntAndBus
        )
    }

    /// Whether the bus channel is converted in this mode.
    pub const fn measures_bus(&self) -> bool {
        matches!(
            self,
            OperatingMode::SingleShotBus
                | OperatingMode::SingleShotShuntAndBus
                | OperatingMode::ContinuousBus
                | OperatingMode::ContinuousShuntAndBus
        )
    }
}

/// The event which asserts the alert pin.
///
/// The device only runs one limit comparator at a time, so these are mutually exclusive.
/// The limit unit follows the kind: millivolts for shunt, volts for bus, watts for power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumCount)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertTrigger {
    /// No limit comparator enabled.
    #[default]
    None,
    ShuntOverLimit,
    ShuntUnderLimit,
    BusOverLimit,
    BusUnderLimit,
    PowerOverLimit,
}

/// Alert pin polarity. `APOL` bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertPolarity {
    /// Pin pulled low on alert.
    #[default]
    ActiveLow,
    /// Pin released (open-drain high) on alert.
    ActiveHigh,
}

/// Alert pin latch behaviour. `LEN` bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertLatch {
    /// Pin follows the comparator.
    #[default]
    Transparent,
    /// Pin stays asserted until the Mask/Enable register is read.
    Latched,
}

/// What caused the alert pin to assert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlertSource {
    /// A conversion completed (conversion-ready notification).
    DataReady,
    /// The configured limit comparator tripped.
    LimitReached,
}

/// Error state reported by the `MemError` and `OVF` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCount)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// No error flagged.
    Clear,
    /// Memory CRC or ECC error.
    Memory,
    /// Arithmetic overflow in the current or power calculation.
    Overflow,
    Both,
}

/// All flags of one Mask/Enable register read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags {
    /// `CVRF`: a conversion completed since the last read.
    pub conversion_ready: bool,
    /// `AFF`: the limit comparator tripped.
    pub alert_function: bool,
    /// `OVF`: arithmetic overflow.
    pub math_overflow: bool,
    /// `MemError`: memory CRC or ECC error.
    pub memory_error: bool,
}

impl StatusFlags {
    /// Combine the two error flags into one outcome.
    pub fn error(&self) -> DeviceError {
        crate::scaling::decode_device_error(self.memory_error, self.math_overflow)
    }

    /// Source of the last alert pin assertion.
    pub fn alert_source(&self) -> AlertSource {
        if self.alert_function {
            AlertSource::LimitReached
        } else {
            AlertSource::DataReady
        }
    }
}
