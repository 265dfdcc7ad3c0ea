//! Scaling between raw register counts and physical units.
//!
//! The LSB sizes are fixed by the ADC resolution. Only the current LSB depends on the
//! design, through the maximum expected current, and it must agree with the value
//! written to the calibration register for current and power readouts to be meaningful.
//!
//! Raw values are derived by truncating toward zero, the same way the device's fixed
//! point arithmetic does. Products and quotients are computed in `f64`.

use crate::{
    config::{AlertConfig, DeviceConfig},
    error::OutOfRange,
    register::RegisterAddress,
    types::{AdcRange, AlertTrigger, DeviceError},
};

/// Current LSB is the maximum expected current divided by this.
pub const CURRENT_LSB_DIVISOR: f64 = 2048.0;

/// Maximum expected current of the reference design, in amps.
pub const DEFAULT_MAX_EXPECTED_CURRENT_A: f32 = 5.0;

/// Bus voltage LSB in volts.
pub const BUS_VOLTAGE_LSB_V: f64 = 0.025;

/// Shunt voltage LSB in millivolts for the ±81.92 mV range.
pub const SHUNT_VOLTAGE_LSB_81_92_MV: f64 = 0.04;

/// Shunt voltage LSB in millivolts for the ±20.48 mV range.
pub const SHUNT_VOLTAGE_LSB_20_48_MV: f64 = 0.01;

/// Power LSB is the current LSB times this.
pub const POWER_LSB_FACTOR: f64 = 0.032;

/// Largest value of the 15-bit `SHUNT_CAL` field.
pub const SHUNT_CAL_MAX: u16 = 0x7FFF;

/// Alert limit written when no comparator is enabled.
pub const ALERT_LIMIT_DISABLED: i16 = 0x7FFF;

/// Step sizes for converting raw register values to physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScalingFactors {
    /// Amps per count of the current register.
    pub current_lsb_a: f64,
    /// Millivolts per count of the shunt voltage register.
    pub shunt_voltage_lsb_mv: f64,
    /// Volts per count of the bus voltage register.
    pub bus_voltage_lsb_v: f64,
    /// Watts per count of the power register.
    pub power_lsb_w: f64,
}

impl ScalingFactors {
    /// Create the scaling factors for a maximum expected current and ADC range.
    pub fn new(max_expected_current_a: f32, range: AdcRange) -> Self {
        let current_lsb_a = f64::from(max_expected_current_a) / CURRENT_LSB_DIVISOR;
        Self {
            current_lsb_a,
            shunt_voltage_lsb_mv: shunt_voltage_lsb_mv(range),
            bus_voltage_lsb_v: BUS_VOLTAGE_LSB_V,
            power_lsb_w: current_lsb_a * POWER_LSB_FACTOR,
        }
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(config.max_expected_current_a, config.adc_range)
    }

    #[inline]
    pub fn raw_to_current_a(&self, raw: i16) -> f32 {
        to_physical(raw.into(), self.current_lsb_a) as f32
    }

    #[inline]
    pub fn current_a_to_raw(&self, current_a: f32) -> i64 {
        to_raw(current_a.into(), self.current_lsb_a)
    }

    #[inline]
    pub fn raw_to_shunt_voltage_mv(&self, raw: i16) -> f32 {
        to_physical(raw.into(), self.shunt_voltage_lsb_mv) as f32
    }

    #[inline]
    pub fn shunt_voltage_mv_to_raw(&self, voltage_mv: f32) -> i64 {
        to_raw(voltage_mv.into(), self.shunt_voltage_lsb_mv)
    }

    #[inline]
    pub fn raw_to_bus_voltage_v(&self, raw: u16) -> f32 {
        to_physical(raw.into(), self.bus_voltage_lsb_v) as f32
    }

    #[inline]
    pub fn bus_voltage_v_to_raw(&self, voltage_v: f32) -> i64 {
        to_raw(voltage_v.into(), self.bus_voltage_lsb_v)
    }

    #[inline]
    pub fn raw_to_power_w(&self, raw: u16) -> f32 {
        to_physical(raw.into(), self.power_lsb_w) as f32
    }

    #[inline]
    pub fn power_w_to_raw(&self, power_w: f32) -> i64 {
        to_raw(power_w.into(), self.power_lsb_w)
    }

    /// LSB and raw bounds of the quantity compared by `trigger`. `None` when no comparator
    /// is enabled.
    ///
    /// Shunt limits may be negative. Power limits use the full unsigned range of the power
    /// register.
    pub fn alert_scale(&self, trigger: AlertTrigger) -> Option<AlertScale> {
        let (lsb, min, max) = match trigger {
            AlertTrigger::None => return None,
            AlertTrigger::ShuntOverLimit | AlertTrigger::ShuntUnderLimit => (
                self.shunt_voltage_lsb_mv,
                i16::MIN.into(),
                i16::MAX.into(),
            ),
            AlertTrigger::BusOverLimit | AlertTrigger::BusUnderLimit => {
                (self.bus_voltage_lsb_v, 0, i16::MAX.into())
            }
            AlertTrigger::PowerOverLimit => (self.power_lsb_w, 0, u16::MAX.into()),
        };
        Some(AlertScale { lsb, min, max })
    }
}

/// Scale of an alert limit register value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertScale {
    /// Physical units per count.
    pub lsb: f64,
    pub min: i64,
    pub max: i64,
}

/// Shunt voltage LSB in millivolts for a range.
pub const fn shunt_voltage_lsb_mv(range: AdcRange) -> f64 {
    match range {
        AdcRange::Range81_92mV => SHUNT_VOLTAGE_LSB_81_92_MV,
        AdcRange::Range20_48mV => SHUNT_VOLTAGE_LSB_20_48_MV,
    }
}

/// `raw * lsb`.
#[inline]
pub fn to_physical(raw: i32, lsb: f64) -> f64 {
    f64::from(raw) * lsb
}

/// `value / lsb`, truncated toward zero. Saturates, and NaN gives `0`.
#[inline]
pub fn to_raw(value: f64, lsb: f64) -> i64 {
    (value / lsb) as i64
}

/// Truncate `quotient` toward zero, failing unless the result lies within `min..=max`.
fn checked_raw(
    register: RegisterAddress,
    quotient: f64,
    min: i64,
    max: i64,
) -> Result<i64, OutOfRange> {
    let raw = quotient as i64;
    if quotient.is_finite() && raw >= min && raw <= max {
        Ok(raw)
    } else {
        Err(OutOfRange {
            register,
            value: quotient,
        })
    }
}

/// Value of the `SHUNT_CAL` field for a configuration.
///
/// `full_scale_mV / (current_LSB * shunt_resistance_mOhm)`, truncated toward zero. The shunt
/// resistance and maximum expected current must both be positive.
pub fn shunt_calibration(config: &DeviceConfig) -> Result<u16, OutOfRange> {
    for input in [config.shunt_resistance_mohm, config.max_expected_current_a] {
        if !(input.is_finite() && input > 0.0) {
            return Err(OutOfRange {
                register: RegisterAddress::Calibration,
                value: input.into(),
            });
        }
    }
    let current_lsb_a = ScalingFactors::from_config(config).current_lsb_a;
    let quotient = config.adc_range.full_scale_mv()
        / (current_lsb_a * f64::from(config.shunt_resistance_mohm));
    let raw = checked_raw(
        RegisterAddress::Calibration,
        quotient,
        0,
        SHUNT_CAL_MAX.into(),
    )?;
    Ok(raw as u16)
}

/// Value of the alert limit register for an alert configuration.
///
/// The limit is divided by the LSB matching the trigger kind and configured range. Power
/// limits are returned as their 16-bit pattern.
pub fn alert_limit_raw(alert: &AlertConfig, scaling: &ScalingFactors) -> Result<i16, OutOfRange> {
    let Some(AlertScale { lsb, min, max }) = scaling.alert_scale(alert.trigger) else {
        return Ok(ALERT_LIMIT_DISABLED);
    };
    let quotient = f64::from(alert.limit) / lsb;
    let raw = checked_raw(RegisterAddress::AlertLimit, quotient, min, max)?;
    Ok(raw as u16 as i16)
}

const DEVICE_ERRORS: [DeviceError; 4] = [
    DeviceError::Clear,
    DeviceError::Overflow,
    DeviceError::Memory,
    DeviceError::Both,
];

/// Combine the `MemError` and `OVF` flags.
pub fn decode_device_error(memory_error: bool, math_overflow: bool) -> DeviceError {
    DEVICE_ERRORS[(usize::from(memory_error) << 1) | usize::from(math_overflow)]
}

/// The four measured quantities, each refreshed by its own register read.
///
/// Values read one after another may come from different conversion cycles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurements {
    pub shunt_voltage_mv: f32,
    pub bus_voltage_v: f32,
    pub current_a: f32,
    pub power_w: f32,
}
