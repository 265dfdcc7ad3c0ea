//! This module is used to define the registers on the INA234 and their bit layouts.
//!
//! Every register is a 16-bit word which the device sends and receives most significant
//! byte first. Layouts are declared least significant bit first, so the two wire bytes
//! are exchanged before a layout is interpreted and again before it is transmitted.

use modular_bitfield::prelude::*;
use strum_macros::EnumIter;

use crate::config::{AlertConfig, DeviceConfig};
use crate::types::{
    AdcRange, AlertLatch, AlertPolarity, AlertTrigger, Averaging, ConversionTime, OperatingMode,
    StatusFlags,
};

/// Value of the manufacturer ID register, ASCII "TI".
pub const MANUFACTURER_ID: u16 = 0x5449;

/// Value of the `DIEID` field.
pub const DIE_ID: u16 = 0x234;

/// Bus address which every device on the bus listens to.
pub const GENERAL_CALL_ADDRESS: u8 = 0x00;

/// Byte which, sent to [`GENERAL_CALL_ADDRESS`], resets all devices on the bus.
pub const GENERAL_CALL_RESET: u8 = 0x06;

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RegisterAddress {
    /// __R/W__ - Mode, conversion times, averaging, ADC range and reset.
    Configuration = 0x00,
    /// __R__ - Shunt voltage, 12-bit two's complement.
    ShuntVoltage = 0x01,
    /// __R__ - Bus voltage, 11-bit unsigned.
    BusVoltage = 0x02,
    /// __R__ - Power, 16-bit unsigned.
    Power = 0x03,
    /// __R__ - Current, 12-bit two's complement.
    Current = 0x04,
    /// __R/W__ - Shunt calibration, 15-bit unsigned.
    Calibration = 0x05,
    /// __R/W__ - Alert configuration and status flags.
    ///
    /// Reading this register clears a latched alert.
    MaskEnable = 0x06,
    /// __R/W__ - Limit compared against the register selected in Mask/Enable.
    AlertLimit = 0x07,
    /// __R__ - Manufacturer ID.
    ManufacturerId = 0x3E,
    /// __R__ - Die ID.
    DeviceId = 0x3F,
}

impl From<RegisterAddress> for u8 {
    fn from(value: RegisterAddress) -> Self {
        value as u8
    }
}

/// Exchange the two bytes of a register word.
pub const fn swap_bytes(bytes: [u8; 2]) -> [u8; 2] {
    [bytes[1], bytes[0]]
}

/// Interpret a 12-bit two's complement field, extending bit 11 into bits 12 to 15.
pub const fn sign_extend_12(field: u16) -> i16 {
    ((field << 4) as i16) >> 4
}

/// Pack a signed value into a 12-bit field. Only the low 12 bits are kept.
pub const fn truncate_12(value: i16) -> u16 {
    (value as u16) & 0x0FFF
}

/// Common codec for the register layouts.
///
/// `image` is the in-memory order (least significant byte first), `wire` is the order the
/// device sends and expects.
pub trait Register: Copy {
    const ADDRESS: RegisterAddress;

    fn from_image(image: [u8; 2]) -> Self;

    fn into_image(self) -> [u8; 2];

    /// Decode the two bytes as received from the device.
    fn decode(wire: [u8; 2]) -> Self {
        Self::from_image(swap_bytes(wire))
    }

    /// Encode into the two bytes to transmit to the device.
    fn encode(self) -> [u8; 2] {
        swap_bytes(self.into_image())
    }

    /// The register as a 16-bit word.
    fn bits(self) -> u16 {
        u16::from_le_bytes(self.into_image())
    }

    fn from_bits(bits: u16) -> Self {
        Self::from_image(bits.to_le_bytes())
    }
}

macro_rules! impl_register {
    ($layout:ty, $address:expr) => {
        impl Register for $layout {
            const ADDRESS: RegisterAddress = $address;

            fn from_image(image: [u8; 2]) -> Self {
                Self::from_bytes(image)
            }

            fn into_image(self) -> [u8; 2] {
                self.into_bytes()
            }
        }
    };
}

/// `0x00` - Configuration register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationRegister {
    pub mode: B3,
    pub vshct: B3,
    pub vbusct: B3,
    pub avg: B3,
    pub adcrange: B1,
    #[skip]
    reserved: B2,
    /// Writing `1` resets the device. Self-clearing.
    pub rst: bool,
}

impl_register!(ConfigurationRegister, RegisterAddress::Configuration);

impl ConfigurationRegister {
    /// Layout for a configuration, with `RST` clear.
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new()
            .with_operating_mode(config.mode)
            .with_shunt_conversion_time(config.shunt_conversion_time)
            .with_bus_conversion_time(config.bus_conversion_time)
            .with_averaging(config.averaging)
            .with_adc_range(config.adc_range)
    }

    pub fn operating_mode(&self) -> OperatingMode {
        OperatingMode::from_repr(self.mode()).unwrap_or_default()
    }

    pub fn with_operating_mode(self, mode: OperatingMode) -> Self {
        self.with_mode(mode as u8)
    }

    pub fn shunt_conversion_time(&self) -> ConversionTime {
        ConversionTime::from_repr(self.vshct()).unwrap_or_default()
    }

    pub fn with_shunt_conversion_time(self, time: ConversionTime) -> Self {
        self.with_vshct(time as u8)
    }

    pub fn bus_conversion_time(&self) -> ConversionTime {
        ConversionTime::from_repr(self.vbusct()).unwrap_or_default()
    }

    pub fn with_bus_conversion_time(self, time: ConversionTime) -> Self {
        self.with_vbusct(time as u8)
    }

    pub fn averaging(&self) -> Averaging {
        Averaging::from_repr(self.avg()).unwrap_or_default()
    }

    pub fn with_averaging(self, averaging: Averaging) -> Self {
        self.with_avg(averaging as u8)
    }

    pub fn adc_range(&self) -> AdcRange {
        AdcRange::from_repr(self.adcrange()).unwrap_or_default()
    }

    pub fn with_adc_range(self, range: AdcRange) -> Self {
        self.with_adcrange(range as u8)
    }
}

/// `0x01` - Shunt voltage register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuntVoltageRegister {
    #[skip]
    reserved: B4,
    pub vshunt: B12,
}

impl_register!(ShuntVoltageRegister, RegisterAddress::ShuntVoltage);

impl ShuntVoltageRegister {
    /// Signed shunt voltage count, -2048 to 2047.
    pub fn shunt_voltage(&self) -> i16 {
        sign_extend_12(self.vshunt())
    }

    pub fn with_shunt_voltage(self, raw: i16) -> Self {
        self.with_vshunt(truncate_12(raw))
    }
}

/// `0x02` - Bus voltage register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusVoltageRegister {
    #[skip]
    reserved_low: B4,
    pub vbus: B11,
    #[skip]
    reserved_high: B1,
}

impl_register!(BusVoltageRegister, RegisterAddress::BusVoltage);

/// `0x03` - Power register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerRegister {
    pub power: u16,
}

impl_register!(PowerRegister, RegisterAddress::Power);

/// `0x04` - Current register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentRegister {
    #[skip]
    reserved: B4,
    pub current: B12,
}

impl_register!(CurrentRegister, RegisterAddress::Current);

impl CurrentRegister {
    /// Signed current count, -2048 to 2047. Negative for reverse current.
    pub fn current_raw(&self) -> i16 {
        sign_extend_12(self.current())
    }

    pub fn with_current_raw(self, raw: i16) -> Self {
        self.with_current(truncate_12(raw))
    }
}

/// `0x05` - Calibration register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationRegister {
    pub shunt_cal: B15,
    #[skip]
    reserved: B1,
}

impl_register!(CalibrationRegister, RegisterAddress::Calibration);

/// `0x06` - Mask/Enable register.
///
/// The low byte holds configuration bits and read-only flags, the high byte selects the
/// limit comparator.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskEnableRegister {
    /// Alert latch enable.
    pub len: bool,
    /// Alert polarity.
    pub apol: bool,
    /// Math overflow flag.
    pub ovf: bool,
    /// Conversion ready flag.
    pub cvrf: bool,
    /// Alert function flag.
    pub aff: bool,
    /// Memory CRC/ECC error flag.
    pub mem_error: bool,
    #[skip]
    reserved: B4,
    /// Assert alert on conversion ready.
    pub cnvr: bool,
    /// Power over limit.
    pub pol: bool,
    /// Bus voltage under limit.
    pub bul: bool,
    /// Bus voltage over limit.
    pub bol: bool,
    /// Shunt voltage under limit.
    pub sul: bool,
    /// Shunt voltage over limit.
    pub sol: bool,
}

impl_register!(MaskEnableRegister, RegisterAddress::MaskEnable);

impl MaskEnableRegister {
    /// Layout enabling the comparator and pin behaviour of an alert configuration.
    pub fn from_alert(alert: &AlertConfig) -> Self {
        Self::new()
            .with_alert_trigger(alert.trigger)
            .with_cnvr(alert.conversion_ready)
            .with_apol(alert.polarity == AlertPolarity::ActiveHigh)
            .with_len(alert.latch == AlertLatch::Latched)
    }

    /// The enabled comparator, or `None` when more than one comparator bit is set.
    pub fn alert_trigger(&self) -> Option<AlertTrigger> {
        match (self.sol(), self.sul(), self.bol(), self.bul(), self.pol()) {
            (false, false, false, false, false) => Some(AlertTrigger::None),
            (true, false, false, false, false) => Some(AlertTrigger::ShuntOverLimit),
            (false, true, false, false, false) => Some(AlertTrigger::ShuntUnderLimit),
            (false, false, true, false, false) => Some(AlertTrigger::BusOverLimit),
            (false, false, false, true, false) => Some(AlertTrigger::BusUnderLimit),
            (false, false, false, false, true) => Some(AlertTrigger::PowerOverLimit),
            _ => None,
        }
    }

    /// Enable exactly the comparator for `trigger`, clearing the other four.
    pub fn with_alert_trigger(self, trigger: AlertTrigger) -> Self {
        self.with_sol(trigger == AlertTrigger::ShuntOverLimit)
            .with_sul(trigger == AlertTrigger::ShuntUnderLimit)
            .with_bol(trigger == AlertTrigger::BusOverLimit)
            .with_bul(trigger == AlertTrigger::BusUnderLimit)
            .with_pol(trigger == AlertTrigger::PowerOverLimit)
    }

    pub fn polarity(&self) -> AlertPolarity {
        if self.apol() {
            AlertPolarity::ActiveHigh
        } else {
            AlertPolarity::ActiveLow
        }
    }

    pub fn latch(&self) -> AlertLatch {
        if self.len() {
            AlertLatch::Latched
        } else {
            AlertLatch::Transparent
        }
    }

    pub fn status(&self) -> StatusFlags {
        StatusFlags {
            conversion_ready: self.cvrf(),
            alert_function: self.aff(),
            math_overflow: self.ovf(),
            memory_error: self.mem_error(),
        }
    }
}

/// `0x07` - Alert limit register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertLimitRegister {
    pub limit_bits: u16,
}

impl_register!(AlertLimitRegister, RegisterAddress::AlertLimit);

impl AlertLimitRegister {
    pub fn limit(&self) -> i16 {
        self.limit_bits() as i16
    }

    pub fn with_limit(self, limit: i16) -> Self {
        self.with_limit_bits(limit as u16)
    }
}

/// `0x3E` - Manufacturer ID register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerIdRegister {
    pub manufacturer_id: u16,
}

impl_register!(ManufacturerIdRegister, RegisterAddress::ManufacturerId);

/// `0x3F` - Device ID register.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdRegister {
    #[skip]
    reserved: B4,
    pub die_id: B12,
}

impl_register!(DeviceIdRegister, RegisterAddress::DeviceId);
