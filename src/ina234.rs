use embedded_hal::i2c::I2c;

use crate::{
    config::{AlertConfig, DeviceConfig},
    error::{Error, Result},
    register::{
        AlertLimitRegister, BusVoltageRegister, CalibrationRegister, ConfigurationRegister,
        CurrentRegister, DeviceIdRegister, GENERAL_CALL_ADDRESS, GENERAL_CALL_RESET,
        ManufacturerIdRegister, MaskEnableRegister, PowerRegister, Register,
        ShuntVoltageRegister,
    },
    scaling::{Measurements, ScalingFactors},
    types::{
        AdcRange, AlertSource, Averaging, ConversionTime, DeviceError, OperatingMode,
        StatusFlags,
    },
};

/// Bus address with the `A0` pin tied to ground.
pub const DEFAULT_ADDRESS: u8 = 0x48;

/// You can create an Ina234 using any bus which implements [embedded_hal::i2c::I2c].
///
/// For its methods, "set" writes a configuration value and "read" fetches a measured value
/// or flag from the device. The configuration held here is the source of truth. Register
/// images are built from it on every write.
///
/// Every call is a blocking exchange on the bus. A failed transfer is returned as
/// [`Error::TransportTimeout`] and never retried.
pub struct Ina234<I2C> {
    i2c: I2C,
    /// 7-bit bus address.
    address: u8,
    config: DeviceConfig,
    alert: AlertConfig,
    scaling: ScalingFactors,
    measurements: Measurements,
}

impl<I2C: I2c> Ina234<I2C> {
    /// Create a new Ina234 and apply `config`: configuration register first, then
    /// calibration.
    ///
    /// The calibration value is checked before anything is written. A shunt resistance or
    /// maximum current which is not positive fails with [`Error::ConfigurationOutOfRange`].
    pub fn new(i2c: I2C, address: u8, config: DeviceConfig) -> Result<Self, I2C::Error> {
        let mut ina = Self {
            i2c,
            address,
            config,
            alert: AlertConfig::default(),
            scaling: config.scaling(),
            measurements: Measurements::default(),
        };
        let calibration = config.calibration()?;
        ina.write_register(ConfigurationRegister::from_config(&config))?;
        ina.write_register(CalibrationRegister::new().with_shunt_cal(calibration))?;
        Ok(ina)
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn alert_config(&self) -> &AlertConfig {
        &self.alert
    }

    pub fn scaling(&self) -> &ScalingFactors {
        &self.scaling
    }

    /// Configure the alert pin: limit register first, then Mask/Enable.
    ///
    /// The limit is converted with the LSB of the current range. Nothing is written when
    /// it does not fit the limit register.
    pub fn configure_alert(&mut self, alert: AlertConfig) -> Result<(), I2C::Error> {
        let limit = alert.raw_limit(&self.scaling)?;
        self.write_register(AlertLimitRegister::new().with_limit(limit))?;
        self.write_register(MaskEnableRegister::from_alert(&alert))?;
        self.alert = alert;
        Ok(())
    }

    /// Switch the shunt ADC range.
    ///
    /// The calibration register is rewritten for the new range, as is the alert limit when
    /// a shunt comparator is enabled.
    ///
    /// Once the configuration register is written the held range follows the device, even
    /// if a later write fails. Call [Self::reset] to bring calibration and the limit back in
    /// step after such a failure.
    pub fn set_adc_range(&mut self, range: AdcRange) -> Result<(), I2C::Error> {
        let config = DeviceConfig {
            adc_range: range,
            ..self.config
        };
        let scaling = config.scaling();
        let calibration = config.calibration()?;
        let limit = if self.alert.compares_shunt() {
            Some(self.alert.raw_limit(&scaling)?)
        } else {
            None
        };

        self.modify_configuration(|register| register.with_adc_range(range))?;
        self.config = config;
        self.scaling = scaling;

        self.write_register(CalibrationRegister::new().with_shunt_cal(calibration))?;
        if let Some(limit) = limit {
            self.write_register(AlertLimitRegister::new().with_limit(limit))?;
        }
        Ok(())
    }

    pub fn set_averaging(&mut self, averaging: Averaging) -> Result<(), I2C::Error> {
        self.modify_configuration(|register| register.with_averaging(averaging))?;
        self.config.averaging = averaging;
        Ok(())
    }

    pub fn set_bus_conversion_time(&mut self, time: ConversionTime) -> Result<(), I2C::Error> {
        self.modify_configuration(|register| register.with_bus_conversion_time(time))?;
        self.config.bus_conversion_time = time;
        Ok(())
    }

    pub fn set_shunt_conversion_time(&mut self, time: ConversionTime) -> Result<(), I2C::Error> {
        self.modify_configuration(|register| register.with_shunt_conversion_time(time))?;
        self.config.shunt_conversion_time = time;
        Ok(())
    }

    /// Takes effect on the device over one conversion cycle.
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), I2C::Error> {
        self.modify_configuration(|register| register.with_operating_mode(mode))?;
        self.config.mode = mode;
        Ok(())
    }

    /// Set the shunt resistor value in milliohms and rewrite the calibration register.
    pub fn set_shunt_resistance(&mut self, resistance_mohm: f32) -> Result<(), I2C::Error> {
        let config = DeviceConfig {
            shunt_resistance_mohm: resistance_mohm,
            ..self.config
        };
        let calibration = config.calibration()?;
        self.write_register(CalibrationRegister::new().with_shunt_cal(calibration))?;
        self.config = config;
        Ok(())
    }

    /// Read back the configuration register.
    pub fn read_configuration(&mut self) -> Result<ConfigurationRegister, I2C::Error> {
        self.read_register()
    }

    /// Reset this device through the `RST` bit, then apply the held configuration,
    /// calibration and alert settings again.
    pub fn reset(&mut self) -> Result<(), I2C::Error> {
        let calibration = self.config.calibration()?;
        let limit = self.alert.raw_limit(&self.scaling)?;

        self.write_register(ConfigurationRegister::new().with_rst(true))?;
        self.write_register(ConfigurationRegister::from_config(&self.config))?;
        self.write_register(CalibrationRegister::new().with_shunt_cal(calibration))?;
        self.write_register(AlertLimitRegister::new().with_limit(limit))?;
        self.write_register(MaskEnableRegister::from_alert(&self.alert))?;
        self.measurements = Measurements::default();
        Ok(())
    }

    /// Reset every device on the bus with a general call.
    ///
    /// __Note:__ this handle's configuration is not re-applied. Call [Self::reset] or build a
    /// new handle afterwards.
    pub fn soft_reset_all(&mut self) -> Result<(), I2C::Error> {
        #[cfg(feature = "defmt")]
        defmt::debug!("General call reset");
        self.i2c
            .write(GENERAL_CALL_ADDRESS, &[GENERAL_CALL_RESET])
            .map_err(Error::TransportTimeout)
    }

    /// Read the manufacturer ID. `0x5449` for Texas Instruments.
    pub fn manufacturer_id(&mut self) -> Result<u16, I2C::Error> {
        let register: ManufacturerIdRegister = self.read_register()?;
        Ok(register.manufacturer_id())
    }

    /// Read the 12-bit die ID. `0x234` for this device.
    pub fn die_id(&mut self) -> Result<u16, I2C::Error> {
        let register: DeviceIdRegister = self.read_register()?;
        Ok(register.die_id())
    }

    /// Return the measured shunt voltage in millivolts.
    pub fn read_shunt_voltage_mv(&mut self) -> Result<f32, I2C::Error> {
        let register: ShuntVoltageRegister = self.read_register()?;
        let voltage_mv = self.scaling.raw_to_shunt_voltage_mv(register.shunt_voltage());
        self.measurements.shunt_voltage_mv = voltage_mv;
        Ok(voltage_mv)
    }

    /// Return the measured bus voltage in volts.
    pub fn read_bus_voltage_v(&mut self) -> Result<f32, I2C::Error> {
        let register: BusVoltageRegister = self.read_register()?;
        let voltage_v = self.scaling.raw_to_bus_voltage_v(register.vbus());
        self.measurements.bus_voltage_v = voltage_v;
        Ok(voltage_v)
    }

    /// Return the measured current in amps. Negative for reverse current.
    pub fn read_current_a(&mut self) -> Result<f32, I2C::Error> {
        let register: CurrentRegister = self.read_register()?;
        let current_a = self.scaling.raw_to_current_a(register.current_raw());
        self.measurements.current_a = current_a;
        Ok(current_a)
    }

    /// Return the measured power in watts.
    pub fn read_power_w(&mut self) -> Result<f32, I2C::Error> {
        let register: PowerRegister = self.read_register()?;
        let power_w = self.scaling.raw_to_power_w(register.power());
        self.measurements.power_w = power_w;
        Ok(power_w)
    }

    /// Read all four measurements, one register at a time.
    ///
    /// The values may come from different conversion cycles.
    pub fn read_all(&mut self) -> Result<Measurements, I2C::Error> {
        self.read_shunt_voltage_mv()?;
        self.read_bus_voltage_v()?;
        self.read_current_a()?;
        self.read_power_w()?;
        Ok(self.measurements)
    }

    /// The last value read of each measurement.
    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    /// Read the status flags.
    ///
    /// __Note:__ reading the Mask/Enable register clears a latched alert. So do
    /// [Self::is_data_ready], [Self::alert_source], [Self::errors] and [Self::reset_alert],
    /// which all read it.
    pub fn read_status(&mut self) -> Result<StatusFlags, I2C::Error> {
        let register: MaskEnableRegister = self.read_register()?;
        Ok(register.status())
    }

    /// Whether a conversion completed. Clears a latched alert.
    pub fn is_data_ready(&mut self) -> Result<bool, I2C::Error> {
        Ok(self.read_status()?.conversion_ready)
    }

    /// What asserted the alert pin. Clears a latched alert.
    pub fn alert_source(&mut self) -> Result<AlertSource, I2C::Error> {
        Ok(self.read_status()?.alert_source())
    }

    /// Memory and overflow errors flagged by the device. Clears a latched alert.
    pub fn errors(&mut self) -> Result<DeviceError, I2C::Error> {
        Ok(self.read_status()?.error())
    }

    /// Release a latched alert pin.
    pub fn reset_alert(&mut self) -> Result<(), I2C::Error> {
        self.read_status()?;
        Ok(())
    }

    fn modify_configuration(
        &mut self,
        modify: impl FnOnce(ConfigurationRegister) -> ConfigurationRegister,
    ) -> Result<(), I2C::Error> {
        let register: ConfigurationRegister = self.read_register()?;
        self.write_register(modify(register).with_rst(false))
    }

    /// Read a single register from the device.
    pub fn read_register<R: Register>(&mut self) -> Result<R, I2C::Error> {
        let mut buff = [0u8; 2];
        self.i2c
            .write_read(self.address, &[R::ADDRESS.into()], &mut buff)
            .map_err(Error::TransportTimeout)?;
        #[cfg(feature = "defmt")]
        defmt::trace!("Read {} <- {=u16:#06x}", R::ADDRESS, u16::from_be_bytes(buff));
        Ok(R::decode(buff))
    }

    /// Write a single register of the device.
    pub fn write_register<R: Register>(&mut self, register: R) -> Result<(), I2C::Error> {
        let [high, low] = register.encode();
        #[cfg(feature = "defmt")]
        defmt::trace!("Write {} -> {=u16:#06x}", R::ADDRESS, u16::from_be_bytes([high, low]));
        self.i2c
            .write(self.address, &[R::ADDRESS.into(), high, low])
            .map_err(Error::TransportTimeout)
    }
}
