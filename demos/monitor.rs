//! Prints INA234 measurements from a Linux I2C bus five times a second.
//!
//! Usage: `cargo run --example monitor [/dev/i2c-N]`

use std::env;

// Configuration constants - adjust these for your setup
const DEFAULT_BUS: &str = "/dev/i2c-1";

#[cfg(target_os = "linux")]
fn main() {
    use ina234::{
        AdcRange, AlertConfig, AlertTrigger, ConversionTime, DEFAULT_ADDRESS,
        DeviceConfigBuilder, Ina234, OperatingMode,
    };
    use linux_embedded_hal::I2cdev;

    const SHUNT_RESISTANCE_MOHM: f32 = 1.0;
    const SHUNT_ALERT_LIMIT_MV: f32 = 2.5;
    const SAMPLE_PERIOD_MS: u64 = 200;

    // Get the I2C bus from command line arg, or use the default.
    let bus = env::args().nth(1).unwrap_or_else(|| DEFAULT_BUS.to_string());
    println!("Using bus: {}", bus);

    let i2c = I2cdev::new(&bus).expect("Failed to open I2C bus");

    let config = DeviceConfigBuilder::new(SHUNT_RESISTANCE_MOHM)
        .with_adc_range(AdcRange::Range20_48mV)
        .with_shunt_conversion_time(ConversionTime::Us140)
        .with_bus_conversion_time(ConversionTime::Us140)
        .with_mode(OperatingMode::ContinuousShuntAndBus)
        .build()
        .expect("Invalid configuration");
    println!("Conversion cycle: {:?}", config.conversion_cycle());

    let mut ina = Ina234::new(i2c, DEFAULT_ADDRESS, config).expect("INA234 init failed");
    ina.configure_alert(AlertConfig::new(
        AlertTrigger::ShuntOverLimit,
        SHUNT_ALERT_LIMIT_MV,
    ))
    .expect("Alert init failed");

    println!("Manufacturer ID is 0x{:04X}", ina.manufacturer_id().unwrap());
    println!("      Device ID is 0x{:03X}", ina.die_id().unwrap());

    loop {
        let m = ina.read_all().unwrap();
        println!(
            "Shunt Voltage: {:.3}mV \t Bus Voltage: {:.2}V \t Current: {:.2}A \t Power: {:.2}W",
            m.shunt_voltage_mv, m.bus_voltage_v, m.current_a, m.power_w
        );
        std::thread::sleep(std::time::Duration::from_millis(SAMPLE_PERIOD_MS));
    }
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!(
        "This demo needs a Linux I2C device such as {}. Args: {:?}",
        DEFAULT_BUS,
        env::args().collect::<Vec<_>>()
    );
}
