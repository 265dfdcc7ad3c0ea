//! We use this mocking module in unit tests to emulate an INA234 on an I2C bus.

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, Operation};

use crate::register::{GENERAL_CALL_ADDRESS, GENERAL_CALL_RESET, RegisterAddress};

/// Configuration register value after power-on or reset.
pub const POWER_ON_CONFIGURATION: u16 = 0x0127;

/// Mask/Enable bits which a write can change. The rest are read-only flags.
const MASK_ENABLE_WRITABLE: u16 = 0xFC03;
const LEN_BIT: u16 = 1 << 0;
const AFF_BIT: u16 = 1 << 4;
const RST_BIT: u16 = 1 << 15;

/// A register write seen by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub register: u8,
    pub value: u16,
}

/// Our mock type used to emulate an INA234.
pub struct MockI2c {
    /// Bus address the mock device answers on.
    address: u8,
    /// Register file, indexed by register address.
    registers: [u16; 0x40],
    /// Register selected by the last write.
    pointer: u8,
    /// Every register write, in order.
    writes: heapless::Vec<RegisterWrite, 64>,
    /// Number of general-call resets received.
    general_calls: usize,
    /// Flag to simulate a bus timeout on every transaction.
    should_time_out: bool,
    /// Transactions left before timeouts start.
    transactions_left: Option<usize>,
}

#[derive(Debug)]
pub enum MockI2cError {
    /// Simulated timeout error
    Timeout,
    /// Nothing answered on the address.
    NoDevice,
    /// Register pointer outside the register file.
    InvalidRegister,
    /// Write log is full.
    BufferOverflow,
}

impl embedded_hal::i2c::Error for MockI2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            MockI2cError::Timeout => ErrorKind::Other,
            MockI2cError::NoDevice => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            MockI2cError::InvalidRegister => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            MockI2cError::BufferOverflow => ErrorKind::Overrun,
        }
    }
}

impl embedded_hal::i2c::ErrorType for MockI2c {
    type Error = MockI2cError;
}

impl embedded_hal::i2c::I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if let Some(left) = self.transactions_left.as_mut() {
            if *left == 0 {
                return Err(MockI2cError::Timeout);
            }
            *left -= 1;
        }
        if self.should_time_out {
            return Err(MockI2cError::Timeout);
        }

        if address == GENERAL_CALL_ADDRESS {
            for operation in operations.iter() {
                if let Operation::Write([GENERAL_CALL_RESET]) = operation {
                    self.general_calls += 1;
                    self.power_on();
                }
            }
            return Ok(());
        }

        if address != self.address {
            return Err(MockI2cError::NoDevice);
        }

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => self.handle_write(bytes)?,
                Operation::Read(buffer) => self.handle_read(buffer)?,
            }
        }
        Ok(())
    }
}

impl MockI2c {
    /// Create a new MockI2c with power-on register values.
    pub fn new(address: u8) -> Self {
        let mut mock = Self {
            address,
            registers: [0; 0x40],
            pointer: 0,
            writes: heapless::Vec::new(),
            general_calls: 0,
            should_time_out: false,
            transactions_left: None,
        };
        mock.power_on();
        mock
    }

    fn power_on(&mut self) {
        self.registers = [0; 0x40];
        self.registers[RegisterAddress::Configuration as usize] = POWER_ON_CONFIGURATION;
        self.registers[RegisterAddress::ManufacturerId as usize] = 0x5449;
        self.registers[RegisterAddress::DeviceId as usize] = 0x2340;
        self.pointer = 0;
    }

    fn handle_write(&mut self, bytes: &[u8]) -> Result<(), MockI2cError> {
        let Some((&register, data)) = bytes.split_first() else {
            return Ok(());
        };
        if usize::from(register) >= self.registers.len() {
            return Err(MockI2cError::InvalidRegister);
        }
        self.pointer = register;

        if let [high, low] = data {
            let value = u16::from_be_bytes([*high, *low]);
            self.writes
                .push(RegisterWrite { register, value })
                .map_err(|_| MockI2cError::BufferOverflow)?;
            self.store(register, value);
        }
        Ok(())
    }

    fn store(&mut self, register: u8, value: u16) {
        match register {
            0x00 if value & RST_BIT != 0 => self.power_on(),
            0x00 | 0x05 | 0x07 => self.registers[usize::from(register)] = value,
            0x06 => {
                let flags = self.registers[0x06] & !MASK_ENABLE_WRITABLE;
                self.registers[0x06] = flags | (value & MASK_ENABLE_WRITABLE);
            }
            // Read-only registers ignore writes.
            _ => {}
        }
    }

    fn handle_read(&mut self, buffer: &mut [u8]) -> Result<(), MockI2cError> {
        let value = self.registers[usize::from(self.pointer)];
        for (byte, wire) in buffer.iter_mut().zip(value.to_be_bytes()) {
            *byte = wire;
        }

        // Reading Mask/Enable releases a latched alert.
        if self.pointer == 0x06 && value & LEN_BIT != 0 {
            self.registers[0x06] &= !AFF_BIT;
        }
        Ok(())
    }

    /// Preload a register, bypassing the write rules. Used to stage measurements and flags.
    pub fn set_register(&mut self, register: RegisterAddress, value: u16) {
        self.registers[register as usize] = value;
    }

    /// Current content of a register.
    pub fn register(&self, register: RegisterAddress) -> u16 {
        self.registers[register as usize]
    }

    /// Set the alert function flag, as the limit comparator would.
    pub fn trip_alert(&mut self) {
        self.registers[0x06] |= AFF_BIT;
    }

    /// Get the register writes seen so far.
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Clear the write log.
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    pub fn general_calls(&self) -> usize {
        self.general_calls
    }

    /// Configure whether transactions should fail with a timeout. Also cancels
    /// [Self::fail_after].
    pub fn set_timeout(&mut self, should_time_out: bool) {
        self.should_time_out = should_time_out;
        self.transactions_left = None;
    }

    /// Let `transactions` more transactions through, then time out every one after.
    pub fn fail_after(&mut self, transactions: usize) {
        self.transactions_left = Some(transactions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{Error, I2c};

    const ADDRESS: u8 = 0x48;

    #[test]
    fn test_power_on_values() {
        let mock = MockI2c::new(ADDRESS);
        assert_eq!(mock.register(RegisterAddress::Configuration), 0x0127);
        assert_eq!(mock.register(RegisterAddress::ManufacturerId), 0x5449);
        assert_eq!(mock.register(RegisterAddress::DeviceId), 0x2340);
        assert_eq!(mock.register(RegisterAddress::Calibration), 0);
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_write_then_read_back() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.write(ADDRESS, &[0x05, 0x20, 0xC4]).unwrap();
        assert_eq!(
            mock.writes(),
            &[RegisterWrite {
                register: 0x05,
                value: 0x20C4
            }]
        );

        let mut buffer = [0u8; 2];
        mock.write_read(ADDRESS, &[0x05], &mut buffer).unwrap();
        assert_eq!(buffer, [0x20, 0xC4]);
        // A pointer-only write is not logged.
        assert_eq!(mock.writes().len(), 1);
    }

    #[test]
    fn test_read_only_registers_ignore_writes() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.write(ADDRESS, &[0x3E, 0x00, 0x00]).unwrap();
        assert_eq!(mock.register(RegisterAddress::ManufacturerId), 0x5449);
    }

    #[test]
    fn test_mask_enable_keeps_flags() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.trip_alert();
        mock.write(ADDRESS, &[0x06, 0x80, 0x00]).unwrap();
        assert_eq!(mock.register(RegisterAddress::MaskEnable), 0x8000 | AFF_BIT);
    }

    #[test]
    fn test_latched_alert_clears_on_read() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.write(ADDRESS, &[0x06, 0x80, 0x01]).unwrap();
        mock.trip_alert();

        let mut first = [0u8; 2];
        let mut second = [0u8; 2];
        mock.write_read(ADDRESS, &[0x06], &mut first).unwrap();
        mock.write_read(ADDRESS, &[0x06], &mut second).unwrap();
        assert_eq!(u16::from_be_bytes(first) & AFF_BIT, AFF_BIT);
        assert_eq!(u16::from_be_bytes(second) & AFF_BIT, 0);
    }

    #[test]
    fn test_transparent_alert_persists() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.trip_alert();
        let mut buffer = [0u8; 2];
        mock.write_read(ADDRESS, &[0x06], &mut buffer).unwrap();
        mock.write_read(ADDRESS, &[0x06], &mut buffer).unwrap();
        assert_eq!(u16::from_be_bytes(buffer) & AFF_BIT, AFF_BIT);
    }

    #[test]
    fn test_reset_bit_restores_power_on() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.write(ADDRESS, &[0x05, 0x12, 0x34]).unwrap();
        mock.write(ADDRESS, &[0x00, 0x80, 0x00]).unwrap();
        assert_eq!(mock.register(RegisterAddress::Configuration), 0x0127);
        assert_eq!(mock.register(RegisterAddress::Calibration), 0);
    }

    #[test]
    fn test_general_call_reset() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.write(ADDRESS, &[0x07, 0x01, 0x00]).unwrap();
        mock.write(GENERAL_CALL_ADDRESS, &[GENERAL_CALL_RESET]).unwrap();
        assert_eq!(mock.general_calls(), 1);
        assert_eq!(mock.register(RegisterAddress::AlertLimit), 0);

        // Other general-call bytes are ignored.
        mock.write(GENERAL_CALL_ADDRESS, &[0x04]).unwrap();
        assert_eq!(mock.general_calls(), 1);
    }

    #[test]
    fn test_wrong_address_is_not_acknowledged() {
        let mut mock = MockI2c::new(ADDRESS);
        let result = mock.write(0x49, &[0x05, 0x00, 0x01]);
        assert!(matches!(result, Err(MockI2cError::NoDevice)));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_timeout_simulation() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.set_timeout(true);
        let mut buffer = [0u8; 2];
        let result = mock.write_read(ADDRESS, &[0x00], &mut buffer);
        assert!(matches!(result, Err(MockI2cError::Timeout)));

        mock.set_timeout(false);
        assert!(mock.write_read(ADDRESS, &[0x00], &mut buffer).is_ok());
    }

    #[test]
    fn test_fail_after() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.fail_after(1);
        assert!(mock.write(ADDRESS, &[0x05, 0x00, 0x01]).is_ok());
        assert!(matches!(
            mock.write(ADDRESS, &[0x05, 0x00, 0x02]),
            Err(MockI2cError::Timeout)
        ));
        assert_eq!(mock.register(RegisterAddress::Calibration), 1);

        mock.set_timeout(false);
        assert!(mock.write(ADDRESS, &[0x05, 0x00, 0x02]).is_ok());
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(MockI2cError::Timeout.kind(), ErrorKind::Other));
        assert!(matches!(
            MockI2cError::NoDevice.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        ));
        assert!(matches!(MockI2cError::BufferOverflow.kind(), ErrorKind::Overrun));
    }

    #[test]
    fn test_clear_writes() {
        let mut mock = MockI2c::new(ADDRESS);
        mock.write(ADDRESS, &[0x07, 0x00, 0x10]).unwrap();
        mock.clear_writes();
        assert!(mock.writes().is_empty());
    }
}
