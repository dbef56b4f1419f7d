//! LIS2DH12 3-axis accelerometer driver.
//!
//! I2C, any `embedded_hal::i2c::I2c` bus.  Configured for high-resolution
//! mode, ±2 g full scale, 10 Hz output data rate, which comfortably covers
//! the 5 Hz sampling cadence.  In HR mode each axis is a left-justified
//! 12-bit value at 1 mg/digit.

use embedded_hal::i2c::{Error as _, I2c};
use log::info;

use crate::error::SensorError;
use crate::motion::MotionSample;

/// I2C address with SA0 tied high.
pub const LIS2DH12_ADDR: u8 = 0x19;
/// I2C address with SA0 tied low.
pub const LIS2DH12_ADDR_ALT: u8 = 0x18;

/// Expected WHO_AM_I value.
pub const WHO_AM_I_VALUE: u8 = 0x33;

mod regs {
    pub const WHO_AM_I: u8 = 0x0F;
    pub const CTRL_REG1: u8 = 0x20;
    pub const CTRL_REG4: u8 = 0x23;
    pub const OUT_X_L: u8 = 0x28;
    /// Register auto-increment for multi-byte reads.
    pub const AUTO_INC: u8 = 0x80;
}

/// ODR 10 Hz, normal power, X/Y/Z enabled.
const CTRL_REG1_10HZ_XYZ: u8 = 0x27;
/// High-resolution, ±2 g.
const CTRL_REG4_HR_2G: u8 = 0x08;

/// Sensitivity in HR ±2 g mode, after the 4-bit right shift.
const MG_PER_DIGIT: f32 = 1.0;

pub struct Lis2dh12<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> Lis2dh12<I2C> {
    /// Which of the two strap addresses answers with the right WHO_AM_I.
    pub fn detect(i2c: &mut I2C) -> Option<u8> {
        [LIS2DH12_ADDR, LIS2DH12_ADDR_ALT].into_iter().find(|&addr| {
            let mut id = [0u8; 1];
            i2c.write_read(addr, &[regs::WHO_AM_I], &mut id).is_ok() && id[0] == WHO_AM_I_VALUE
        })
    }

    /// Query `addr`, verify WHO_AM_I and configure the sensor.
    pub fn new(i2c: I2C, addr: u8) -> Result<Self, SensorError> {
        let mut dev = Self { i2c, addr };
        let id = dev.read_reg(regs::WHO_AM_I)?;
        if id != WHO_AM_I_VALUE {
            return Err(SensorError::WrongDevice(id));
        }
        dev.write_reg(regs::CTRL_REG4, CTRL_REG4_HR_2G)?;
        dev.write_reg(regs::CTRL_REG1, CTRL_REG1_10HZ_XYZ)?;
        info!("LIS2DH12 at 0x{:02x}: HR, ±2g, 10 Hz", addr);
        Ok(dev)
    }

    /// Read one sample, in g per axis.
    pub fn read_g(&mut self) -> Result<MotionSample, SensorError> {
        let mut raw = [0u8; 6];
        self.i2c
            .write_read(self.addr, &[regs::OUT_X_L | regs::AUTO_INC], &mut raw)
            .map_err(|e| SensorError::Bus(e.kind()))?;

        let axis = |lo: u8, hi: u8| -> f32 {
            let counts = i16::from_le_bytes([lo, hi]) >> 4;
            counts as f32 * MG_PER_DIGIT / 1000.0
        };
        Ok(MotionSample::new(
            axis(raw[0], raw[1]),
            axis(raw[2], raw[3]),
            axis(raw[4], raw[5]),
        ))
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(|e| SensorError::Bus(e.kind()))?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.addr, &[reg, value])
            .map_err(|e| SensorError::Bus(e.kind()))
    }
}

impl<I2C: I2c> super::AccelerometerRead for Lis2dh12<I2C> {
    fn read_g(&mut self) -> Result<MotionSample, SensorError> {
        Lis2dh12::read_g(self)
    }
}
