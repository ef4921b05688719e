use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use super::{ImuSample, InertialSensor, Vector3};

// MPU-6050 I2C addresses
pub const MPU6050_ADDRESS_AD0_LOW: u8 = 0x68;
pub const MPU6050_ADDRESS_AD0_HIGH: u8 = 0x69;

// MPU-6050 Register Addresses
const MPU6050_SMPLRT_DIV_ADDR: u8 = 0x19;
const MPU6050_CONFIG_ADDR: u8 = 0x1A;
const MPU6050_GYRO_CONFIG_ADDR: u8 = 0x1B;
const MPU6050_ACCEL_CONFIG_ADDR: u8 = 0x1C;
const MPU6050_ACCEL_XOUT_H_ADDR: u8 = 0x3B;
const MPU6050_SIGNAL_PATH_RESET_ADDR: u8 = 0x68;
const MPU6050_PWR_MGMT_1_ADDR: u8 = 0x6B;
const MPU6050_WHO_AM_I_ADDR: u8 = 0x75;

// MPU-6050 ID (WHO_AM_I ignores the AD0 pin)
const MPU6050_ID: u8 = 0x68;

const PWR_MGMT_1_DEVICE_RESET: u8 = 0x80;
const PWR_MGMT_1_CLKSEL_PLL_XGYRO: u8 = 0x01;
const SIGNAL_PATH_RESET_ALL: u8 = 0x07;

const RESET_POLL_ATTEMPTS: u8 = 10;

const STANDARD_GRAVITY: f32 = 9.80665;
const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelRange {
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    fn config_bits(self) -> u8 {
        (self as u8) << 3
    }

    pub fn lsb_per_g(self) -> f32 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    fn config_bits(self) -> u8 {
        (self as u8) << 3
    }

    pub fn lsb_per_dps(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }
}

/// Digital low-pass filter setting (DLPF_CFG), accelerometer bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterBandwidth {
    Hz260,
    Hz184,
    Hz94,
    Hz44,
    Hz21,
    Hz10,
    Hz5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mpu6050Error<E> {
    Bus(E),
    WrongChipId(u8),
    ResetTimeout,
}

impl<E> From<E> for Mpu6050Error<E> {
    fn from(e: E) -> Self {
        Self::Bus(e)
    }
}

pub struct Mpu6050<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
    accel_range: AccelRange,
    gyro_range: GyroRange,
    filter: FilterBandwidth,
}

impl<I2C: I2c, D: DelayNs> Mpu6050<I2C, D> {
    pub fn new(i2c: I2C, delay: D, addr: u8) -> Self {
        Self {
            i2c,
            delay,
            addr,
            accel_range: AccelRange::G2,
            gyro_range: GyroRange::Dps250,
            filter: FilterBandwidth::Hz260,
        }
    }

    pub fn with_ranges(
        mut self,
        accel_range: AccelRange,
        gyro_range: GyroRange,
        filter: FilterBandwidth,
    ) -> Self {
        self.accel_range = accel_range;
        self.gyro_range = gyro_range;
        self.filter = filter;
        self
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    async fn try_init(&mut self) -> Result<(), Mpu6050Error<I2C::Error>> {
        // Step 1: Check chip ID
        debug!("Checking chip ID...");
        let id = self.read_byte(MPU6050_WHO_AM_I_ADDR).await?;
        if id != MPU6050_ID {
            error!("Invalid MPU6050 ID: {}, expected {}", id, MPU6050_ID);
            return Err(Mpu6050Error::WrongChipId(id));
        }

        // Step 2: Device reset, the reset bit self-clears when done
        debug!("Performing device reset...");
        self.write_byte(MPU6050_PWR_MGMT_1_ADDR, PWR_MGMT_1_DEVICE_RESET)
            .await?;
        self.wait_for_reset().await?;

        self.write_byte(MPU6050_SIGNAL_PATH_RESET_ADDR, SIGNAL_PATH_RESET_ALL)
            .await?;
        self.delay.delay_ms(100).await;

        // Step 3: Full output rate, then filter and ranges
        self.write_byte(MPU6050_SMPLRT_DIV_ADDR, 0x00).await?;
        self.write_byte(MPU6050_CONFIG_ADDR, self.filter as u8).await?;
        self.write_byte(MPU6050_GYRO_CONFIG_ADDR, self.gyro_range.config_bits())
            .await?;
        self.write_byte(MPU6050_ACCEL_CONFIG_ADDR, self.accel_range.config_bits())
            .await?;

        // Step 4: Leave sleep mode on the X gyro PLL clock
        debug!("Waking up...");
        self.write_byte(MPU6050_PWR_MGMT_1_ADDR, PWR_MGMT_1_CLKSEL_PLL_XGYRO)
            .await?;
        self.delay.delay_ms(100).await;

        info!("MPU6050 initialization completed successfully");
        Ok(())
    }

    async fn wait_for_reset(&mut self) -> Result<(), Mpu6050Error<I2C::Error>> {
        for _ in 0..RESET_POLL_ATTEMPTS {
            self.delay.delay_ms(10).await;
            let pwr = self.read_byte(MPU6050_PWR_MGMT_1_ADDR).await?;
            if pwr & PWR_MGMT_1_DEVICE_RESET == 0 {
                return Ok(());
            }
        }
        error!("Timeout waiting for MPU6050 reset");
        Err(Mpu6050Error::ResetTimeout)
    }

    pub async fn read_sample(&mut self) -> Result<ImuSample, Mpu6050Error<I2C::Error>> {
        // accel xyz, temperature, gyro xyz; big-endian words
        let raw = self.read_bytes::<14>(MPU6050_ACCEL_XOUT_H_ADDR).await?;
        let word = |i: usize| i16::from_be_bytes([raw[i], raw[i + 1]]) as f32;

        let accel_scale = STANDARD_GRAVITY / self.accel_range.lsb_per_g();
        let gyro_scale = DEG_TO_RAD / self.gyro_range.lsb_per_dps();

        Ok(ImuSample {
            accel: Vector3::new(
                word(0) * accel_scale,
                word(2) * accel_scale,
                word(4) * accel_scale,
            ),
            gyro: Vector3::new(
                word(8) * gyro_scale,
                word(10) * gyro_scale,
                word(12) * gyro_scale,
            ),
        })
    }

    async fn write_byte(&mut self, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.addr, &[reg, value]).await
    }

    async fn read_byte(&mut self, reg: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.addr, &[reg], &mut buf).await?;
        Ok(buf[0])
    }

    async fn read_bytes<const N: usize>(&mut self, reg: u8) -> Result<[u8; N], I2C::Error> {
        let mut buf = [0u8; N];
        self.i2c.write_read(self.addr, &[reg], &mut buf).await?;
        Ok(buf)
    }
}

impl<I2C: I2c, D: DelayNs> InertialSensor for Mpu6050<I2C, D> {
    type Error = Mpu6050Error<I2C::Error>;

    async fn init(&mut self) -> Result<(), Self::Error> {
        info!("Starting MPU6050 initialization sequence...");

        // Give the chip time to power up
        self.delay.delay_ms(100).await;
        self.try_init().await
    }

    async fn read(&mut self) -> Result<ImuSample, Self::Error> {
        self.read_sample().await
    }
}
