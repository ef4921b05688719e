pub mod lcd;
pub mod mpu6050;

pub use lcd::CharLcd;
pub use mpu6050::{Mpu6050, Mpu6050Error};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One 6-axis reading: acceleration in m/s², angular rate in rad/s.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuSample {
    pub accel: Vector3,
    pub gyro: Vector3,
}

/// Single analog channel carrying the heart-rate front-end output.
///
/// Reads are unchecked: whatever the converter returns is streamed.
pub trait AnalogInput {
    fn read(&mut self) -> u16;
}

#[allow(async_fn_in_trait)]
pub trait InertialSensor {
    type Error;

    /// Probe and configure the sensor. This is the only checked operation
    /// on the device.
    async fn init(&mut self) -> Result<(), Self::Error>;
    async fn read(&mut self) -> Result<ImuSample, Self::Error>;
}

/// Small character display used for the sample counter.
#[allow(async_fn_in_trait)]
pub trait StatusDisplay {
    type Error;

    async fn init(&mut self, banner: &str) -> Result<(), Self::Error>;
    async fn show_count(&mut self, count: u32) -> Result<(), Self::Error>;
}
