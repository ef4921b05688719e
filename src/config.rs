// Centralize all configuration constants
pub const IMU_SAMPLE_RATE_HZ: u32 = 100;
pub const IMU_SAMPLE_PERIOD_MS: u64 = 1000 / IMU_SAMPLE_RATE_HZ as u64;

/// Fixed pause at the end of every loop iteration.
pub const LOOP_PAUSE_MS: u64 = 1;

// Status cadence, in IMU samples
pub const DISPLAY_EVERY: u32 = 10;
pub const INDICATOR_TOGGLE_EVERY: u32 = IMU_SAMPLE_RATE_HZ;

pub const STATS_PERIOD_MS: u64 = 1000;

pub const UART_BAUDRATE: u32 = 115_200;
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

pub const MPU6050_ADDRESS: u8 = 0x68;
pub const LCD_ADDRESS: u8 = 0x27;

// MPU-6050 front-end settings
pub const ACCEL_RANGE: crate::drivers::mpu6050::AccelRange = crate::drivers::mpu6050::AccelRange::G8;
pub const GYRO_RANGE: crate::drivers::mpu6050::GyroRange = crate::drivers::mpu6050::GyroRange::Dps500;
pub const IMU_FILTER: crate::drivers::mpu6050::FilterBandwidth = crate::drivers::mpu6050::FilterBandwidth::Hz21;

// 16x2 character display
pub const LCD_COLUMNS: u8 = 16;
pub const LCD_BANNER: &str = "ECG+IMU stream";
pub const LCD_COUNT_ROW: u8 = 1;
pub const LCD_COUNT_COL: u8 = 0;

pub const IMU_INIT_FAILED_NOTICE: &str = "Failed to find MPU6050 chip";

// Line buffer sizes
pub const LINE_CAPACITY: usize = 96;
