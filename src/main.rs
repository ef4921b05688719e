#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::gpio::Output;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::UartTx;
use embassy_time::{Delay, Instant};
use {defmt_rtt as _, panic_probe as _};

use vitals_embassy::{
    board::EcgAdc,
    config::{ACCEL_RANGE, GYRO_RANGE, IMU_FILTER, LCD_ADDRESS, LCD_COLUMNS, MPU6050_ADDRESS},
    drivers::{CharLcd, Mpu6050},
    sampler::Cadence,
    tasks::{StreamLoop, StreamParts},
    Board,
};

type Imu = Mpu6050<I2c<'static, Async>, Delay>;
type Lcd = CharLcd<I2c<'static, Async>, Delay>;
type Stream = StreamLoop<UartTx<'static, Async>, EcgAdc, Imu, Lcd, Output<'static>>;

#[embassy_executor::task]
async fn stream_task(stream: Stream) {
    stream.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting vitals-embassy ECG/IMU streamer");
    let board = Board::init();

    let imu = Mpu6050::new(board.imu_i2c, Delay, MPU6050_ADDRESS)
        .with_ranges(ACCEL_RANGE, GYRO_RANGE, IMU_FILTER);
    let display = CharLcd::new(board.display_i2c, Delay, LCD_ADDRESS, LCD_COLUMNS);

    let parts = StreamParts {
        serial: board.serial_tx,
        analog: board.ecg,
        imu,
        display,
        indicator: board.status_led,
    };
    let stream = StreamLoop::start(parts, Cadence::new(), Instant::now()).await;

    spawner.spawn(stream_task(stream)).unwrap();
    info!("Stream task spawned on main executor");
}
