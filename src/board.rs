use embassy_stm32::adc::{Adc, AdcChannel, AnyAdcChannel, SampleTime};
use embassy_stm32::mode::Async;
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{Config as UsartConfig, UartTx};
use embassy_stm32::{
    bind_interrupts,
    gpio::{Level, Output, Speed},
    i2c, peripherals, rcc, Config,
};

use crate::config::{I2C_FREQUENCY_HZ, UART_BAUDRATE};
use crate::drivers::AnalogInput;

// ── IRQ table ─────────────────────────────────────────────
bind_interrupts!(pub struct Irqs {
    I2C1   => i2c::EventInterruptHandler<peripherals::I2C1>,
              i2c::ErrorInterruptHandler<peripherals::I2C1>;
    I2C2   => i2c::EventInterruptHandler<peripherals::I2C2>,
              i2c::ErrorInterruptHandler<peripherals::I2C2>;
});

// ── ECG front-end ─────────────────────────────────────────
pub struct EcgAdc {
    adc: Adc<'static, peripherals::ADC1>,
    channel: AnyAdcChannel<peripherals::ADC1>,
}

impl AnalogInput for EcgAdc {
    fn read(&mut self) -> u16 {
        self.adc.blocking_read(&mut self.channel)
    }
}

// Both breakouts carry their own pull-ups
fn i2c_config() -> i2c::Config {
    let mut i2c_cfg = i2c::Config::default();
    i2c_cfg.sda_pullup = false;
    i2c_cfg.scl_pullup = false;
    i2c_cfg
}

// ── Board struct ──────────────────────────────────────────
pub struct Board {
    pub serial_tx: UartTx<'static, Async>, // DMA
    pub ecg: EcgAdc,
    pub imu_i2c: i2c::I2c<'static, Async>,     // DMA
    pub display_i2c: i2c::I2c<'static, Async>, // DMA
    pub status_led: Output<'static>,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();

        // Enable HSI and configure PLL for 64MHz
        config.rcc.hsi = Some(rcc::Hsi {
            sys_div: rcc::HsiSysDiv::DIV1, // No division for maximum speed
        });
        config.rcc.pll = Some(rcc::Pll {
            source: rcc::PllSource::HSI,    // Use HSI as PLL source
            prediv: rcc::PllPreDiv::DIV2,   // 16MHz / 2 = 8MHz
            mul: rcc::PllMul::MUL16,        // 8MHz * 16 = 128MHz
            divp: None,                     // Not used
            divq: None,                     // Not used
            divr: Some(rcc::PllRDiv::DIV2), // 128MHz / 2 = 64MHz
        });
        config.rcc.sys = rcc::Sysclk::PLL1_R; // Use PLL as system clock
        let p = embassy_stm32::init(config);

        // LD4 on the Nucleo
        let status_led = Output::new(p.PA5, Level::Low, Speed::Low);

        // USART2 is wired to the ST-LINK virtual COM port
        let mut us_cfg = UsartConfig::default();
        us_cfg.baudrate = UART_BAUDRATE;
        let serial_tx = UartTx::new(p.USART2, p.PA2, p.DMA1_CH1, us_cfg).unwrap();

        // Analog front-end output on A0
        let mut adc = Adc::new(p.ADC1);
        adc.set_sample_time(SampleTime::CYCLES79_5);
        let ecg = EcgAdc {
            adc,
            channel: p.PA0.degrade_adc(),
        };

        // I²C2 for the IMU (DMA CH7 TX, CH6 RX)
        let imu_i2c = i2c::I2c::new(
            p.I2C2,
            p.PB10,
            p.PB11,
            Irqs,
            p.DMA1_CH7,
            p.DMA1_CH6,
            Hertz(I2C_FREQUENCY_HZ),
            i2c_config(),
        );

        // I²C1 for the LCD backpack (DMA CH4 TX, CH5 RX)
        let display_i2c = i2c::I2c::new(
            p.I2C1,
            p.PB8,
            p.PB9,
            Irqs,
            p.DMA1_CH4,
            p.DMA1_CH5,
            Hertz(I2C_FREQUENCY_HZ),
            i2c_config(),
        );

        Self {
            serial_tx,
            ecg,
            imu_i2c,
            display_i2c,
            status_led,
        }
    }
}
