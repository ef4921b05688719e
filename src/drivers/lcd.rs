//! HD44780 character LCD behind a PCF8574 I2C backpack
//! ===========================================================
//!
//! The expander drives the controller in 4-bit mode:
//! P0 = RS, P1 = RW, P2 = EN, P3 = backlight, P4..P7 = D4..D7.

use core::fmt::Write as _;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use heapless::String;

use super::StatusDisplay;
use crate::config::{LCD_COUNT_COL, LCD_COUNT_ROW};

/* ------------------------------------------------------------------------- */
/*  Expander pins                                                            */
/* ------------------------------------------------------------------------- */
const PIN_RS: u8 = 0x01;
const PIN_EN: u8 = 0x04;
const PIN_BACKLIGHT: u8 = 0x08;

/* ------------------------------------------------------------------------- */
/*  Controller commands                                                      */
/* ------------------------------------------------------------------------- */
const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x04;
const CMD_DISPLAY_CONTROL: u8 = 0x08;
const CMD_FUNCTION_SET: u8 = 0x20;
const CMD_SET_DDRAM_ADDR: u8 = 0x80;

const ENTRY_LEFT: u8 = 0x02;
const DISPLAY_ON: u8 = 0x04;
const FUNCTION_2LINE: u8 = 0x08;

const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

pub struct CharLcd<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
    columns: u8,
    backlight: u8,
}

impl<I2C: I2c, D: DelayNs> CharLcd<I2C, D> {
    pub fn new(i2c: I2C, delay: D, addr: u8, columns: u8) -> Self {
        Self {
            i2c,
            delay,
            addr,
            columns,
            backlight: PIN_BACKLIGHT,
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Power-on sequence from the HD44780 datasheet (figure 24), ending in
    /// 4-bit mode with two lines, display on, cursor off.
    pub async fn begin(&mut self) -> Result<(), I2C::Error> {
        self.delay.delay_ms(50).await;
        self.expander_write(0).await?;

        // Three times 8-bit mode, then switch to 4-bit
        self.write_nibble(0x30).await?;
        self.delay.delay_us(4500).await;
        self.write_nibble(0x30).await?;
        self.delay.delay_us(4500).await;
        self.write_nibble(0x30).await?;
        self.delay.delay_us(150).await;
        self.write_nibble(0x20).await?;

        self.command(CMD_FUNCTION_SET | FUNCTION_2LINE).await?;
        self.command(CMD_DISPLAY_CONTROL | DISPLAY_ON).await?;
        self.clear().await?;
        self.command(CMD_ENTRY_MODE | ENTRY_LEFT).await
    }

    pub async fn clear(&mut self) -> Result<(), I2C::Error> {
        self.command(CMD_CLEAR).await?;
        self.delay.delay_us(2000).await;
        Ok(())
    }

    pub async fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), I2C::Error> {
        let row = (row as usize).min(ROW_OFFSETS.len() - 1);
        let col = col.min(self.columns.saturating_sub(1));
        self.command(CMD_SET_DDRAM_ADDR | (col + ROW_OFFSETS[row])).await
    }

    /// Writes at the cursor, clipped to the display width.
    pub async fn write_str(&mut self, text: &str) -> Result<(), I2C::Error> {
        for &b in text.as_bytes().iter().take(self.columns as usize) {
            self.send(b, PIN_RS).await?;
        }
        Ok(())
    }

    async fn command(&mut self, value: u8) -> Result<(), I2C::Error> {
        self.send(value, 0).await
    }

    async fn send(&mut self, value: u8, mode: u8) -> Result<(), I2C::Error> {
        self.write_nibble((value & 0xF0) | mode).await?;
        self.write_nibble((value << 4) | mode).await
    }

    async fn write_nibble(&mut self, data: u8) -> Result<(), I2C::Error> {
        self.expander_write(data).await?;
        self.expander_write(data | PIN_EN).await?;
        self.delay.delay_us(1).await;
        self.expander_write(data & !PIN_EN).await?;
        self.delay.delay_us(50).await;
        Ok(())
    }

    async fn expander_write(&mut self, data: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.addr, &[data | self.backlight]).await
    }
}

impl<I2C: I2c, D: DelayNs> StatusDisplay for CharLcd<I2C, D> {
    type Error = I2C::Error;

    async fn init(&mut self, banner: &str) -> Result<(), Self::Error> {
        self.begin().await?;
        self.set_cursor(0, 0).await?;
        self.write_str(banner).await
    }

    async fn show_count(&mut self, count: u32) -> Result<(), Self::Error> {
        let mut text: String<16> = String::new();
        // "IMU #" plus at most ten digits always fits
        let _ = write!(text, "IMU #{}", count);
        self.set_cursor(LCD_COUNT_COL, LCD_COUNT_ROW).await?;
        self.write_str(&text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeI2c, NoDelay};

    const ADDR: u8 = 0x27;

    #[derive(Debug, PartialEq)]
    enum Xfer {
        Cmd(u8),
        Data(u8),
    }

    /// Rebuilds controller transfers from the expander bytes latched on the
    /// falling edge of EN.
    fn decode(written: &[u8]) -> Vec<Xfer> {
        let latched: Vec<u8> = written
            .windows(2)
            .filter(|w| w[0] & PIN_EN != 0 && w[1] & PIN_EN == 0)
            .map(|w| w[0])
            .collect();
        latched
            .chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| {
                let byte = (pair[0] & 0xF0) | (pair[1] >> 4);
                if pair[0] & PIN_RS != 0 {
                    Xfer::Data(byte)
                } else {
                    Xfer::Cmd(byte)
                }
            })
            .collect()
    }

    fn lcd() -> CharLcd<FakeI2c, NoDelay> {
        CharLcd::new(FakeI2c::new(ADDR), NoDelay, ADDR, 16)
    }

    #[futures_test::test]
    async fn count_lands_on_second_row() {
        let mut lcd = lcd();
        lcd.show_count(42).await.unwrap();

        let (bus, _) = lcd.release();
        let xfers = decode(&bus.written);
        assert_eq!(xfers[0], Xfer::Cmd(CMD_SET_DDRAM_ADDR | 0x40));
        let text: Vec<u8> = xfers[1..]
            .iter()
            .map(|x| match x {
                Xfer::Data(b) => *b,
                Xfer::Cmd(c) => panic!("unexpected command {c:#04x}"),
            })
            .collect();
        assert_eq!(text, b"IMU #42");
    }

    #[futures_test::test]
    async fn backlight_stays_on() {
        let mut lcd = lcd();
        lcd.write_str("x").await.unwrap();

        let (bus, _) = lcd.release();
        assert!(bus.written.iter().all(|b| b & PIN_BACKLIGHT != 0));
    }

    #[futures_test::test]
    async fn init_ends_with_banner_on_first_row() {
        let mut lcd = lcd();
        lcd.init("ECG+IMU stream").await.unwrap();

        let (bus, _) = lcd.release();
        let xfers = decode(&bus.written);
        let home = xfers
            .iter()
            .position(|x| *x == Xfer::Cmd(CMD_SET_DDRAM_ADDR))
            .unwrap();
        assert!(xfers[..home].contains(&Xfer::Cmd(CMD_FUNCTION_SET | FUNCTION_2LINE)));
        assert!(xfers[..home].contains(&Xfer::Cmd(CMD_CLEAR)));
        assert_eq!(xfers.len() - home - 1, "ECG+IMU stream".len());
    }

    #[futures_test::test]
    async fn long_text_is_clipped() {
        let mut lcd = CharLcd::new(FakeI2c::new(ADDR), NoDelay, ADDR, 4);
        lcd.write_str("abcdefgh").await.unwrap();

        let (bus, _) = lcd.release();
        assert_eq!(decode(&bus.written).len(), 4);
    }

    #[futures_test::test]
    async fn missing_backpack_is_an_error() {
        let mut lcd = CharLcd::new(FakeI2c::new(0x3F), NoDelay, ADDR, 16);
        assert!(lcd.init("hi").await.is_err());
    }
}
