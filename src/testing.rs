//! Host-side stand-ins for the board peripherals.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin, StatefulOutputPin};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};

use crate::drivers::{AnalogInput, ImuSample, InertialSensor, StatusDisplay};

/* ------------------------------------------------------------------------- */
/*  I2C                                                                      */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeI2cError;

impl i2c::Error for FakeI2cError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// Register-file device: the first written byte selects the register, later
/// bytes and reads auto-increment from there.
pub struct FakeI2c {
    pub addr: u8,
    pub regs: [u8; 256],
    /// `(register, mask)` bits that read back cleared right after a write.
    pub self_clearing: Option<(u8, u8)>,
    /// Every byte of every write, in order.
    pub written: Vec<u8>,
    ptr: u8,
}

impl FakeI2c {
    pub fn new(addr: u8) -> Self {
        Self {
            addr,
            regs: [0; 256],
            self_clearing: None,
            written: Vec::new(),
            ptr: 0,
        }
    }

    fn store(&mut self, value: u8) {
        let mut value = value;
        if let Some((reg, mask)) = self.self_clearing {
            if reg == self.ptr {
                value &= !mask;
            }
        }
        self.regs[self.ptr as usize] = value;
        self.ptr = self.ptr.wrapping_add(1);
    }
}

impl i2c::ErrorType for FakeI2c {
    type Error = FakeI2cError;
}

impl i2c::I2c for FakeI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.addr {
            return Err(FakeI2cError);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.written.extend_from_slice(bytes);
                    if let Some((&reg, data)) = bytes.split_first() {
                        self.ptr = reg;
                        for &b in data {
                            self.store(b);
                        }
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.regs[self.ptr as usize];
                        self.ptr = self.ptr.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/* ------------------------------------------------------------------------- */
/*  Serial                                                                   */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeSerialError;

impl embedded_io_async::Error for FakeSerialError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        embedded_io_async::ErrorKind::Other
    }
}

#[derive(Default)]
pub struct FakeSerial {
    pub out: Vec<u8>,
    pub fail: bool,
}

impl FakeSerial {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.out.clone())
            .unwrap()
            .split_terminator("\r\n")
            .map(String::from)
            .collect()
    }
}

impl embedded_io_async::ErrorType for FakeSerial {
    type Error = FakeSerialError;
}

impl embedded_io_async::Write for FakeSerial {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(FakeSerialError);
        }
        self.out.extend_from_slice(buf);
        Ok(buf.len())
    }
}

/* ------------------------------------------------------------------------- */
/*  Sensors, display, LED                                                    */
/* ------------------------------------------------------------------------- */

/// Counts up by one per read, starting at `next`.
pub struct RampAdc {
    pub next: u16,
}

impl AnalogInput for RampAdc {
    fn read(&mut self) -> u16 {
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeImuError;

pub struct FakeImu {
    pub sample: ImuSample,
    pub init_ok: bool,
    pub read_ok: bool,
    pub reads: u32,
}

impl FakeImu {
    pub fn new(sample: ImuSample) -> Self {
        Self {
            sample,
            init_ok: true,
            read_ok: true,
            reads: 0,
        }
    }
}

impl InertialSensor for FakeImu {
    type Error = FakeImuError;

    async fn init(&mut self) -> Result<(), Self::Error> {
        if self.init_ok {
            Ok(())
        } else {
            Err(FakeImuError)
        }
    }

    async fn read(&mut self) -> Result<ImuSample, Self::Error> {
        self.reads += 1;
        if self.read_ok {
            Ok(self.sample)
        } else {
            Err(FakeImuError)
        }
    }
}

#[derive(Default)]
pub struct FakeDisplay {
    pub banner: Option<String>,
    pub shown: Vec<u32>,
    pub fail: bool,
}

impl StatusDisplay for FakeDisplay {
    type Error = ();

    async fn init(&mut self, banner: &str) -> Result<(), Self::Error> {
        if self.fail {
            return Err(());
        }
        self.banner = Some(banner.into());
        Ok(())
    }

    async fn show_count(&mut self, count: u32) -> Result<(), Self::Error> {
        if self.fail {
            return Err(());
        }
        self.shown.push(count);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeLed {
    pub high: bool,
    pub toggles: u32,
}

impl PinErrorType for FakeLed {
    type Error = Infallible;
}

impl OutputPin for FakeLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.high {
            self.toggles += 1;
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.toggles += 1;
        }
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for FakeLed {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }
}
