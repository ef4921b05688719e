use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use vitals_embassy::protocol::{Line, ParseError};

pub const ECG_HEADER: &str = "timestamp,ecg_value";
pub const IMU_HEADER: &str = "timestamp,accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z";

/// Where a received line ended up.
#[derive(Debug, PartialEq)]
pub enum Outcome<'a> {
    Ecg,
    Imu,
    /// Free text from the device, not recorded.
    Notice(&'a str),
    Blank,
    Invalid(ParseError),
}

/// Appends parsed samples to one CSV per stream, flushing every row.
pub struct Recorder<W: Write> {
    ecg: W,
    imu: W,
    ecg_count: u64,
    imu_count: u64,
}

impl Recorder<BufWriter<File>> {
    pub fn create(ecg_path: &Path, imu_path: &Path) -> Result<Self> {
        let ecg = File::create(ecg_path)
            .with_context(|| format!("creating {}", ecg_path.display()))?;
        let imu = File::create(imu_path)
            .with_context(|| format!("creating {}", imu_path.display()))?;
        Ok(Self::new(BufWriter::new(ecg), BufWriter::new(imu))?)
    }
}

impl<W: Write> Recorder<W> {
    pub fn new(mut ecg: W, mut imu: W) -> io::Result<Self> {
        writeln!(ecg, "{ECG_HEADER}")?;
        ecg.flush()?;
        writeln!(imu, "{IMU_HEADER}")?;
        imu.flush()?;
        Ok(Self {
            ecg,
            imu,
            ecg_count: 0,
            imu_count: 0,
        })
    }

    pub fn ecg_count(&self) -> u64 {
        self.ecg_count
    }

    pub fn imu_count(&self) -> u64 {
        self.imu_count
    }

    pub fn record<'a>(&mut self, timestamp: &str, raw: &'a str) -> io::Result<Outcome<'a>> {
        match Line::parse(raw) {
            Ok(Line::Ecg(value)) => {
                writeln!(self.ecg, "{timestamp},{value}")?;
                self.ecg.flush()?;
                self.ecg_count += 1;
                Ok(Outcome::Ecg)
            }
            Ok(Line::Imu(s)) => {
                writeln!(
                    self.imu,
                    "{timestamp},{:?},{:?},{:?},{:?},{:?},{:?}",
                    s.accel.x, s.accel.y, s.accel.z, s.gyro.x, s.gyro.y, s.gyro.z
                )?;
                self.imu.flush()?;
                self.imu_count += 1;
                Ok(Outcome::Imu)
            }
            Ok(Line::Notice(text)) => Ok(Outcome::Notice(text)),
            Err(ParseError::Empty) => Ok(Outcome::Blank),
            Err(e) => Ok(Outcome::Invalid(e)),
        }
    }

    pub fn into_inner(self) -> (W, W) {
        (self.ecg, self.imu)
    }
}
