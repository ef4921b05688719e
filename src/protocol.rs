//! Line-oriented text protocol on the serial stream.
//!
//! ```text
//! ECG,<int>\r\n
//! IMU,<ax>,<ay>,<az>,<gx>,<gy>,<gz>\r\n     (4 decimal places)
//! ```
//!
//! Any other text the device prints (startup notices) is passed through as
//! [`Line::Notice`].

use core::fmt::{self, Write as _};

use heapless::{String, Vec};

use crate::config::LINE_CAPACITY;
use crate::drivers::{ImuSample, Vector3};

pub const ECG_TAG: &str = "ECG";
pub const IMU_TAG: &str = "IMU";
pub const LINE_END: &str = "\r\n";

const ECG_FIELDS: usize = 2;
const IMU_FIELDS: usize = 7;

pub type LineBuf = String<LINE_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line<'a> {
    /// Signed so the host accepts any integer reading, not just 12-bit ADC
    /// values.
    Ecg(i32),
    Imu(ImuSample),
    Notice(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineTooLong;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    Empty,
    FieldCount { tag: Tag, expected: usize, found: usize },
    InvalidInteger,
    InvalidFloat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tag {
    Ecg,
    Imu,
}

impl ParseError {
    /// A tagged line with the wrong number of fields, typically cut off
    /// mid-transmission.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::FieldCount { .. })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::FieldCount {
                tag,
                expected,
                found,
            } => write!(f, "{tag:?} line has {found} fields, expected {expected}"),
            Self::InvalidInteger => write!(f, "invalid integer payload"),
            Self::InvalidFloat => write!(f, "invalid float payload"),
        }
    }
}

impl<'a> Line<'a> {
    /// Renders the line, terminator included, replacing `buf`'s contents.
    pub fn encode(&self, buf: &mut LineBuf) -> Result<(), LineTooLong> {
        buf.clear();
        match self {
            Line::Ecg(value) => write!(buf, "{ECG_TAG},{value}{LINE_END}"),
            Line::Imu(s) => write!(
                buf,
                "{IMU_TAG},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}{LINE_END}",
                s.accel.x, s.accel.y, s.accel.z, s.gyro.x, s.gyro.y, s.gyro.z
            ),
            Line::Notice(text) => write!(buf, "{text}{LINE_END}"),
        }
        .map_err(|_| LineTooLong)
    }

    /// Parses one received line; surrounding whitespace and the terminator
    /// are ignored.
    pub fn parse(raw: &'a str) -> Result<Self, ParseError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }

        let found = text.split(',').count();
        let mut fields = text.split(',');
        let tag = fields.next().unwrap_or_default();

        match tag {
            ECG_TAG => {
                if found != ECG_FIELDS {
                    return Err(ParseError::FieldCount {
                        tag: Tag::Ecg,
                        expected: ECG_FIELDS,
                        found,
                    });
                }
                let value = fields
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| ParseError::InvalidInteger)?;
                Ok(Line::Ecg(value))
            }
            IMU_TAG => {
                if found != IMU_FIELDS {
                    return Err(ParseError::FieldCount {
                        tag: Tag::Imu,
                        expected: IMU_FIELDS,
                        found,
                    });
                }
                let mut v: Vec<f32, { IMU_FIELDS - 1 }> = Vec::new();
                for field in fields {
                    let x = field
                        .trim()
                        .parse::<f32>()
                        .map_err(|_| ParseError::InvalidFloat)?;
                    // capacity matches the field count checked above
                    let _ = v.push(x);
                }
                Ok(Line::Imu(ImuSample {
                    accel: Vector3::new(v[0], v[1], v[2]),
                    gyro: Vector3::new(v[3], v[4], v[5]),
                }))
            }
            _ => Ok(Line::Notice(text)),
        }
    }
}
