#![cfg_attr(not(test), no_std)]

// must go first so the logging macros are visible below
mod fmt;

pub mod config;
pub mod drivers;
pub mod protocol;
pub mod sampler;
pub mod stats;
pub mod tasks;

#[cfg(target_os = "none")]
pub mod board;

#[cfg(test)]
mod testing;

#[cfg(target_os = "none")]
pub use board::Board;
pub use drivers::ImuSample;
pub use protocol::Line;
