pub mod stream;

pub use stream::{Step, StreamLoop, StreamParts};
