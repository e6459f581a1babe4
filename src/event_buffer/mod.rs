pub mod manager;
pub mod ring;
pub mod types;

pub use manager::{BufferManager, EventSink};
pub use ring::RingBuffer;
pub use types::*;
