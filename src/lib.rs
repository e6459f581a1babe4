//! In-process event distribution for a log/trace collection pipeline.
//!
//! A producer feeds events into a fixed-capacity [`RingBuffer`] through a
//! [`BufferManager`]; any number of named handlers read them back at their
//! own pace, each through a private cursor. The producer is never throttled:
//! when the buffer is full the oldest event is overwritten, and handlers
//! that fall behind skip ahead to the oldest event still retained.

pub mod event_buffer;

pub use event_buffer::{
    BufferError, BufferManager, Event, EventSink, LogRecord, RingBuffer, Severity,
};
