use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A buffered item paired with the sequence number the ring assigned to it.
///
/// Only the ring buffer creates these, at read time; they are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<T> {
    pub sequence_number: u64,
    pub data: T,
}

impl<T> Event<T> {
    pub(crate) fn new(sequence_number: u64, data: T) -> Self {
        Self {
            sequence_number,
            data,
        }
    }
}

/// Severity of a collected record: Info, Warning, Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// The record type the collector pipeline feeds through the buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub source: String,
    pub message: String,
}

impl LogRecord {
    pub fn new(severity: Severity, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity,
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the buffer surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),
    #[error("handler '{0}' is not registered")]
    UnknownHandler(String),
    #[error("handler '{0}' is already registered")]
    DuplicateHandler(String),
}
