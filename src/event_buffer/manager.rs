use crate::event_buffer::ring::RingBuffer;
use crate::event_buffer::types::BufferError;
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The seam a producer collaborator writes through
#[async_trait]
pub trait EventSink<T>: Send + Sync {
    /// Buffer one item; returns the sequence number it was stored under.
    async fn add(&self, item: T) -> u64;
}

/// Owns the ring buffer and one private read cursor per registered handler.
///
/// Each cursor holds the next sequence number to deliver to that handler.
/// Handlers read at their own pace; a handler that falls behind the
/// retention window has its cursor clamped forward by the ring, silently
/// skipping evicted events. The cursor table lock is never held across a
/// blocking read, so one stalled handler cannot serialize the others.
pub struct BufferManager<T> {
    buffer: RingBuffer<T>,
    cursors: Mutex<HashMap<String, u64>>,
}

impl<T: Clone> BufferManager<T> {
    pub fn new(capacity: usize) -> Result<Arc<Self>, BufferError> {
        Ok(Arc::new(Self {
            buffer: RingBuffer::new(capacity)?,
            cursors: Mutex::new(HashMap::new()),
        }))
    }

    /// Buffer one item. Pure pass-through; never blocks on consumers.
    pub async fn add(&self, item: T) -> u64 {
        self.buffer.add(item).await
    }

    /// Register a handler. Its cursor starts at the next sequence number to
    /// be produced, so it observes only events added from this point on.
    /// Re-registering a live id is rejected.
    pub async fn add_handler(&self, id: impl Into<String>) -> Result<(), BufferError> {
        let id = id.into();
        let mut cursors = self.cursors.lock().await;
        if cursors.contains_key(&id) {
            return Err(BufferError::DuplicateHandler(id));
        }
        let next = self.buffer.next_seq().await;
        debug!("registered handler '{id}' at seq={next}");
        cursors.insert(id, next);
        Ok(())
    }

    /// Drop a handler's cursor. Idempotent; returns whether the id was
    /// registered.
    pub async fn remove_handler(&self, id: &str) -> bool {
        let removed = self.cursors.lock().await.remove(id).is_some();
        if removed {
            debug!("removed handler '{id}'");
        } else {
            warn!("remove_handler: '{id}' was not registered");
        }
        removed
    }

    pub async fn is_registered(&self, id: &str) -> bool {
        self.cursors.lock().await.contains_key(id)
    }

    /// Deliver the next event for `id`, waiting until one exists.
    ///
    /// The cursor advances only on successful return: a read cancelled
    /// while waiting delivers nothing and re-delivers the same event next
    /// time.
    pub async fn next_event(&self, id: &str) -> Result<T, BufferError> {
        let cursor = self.cursor_for(id).await?;
        let event = self.buffer.get(cursor).await;
        let mut cursors = self.cursors.lock().await;
        match cursors.get_mut(id) {
            Some(cursor) => {
                *cursor = event.sequence_number + 1;
                Ok(event.data)
            }
            // Unregistered while the read was in flight.
            None => Err(BufferError::UnknownHandler(id.to_string())),
        }
    }

    /// Deliver up to `max` events for `id`, oldest first, waiting only for
    /// the first. The cursor moves past the last delivered event; it is
    /// untouched when nothing is returned.
    pub async fn next_events(&self, id: &str, max: usize) -> Result<Vec<T>, BufferError> {
        let cursor = self.cursor_for(id).await?;
        let events = self.buffer.get_many(cursor, max).await;
        let mut cursors = self.cursors.lock().await;
        match cursors.get_mut(id) {
            Some(cursor) => {
                if let Some(last) = events.last() {
                    *cursor = last.sequence_number + 1;
                }
                Ok(events.into_iter().map(|e| e.data).collect())
            }
            None => Err(BufferError::UnknownHandler(id.to_string())),
        }
    }

    async fn cursor_for(&self, id: &str) -> Result<u64, BufferError> {
        self.cursors
            .lock()
            .await
            .get(id)
            .copied()
            .ok_or_else(|| BufferError::UnknownHandler(id.to_string()))
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> EventSink<T> for BufferManager<T> {
    async fn add(&self, item: T) -> u64 {
        BufferManager::add(self, item).await
    }
}
