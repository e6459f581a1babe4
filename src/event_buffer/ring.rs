use crate::event_buffer::types::{BufferError, Event};
use log::trace;
use tokio::sync::{Mutex, Notify};

// Guarded ring state. Every field is read and written only while the
// owning RingBuffer's mutex is held.
#[derive(Debug)]
struct RingState<T> {
    slots: Vec<Option<T>>,
    /// Next sequence number to assign; one past the newest stored item.
    current_seq: u64,
    /// Oldest sequence number still retrievable.
    earliest_seq: u64,
}

/// Fixed-capacity circular buffer of the most recent events, keyed by
/// monotonically increasing sequence numbers starting at 1.
///
/// A full buffer never blocks the producer: `add` overwrites the oldest
/// slot, so a slow reader loses the oldest data rather than stalling the
/// collector pipeline. Readers block in `get`/`get_many` until their target
/// sequence number has been produced; every `add` wakes all of them, since
/// different waiters may be parked on different sequence numbers.
#[derive(Debug)]
pub struct RingBuffer<T> {
    state: Mutex<RingState<T>>,
    added: Notify,
    capacity: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` events.
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity(capacity));
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Ok(Self {
            state: Mutex::new(RingState {
                slots,
                current_seq: 1,
                earliest_seq: 1,
            }),
            added: Notify::new(),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store `item` under the next sequence number and return that number.
    ///
    /// Overwriting the slot of the oldest item is the eviction mechanism;
    /// there is no separate evict step and no backpressure on the caller.
    pub async fn add(&self, item: T) -> u64 {
        let seq = {
            let mut state = self.state.lock().await;
            let seq = state.current_seq;
            let idx = (seq % self.capacity as u64) as usize;
            state.slots[idx] = Some(item);
            state.current_seq += 1;
            if state.current_seq - 1 > self.capacity as u64 {
                state.earliest_seq = state.current_seq - self.capacity as u64;
            }
            seq
        };
        trace!("buffered event seq={seq}");
        // Broadcast, not single-wake: waiters park on different sequence
        // numbers, and each re-checks its own predicate after waking.
        self.added.notify_waiters();
        seq
    }

    /// Return the event with sequence number `seq`, waiting until it has
    /// been produced.
    ///
    /// A `seq` older than the retention window is clamped up to the oldest
    /// event still available. Dropping the returned future abandons the
    /// wait; the buffer is left untouched.
    pub async fn get(&self, seq: u64) -> Event<T> {
        loop {
            let notified = self.added.notified();
            tokio::pin!(notified);
            // Register for the next broadcast before checking the predicate,
            // so an add between unlock and await cannot be missed.
            notified.as_mut().enable();
            {
                let state = self.state.lock().await;
                // Re-clamp on every pass: eviction may have advanced the
                // window while we were parked.
                let resolved = seq.max(state.earliest_seq);
                if resolved < state.current_seq {
                    let idx = (resolved % self.capacity as u64) as usize;
                    if let Some(data) = state.slots[idx].clone() {
                        return Event::new(resolved, data);
                    }
                }
            }
            notified.await;
        }
    }

    /// Return up to `max` consecutive events starting at `seq`, oldest
    /// first, waiting only for the first one.
    ///
    /// Once the starting event is available the call never waits again: it
    /// returns whatever contiguous run currently exists, even if that is
    /// fewer than `max` events.
    pub async fn get_many(&self, seq: u64, max: usize) -> Vec<Event<T>> {
        loop {
            let notified = self.added.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let state = self.state.lock().await;
                let resolved = seq.max(state.earliest_seq);
                if resolved < state.current_seq {
                    let available = (state.current_seq - resolved) as usize;
                    let count = available.min(max);
                    let mut events = Vec::with_capacity(count);
                    for s in resolved..resolved + count as u64 {
                        let idx = (s % self.capacity as u64) as usize;
                        if let Some(data) = state.slots[idx].clone() {
                            events.push(Event::new(s, data));
                        }
                    }
                    return events;
                }
            }
            notified.await;
        }
    }

    /// Sequence number the next `add` will assign.
    pub(crate) async fn next_seq(&self) -> u64 {
        self.state.lock().await.current_seq
    }
}
