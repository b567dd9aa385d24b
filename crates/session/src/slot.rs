//! Depth-1 latest-wins frame slot
//!
//! The intake task writes into the slot as fast as the transport
//! delivers; the processing loop reads at its own pace. When a write
//! finds the slot occupied, the stale value is discarded in favor of
//! the new one, bounding both memory and latency under backpressure.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

struct SlotState<T> {
    value: Option<T>,
    closed: bool,
}

pub struct LatestSlot<T> {
    state: Mutex<SlotState<T>>,
    notify: Notify,
    dropped: AtomicU64,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                value: None,
                closed: false,
            }),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Store a value, replacing (and counting as dropped) any value
    /// already pending. Returns false once the slot is closed.
    pub fn put(&self, value: T) -> bool {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.closed {
            return false;
        }
        if state.value.replace(value).is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        drop(state);
        self.notify.notify_one();
        true
    }

    /// Take the pending value, waiting up to `timeout` for one to
    /// arrive. Returns `None` on timeout or when the slot is closed
    /// and drained.
    pub async fn take(&self, timeout: Duration) -> Option<T> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            {
                let mut state = match self.state.lock() {
                    Ok(state) => state,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if let Some(value) = state.value.take() {
                    return Some(value);
                }
                if state.closed {
                    return None;
                }
            }
            if tokio::time::timeout_at(deadline, self.notify.notified())
                .await
                .is_err()
            {
                return None;
            }
        }
    }

    /// Mark the slot closed; pending value stays takeable.
    pub fn close(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.closed = true;
        drop(state);
        self.notify.notify_waiters();
    }

    /// True when no further values can arrive (a pending one may
    /// still be takeable).
    pub fn is_closed(&self) -> bool {
        match self.state.lock() {
            Ok(state) => state.closed,
            Err(poisoned) => poisoned.into_inner().closed,
        }
    }

    /// Count of values discarded by newer arrivals.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_latest_wins() {
        let slot = LatestSlot::new();
        assert!(slot.put(1));
        assert!(slot.put(2));
        assert!(slot.put(3));
        assert_eq!(slot.take(Duration::from_millis(10)).await, Some(3));
        assert_eq!(slot.dropped(), 2);
    }

    #[tokio::test]
    async fn test_take_times_out_when_empty() {
        let slot: LatestSlot<u32> = LatestSlot::new();
        assert_eq!(slot.take(Duration::from_millis(10)).await, None);
    }

    #[tokio::test]
    async fn test_close_rejects_puts_but_drains_pending() {
        let slot = LatestSlot::new();
        slot.put(7);
        slot.close();
        assert!(!slot.put(8));
        assert_eq!(slot.take(Duration::from_millis(10)).await, Some(7));
        assert_eq!(slot.take(Duration::from_millis(10)).await, None);
        assert!(slot.is_closed());
    }

    #[tokio::test]
    async fn test_waiter_woken_by_put() {
        let slot = Arc::new(LatestSlot::new());
        let writer = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                slot.put(42);
            })
        };
        assert_eq!(slot.take(Duration::from_secs(1)).await, Some(42));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_waiter_woken_by_close() {
        let slot: Arc<LatestSlot<u32>> = Arc::new(LatestSlot::new());
        let closer = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                slot.close();
            })
        };
        assert_eq!(slot.take(Duration::from_secs(1)).await, None);
        closer.await.unwrap();
    }
}
