//! Status fan-out.
//!
//! Listeners receive the full snapshot list on every transition. Each
//! publication carries a queue revision; anything older than what was last
//! delivered is dropped, so observers never see state go backwards when two
//! completions race to publish.

use crate::status::StatusSnapshot;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

pub type SubscriptionId = u64;

type Listener = Arc<dyn Fn(&[StatusSnapshot]) + Send + Sync>;

pub struct StatusBroadcaster {
    state: Mutex<BroadcastState>,
    next_id: AtomicU64,
    sender: broadcast::Sender<Arc<Vec<StatusSnapshot>>>,
}

struct BroadcastState {
    listeners: Vec<(SubscriptionId, Listener)>,
    delivered: u64,
    pending: VecDeque<(u64, Vec<StatusSnapshot>)>,
    delivering: bool,
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(BroadcastState {
                listeners: Vec::new(),
                delivered: 0,
                pending: VecDeque::new(),
                delivering: false,
            }),
            next_id: AtomicU64::new(1),
            sender,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BroadcastState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&[StatusSnapshot]) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns whether the listener was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(existing, _)| *existing != id);
        state.listeners.len() != before
    }

    /// Async consumers; lagging receivers skip to the newest lists
    pub fn subscribe_channel(&self) -> broadcast::Receiver<Arc<Vec<StatusSnapshot>>> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Deliver `snapshots` taken at `revision`. Returns false if a newer
    /// revision was already delivered.
    ///
    /// Only one caller delivers at a time; publications arriving meanwhile
    /// (including from inside a listener) are queued and delivered in order
    /// by that caller.
    pub fn publish(&self, revision: u64, snapshots: Vec<StatusSnapshot>) -> bool {
        {
            let mut state = self.lock();
            if revision < state.delivered {
                tracing::trace!(
                    "[StatusBroadcaster] Dropping stale revision {} (delivered {})",
                    revision,
                    state.delivered
                );
                return false;
            }
            state.pending.push_back((revision, snapshots));
            if state.delivering {
                return true;
            }
            state.delivering = true;
        }

        while let Some((snapshots, listeners)) = self.next_delivery() {
            // Listeners run unlocked so they can subscribe/unsubscribe or call the queue
            for listener in &listeners {
                listener(&snapshots);
            }

            // No receivers is fine
            let _ = self.sender.send(Arc::new(snapshots));
        }
        true
    }

    fn next_delivery(&self) -> Option<(Vec<StatusSnapshot>, Vec<Listener>)> {
        let mut state = self.lock();
        while let Some((revision, snapshots)) = state.pending.pop_front() {
            if revision < state.delivered {
                continue;
            }
            state.delivered = revision;
            let listeners = state
                .listeners
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();
            return Some((snapshots, listeners));
        }
        state.delivering = false;
        None
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatusBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBroadcaster")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
