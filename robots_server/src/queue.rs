// Blocking outbound queue, one per connected client.
//
// The hub pushes broadcast messages, the client's sender thread pops and
// writes. Messages are shared `Arc`s: a broadcast to N clients clones N
// pointers, not N frames. `pop` blocks until an entry arrives or the queue
// is closed; a closed queue reads as end-of-stream (`None`), which is how
// teardown on one side of a connection wakes the other.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use robots_protocol::ServerMessage;

pub struct MessageQueue {
    inner: Mutex<Inner>,
    ready: Condvar,
}

struct Inner {
    items: VecDeque<Arc<ServerMessage>>,
    open: bool,
}

impl MessageQueue {
    /// New open queue pre-loaded with the session prologue a fresh client
    /// must replay before it sees live broadcasts.
    pub fn seeded(history: &[Arc<ServerMessage>]) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: history.iter().cloned().collect(),
                open: true,
            }),
            ready: Condvar::new(),
        }
    }

    /// Append a message. No-op once the queue is closed.
    pub fn push(&self, message: Arc<ServerMessage>) {
        let mut inner = self.lock();
        if inner.open {
            inner.items.push_back(message);
            self.ready.notify_all();
        }
    }

    /// Block until a message is available or the queue is closed.
    /// `None` means closed; anything still buffered is discarded, since a
    /// close only ever happens when the connection is already dead.
    pub fn pop(&self) -> Option<Arc<ServerMessage>> {
        let mut inner = self.lock();
        loop {
            if !inner.open {
                return None;
            }
            if let Some(message) = inner.items.pop_front() {
                return Some(message);
            }
            inner = self.ready.wait(inner).expect("queue mutex poisoned");
        }
    }

    /// Close the queue, waking every blocked `pop`.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.open = false;
        self.ready.notify_all();
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("queue mutex poisoned")
    }
}
