//! Resize notification bus
//!
//! Mount surfaces report size changes through a shared bus; each viewer
//! holds a subscription it removes on disposal. Subscriptions left behind
//! by dead viewers are a leak in the same way an undisposed GPU buffer is,
//! so removal is explicit, idempotent, and also runs on drop.

use std::sync::{Arc, Mutex, Weak};

type Listener = Box<dyn FnMut(u32, u32) + Send>;

struct BusInner {
    next_id: u64,
    subscribers: Vec<(u64, Listener)>,
}

/// A cloneable broadcast bus for mount dimension changes
#[derive(Clone)]
pub struct ResizeBus {
    inner: Arc<Mutex<BusInner>>,
}

impl Default for ResizeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizeBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Register a listener; dropping the returned subscription removes it
    pub fn subscribe<F>(&self, listener: F) -> ResizeSubscription
    where
        F: FnMut(u32, u32) + Send + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Box::new(listener)));
        ResizeSubscription {
            inner: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Deliver new dimensions to every live subscriber
    pub fn publish(&self, width: u32, height: u32) {
        let mut inner = lock(&self.inner);
        for (_, listener) in inner.subscribers.iter_mut() {
            listener(width, height);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

fn lock(inner: &Arc<Mutex<BusInner>>) -> std::sync::MutexGuard<'_, BusInner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle to a registered resize listener
pub struct ResizeSubscription {
    inner: Weak<Mutex<BusInner>>,
    id: Option<u64>,
}

impl ResizeSubscription {
    /// Remove the listener from the bus
    ///
    /// Idempotent, and harmless if the bus itself is already gone.
    pub fn unsubscribe(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = lock(&inner);
            inner.subscribers.retain(|(sid, _)| *sid != id);
        }
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
