use std::sync::Arc;

use parking_lot::Mutex;

pub type SubscriptionId = u64;

/// Handle returned by the store's subscribe calls.
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
/// Clones share the same underlying registration.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    cancel: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Arc::new(Mutex::new(Some(Box::new(cancel)))),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Runs at most once (safe to call multiple times).
    pub fn unsubscribe(&self) {
        let cancel = self.cancel.lock().take();
        if let Some(f) = cancel {
            f()
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.lock().is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
