//! Snapshot cell with change notification.

use tokio::sync::watch;

/// Holds the latest value of some piece of client state.
///
/// Every write replaces or edits the whole value under one lock, so readers
/// never observe half of one update and half of another. Subscribers are woken
/// after each write.
pub struct Observable<T> {
    sender: watch::Sender<T>,
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Observable<T> {
    /// Create a cell holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Edit the value in place and notify subscribers.
    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        self.sender.send_modify(f);
    }

    /// Read through a borrow without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Get a receiver for change notifications.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T: Clone> Observable<T> {
    /// Clone the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }
}
