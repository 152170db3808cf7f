use std::{
    mem::take,
    rc::{Rc, Weak},
};


/// Handle that deregisters a callback.
///
/// The callback is deregistered when [`unsubscribe`](Self::unsubscribe) is called or when the handle is dropped,
/// whichever comes first. Unsubscribing more than once has no effect.
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }
    pub fn from_weak_fn<T: 'static>(this: Weak<T>, unsubscribe: impl FnOnce(Rc<T>) + 'static) -> Self {
        Self::from_fn(move || {
            if let Some(this) = this.upgrade() {
                unsubscribe(this)
            }
        })
    }

    /// Deregisters the callback. Does nothing if already unsubscribed.
    pub fn unsubscribe(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
        }
    }

    /// Returns `true` until [`unsubscribe`](Self::unsubscribe) has run.
    pub fn is_active(&self) -> bool {
        !matches!(self.0, RawSubscription::Empty)
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
}
