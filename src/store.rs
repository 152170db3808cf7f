use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use derive_ex::derive_ex;
use parse_display::Display;
use serde::{Serialize, Serializer};
use tracing::{debug, error, trace, warn};

use crate::{Action, Inspector, Reducer, Subscription};

#[cfg(test)]
mod tests;

/// Holder of the current state snapshot.
///
/// All state transitions go through [`dispatch`](Self::dispatch), which runs the reducer,
/// replaces the snapshot and notifies subscribers before returning.
///
/// `Store` is a handle: clones share the same state, reducer and subscribers.
/// Pass it to every part of the application that needs it.
#[derive_ex(Clone, bound())]
pub struct Store<S: 'static, A: Action>(Rc<StoreNode<S, A>>);

impl<S: 'static, A: Action> Store<S, A> {
    /// Create a new `Store` whose initial state is `S::default()`.
    pub fn new(reducer: impl Reducer<S, A>) -> Self
    where
        S: Default,
    {
        Self::with_state(reducer, S::default())
    }

    /// Create a new `Store` with the given initial state.
    pub fn with_state(reducer: impl Reducer<S, A>, state: S) -> Self {
        Self::builder(reducer).build_with_state(state)
    }

    pub fn builder(reducer: impl Reducer<S, A>) -> StoreBuilder<S, A> {
        StoreBuilder {
            reducer: Box::new(reducer),
            state: None,
            inspectors: Vec::new(),
        }
    }

    /// Returns the current snapshot.
    pub fn state(&self) -> Rc<S> {
        self.0.state.borrow().clone()
    }

    /// Runs the reducer with the current state and `action`.
    ///
    /// If the reducer returns a different `Rc` than the current snapshot, the snapshot is replaced,
    /// inspectors are called, and then every subscriber is called once in subscription order.
    /// Returns `Ok(true)` in that case and `Ok(false)` if the state did not change.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Reentrant`] if called from a reducer, inspector or subscriber
    ///   while another dispatch is in progress. The outer dispatch is not affected.
    /// - [`DispatchError::Poisoned`] if a reducer panicked during an earlier dispatch.
    ///
    /// # Panics
    ///
    /// A panic in the reducer propagates to the caller. The snapshot is left unchanged and the store is poisoned.
    pub fn dispatch(&self, action: A) -> Result<bool, DispatchError> {
        let node = &*self.0;
        if node.poisoned.get() {
            error!(action = action.name(), "dispatch to poisoned store");
            return Err(DispatchError::Poisoned {
                action: action.name(),
            });
        }
        if let Some(active) = node.dispatching.get() {
            warn!(
                action = action.name(),
                active, "rejected dispatch during an active dispatch"
            );
            return Err(DispatchError::Reentrant {
                action: action.name(),
                active,
            });
        }
        let _cycle = DispatchCycle::enter(&node.dispatching, action.name());
        trace!(action = action.name(), "dispatch");

        let current = self.state();
        let next = {
            let _poison = PoisonOnUnwind {
                poisoned: &node.poisoned,
                action: action.name(),
            };
            node.reducer.reduce(&current, &action)
        };
        let changed = !Rc::ptr_eq(&current, &next);
        if changed {
            *node.state.borrow_mut() = next.clone();
            debug!(action = action.name(), "state changed");
        }
        for inspector in &node.inspectors {
            inspector.inspect(&action, &next, changed);
        }
        if changed {
            let subscribers = node.subscribers.borrow().snapshot();
            for f in subscribers {
                (&mut *f.borrow_mut())(&next);
            }
        }
        Ok(changed)
    }

    /// Registers `f` to be called with the new snapshot after every state change.
    ///
    /// `f` is not called for the current state. Dropping the returned [`Subscription`] deregisters `f`.
    /// A subscriber removed while a notification is in progress still receives that notification.
    pub fn subscribe(&self, f: impl FnMut(&Rc<S>) + 'static) -> Subscription {
        let key = self.0.subscribers.borrow_mut().insert(Rc::new(RefCell::new(f)));
        Subscription::from_weak_fn(Rc::downgrade(&self.0), move |node| {
            node.subscribers.borrow_mut().remove(key);
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers.borrow().entries.len()
    }

    /// Returns `true` while a dispatch cycle is running.
    pub fn is_dispatching(&self) -> bool {
        self.0.dispatching.get().is_some()
    }

    /// Returns `true` if a reducer panicked and the store no longer accepts actions.
    pub fn is_poisoned(&self) -> bool {
        self.0.poisoned.get()
    }
}

impl<S: std::fmt::Debug + 'static, A: Action> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.state.try_borrow() {
            Ok(state) => std::fmt::Debug::fmt(&**state, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<S, A> Serialize for Store<S, A>
where
    S: Serialize + 'static,
    A: Action,
{
    fn serialize<Se>(&self, serializer: Se) -> Result<Se::Ok, Se::Error>
    where
        Se: Serializer,
    {
        S::serialize(&self.state(), serializer)
    }
}

/// Construction options for [`Store`].
pub struct StoreBuilder<S: 'static, A: Action> {
    reducer: Box<dyn Reducer<S, A>>,
    state: Option<S>,
    inspectors: Vec<Box<dyn Inspector<S, A>>>,
}

impl<S: 'static, A: Action> StoreBuilder<S, A> {
    /// Overrides the initial state.
    pub fn initial_state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    /// Adds an inspector called after every dispatch.
    pub fn inspector(mut self, inspector: impl Inspector<S, A>) -> Self {
        self.inspectors.push(Box::new(inspector));
        self
    }

    /// Builds the store. The initial state is `S::default()` unless overridden.
    pub fn build(mut self) -> Store<S, A>
    where
        S: Default,
    {
        let state = self.state.take().unwrap_or_default();
        self.into_store(state)
    }

    /// Builds the store with `state` as the initial state.
    ///
    /// `state` takes precedence over a state set with [`initial_state`](Self::initial_state).
    pub fn build_with_state(self, state: S) -> Store<S, A> {
        self.into_store(state)
    }

    fn into_store(self, state: S) -> Store<S, A> {
        let StoreBuilder {
            reducer,
            state: overridden,
            inspectors,
        } = self;
        if overridden.is_some() {
            debug!("initial state replaced by build_with_state");
        }
        Store(Rc::new(StoreNode {
            state: RefCell::new(Rc::new(state)),
            reducer,
            inspectors,
            subscribers: RefCell::new(Subscribers::new()),
            dispatching: Cell::new(None),
            poisoned: Cell::new(false),
        }))
    }
}

/// Error returned by [`Store::dispatch`].
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    #[display("cannot dispatch `{action}` while `{active}` is being dispatched")]
    Reentrant {
        action: &'static str,
        active: &'static str,
    },
    #[display("cannot dispatch `{action}` because a reducer panicked")]
    Poisoned { action: &'static str },
}

impl std::error::Error for DispatchError {}

struct StoreNode<S: 'static, A: 'static> {
    state: RefCell<Rc<S>>,
    reducer: Box<dyn Reducer<S, A>>,
    inspectors: Vec<Box<dyn Inspector<S, A>>>,
    subscribers: RefCell<Subscribers<S>>,
    dispatching: Cell<Option<&'static str>>,
    poisoned: Cell<bool>,
}

type SubscriberFn<S> = Rc<RefCell<dyn FnMut(&Rc<S>)>>;

struct Subscribers<S> {
    next_key: u64,
    entries: Vec<(u64, SubscriberFn<S>)>,
}
impl<S> Subscribers<S> {
    fn new() -> Self {
        Self {
            next_key: 0,
            entries: Vec::new(),
        }
    }
    fn insert(&mut self, f: SubscriberFn<S>) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        self.entries.push((key, f));
        key
    }
    fn remove(&mut self, key: u64) {
        if let Ok(index) = self.entries.binary_search_by_key(&key, |e| e.0) {
            self.entries.remove(index);
        }
    }
    fn snapshot(&self) -> Vec<SubscriberFn<S>> {
        self.entries.iter().map(|e| e.1.clone()).collect()
    }
}

struct DispatchCycle<'a>(&'a Cell<Option<&'static str>>);
impl<'a> DispatchCycle<'a> {
    fn enter(dispatching: &'a Cell<Option<&'static str>>, action: &'static str) -> Self {
        dispatching.set(Some(action));
        Self(dispatching)
    }
}
impl Drop for DispatchCycle<'_> {
    fn drop(&mut self) {
        self.0.set(None);
    }
}

struct PoisonOnUnwind<'a> {
    poisoned: &'a Cell<bool>,
    action: &'static str,
}
impl Drop for PoisonOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!(action = self.action, "reducer panicked, store is poisoned");
            self.poisoned.set(true);
        }
    }
}
