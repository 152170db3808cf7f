use std::{
    cell::{Ref, RefCell},
    fmt::Debug,
    rc::Rc,
};

use derive_ex::derive_ex;
use tracing::debug;

use crate::Action;


/// Observer of every dispatched action, for devtools and logging.
///
/// Called after the snapshot is committed and before subscribers are notified,
/// including for actions that did not change the state.
/// An inspector only observes: it cannot change the result of the dispatch,
/// and dispatching from inside an inspector is rejected.
pub trait Inspector<S, A>: 'static {
    fn inspect(&self, action: &A, state: &Rc<S>, changed: bool);
}

impl<S, A, F> Inspector<S, A> for F
where
    F: Fn(&A, &Rc<S>, bool) + 'static,
{
    fn inspect(&self, action: &A, state: &Rc<S>, changed: bool) {
        self(action, state, changed)
    }
}

/// Inspector that logs every action with [`tracing`] at `DEBUG` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingInspector;

impl<S, A> Inspector<S, A> for TracingInspector
where
    A: Action + Debug,
{
    fn inspect(&self, action: &A, _state: &Rc<S>, changed: bool) {
        debug!(name = action.name(), ?action, changed, "action dispatched");
    }
}

/// One dispatch recorded by [`ActionLog`].
#[derive_ex(Clone, bound())]
pub struct LogEntry<S> {
    pub action: &'static str,
    pub state: Rc<S>,
    pub changed: bool,
}
impl<S: Debug> Debug for LogEntry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEntry")
            .field("action", &self.action)
            .field("state", &self.state)
            .field("changed", &self.changed)
            .finish()
    }
}

/// Inspector that records the name of every dispatched action together with the resulting snapshot.
///
/// `ActionLog` is a handle. Pass a clone to [`StoreBuilder::inspector`](crate::StoreBuilder::inspector)
/// and read the entries through the original.
#[derive_ex(Clone, Default, bound())]
pub struct ActionLog<S>(Rc<RefCell<Vec<LogEntry<S>>>>);

impl<S> ActionLog<S> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Vec::new())))
    }
    pub fn entries(&self) -> Ref<'_, [LogEntry<S>]> {
        Ref::map(self.0.borrow(), |entries| entries.as_slice())
    }
    pub fn names(&self) -> Vec<&'static str> {
        self.0.borrow().iter().map(|e| e.action).collect()
    }

    /// Snapshots produced by actions that changed the state, in dispatch order.
    pub fn states(&self) -> Vec<Rc<S>> {
        self.0
            .borrow()
            .iter()
            .filter(|e| e.changed)
            .map(|e| e.state.clone())
            .collect()
    }
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl<S: 'static, A: Action> Inspector<S, A> for ActionLog<S> {
    fn inspect(&self, action: &A, state: &Rc<S>, changed: bool) {
        self.0.borrow_mut().push(LogEntry {
            action: action.name(),
            state: state.clone(),
            changed,
        });
    }
}
