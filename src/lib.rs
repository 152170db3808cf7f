//! A unidirectional state container.
//!
//! - [`Action`]: closed enum describing an intended state change.
//! - [`Reducer`]: pure function from the current state and an action to the next state.
//! - [`Store`]: holder of the current snapshot; serializes all transitions and notifies subscribers.
//! - [`Selector`]: memoized projection of state.
//! - [`Connection`]: binds a [`Component`] to a store for as long as it is active.
//!
//! ```
//! use std::rc::Rc;
//! use unidux::{Action, Store};
//!
//! #[derive(Action, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! fn counter(state: &Rc<i32>, action: &CounterAction) -> Rc<i32> {
//!     match action {
//!         CounterAction::Increment => Rc::new(**state + 1),
//!     }
//! }
//!
//! let store = Store::new(counter);
//! let _s = store.subscribe(|state| println!("count = {state}"));
//! store.dispatch(CounterAction::Increment).unwrap();
//! assert_eq!(*store.state(), 1);
//! ```
extern crate self as unidux;

mod action;
mod connection;
mod inspector;
mod reducer;
mod selector;
mod store;
mod stream;
mod subscription;

pub use action::*;
pub use connection::*;
pub use inspector::*;
pub use reducer::*;
pub use selector::*;
pub use store::*;
pub use stream::*;
pub use subscription::*;
