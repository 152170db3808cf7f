use std::{
    cell::RefCell,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
};

use assert_call::{call, CallRecorder};
use serde::{Deserialize, Serialize};

use crate::{Action, DispatchError, Store, Subscription};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Counter {
    count: i32,
}

#[derive(Action, Debug)]
enum CounterAction {
    Increment,
    Decrement,
    Crash,
    Unknown,
}

fn counter(state: &Rc<Counter>, action: &CounterAction) -> Rc<Counter> {
    match action {
        CounterAction::Increment => Rc::new(Counter {
            count: state.count + 1,
        }),
        CounterAction::Decrement => Rc::new(Counter {
            count: state.count - 1,
        }),
        CounterAction::Crash => panic!("reducer failed"),
        CounterAction::Unknown => state.clone(),
    }
}

#[test]
fn new() {
    let store = Store::new(counter);
    assert_eq!(*store.state(), Counter { count: 0 });
}

#[test]
fn with_state() {
    let store = Store::with_state(counter, Counter { count: 10 });
    store.dispatch(CounterAction::Decrement).unwrap();
    assert_eq!(store.state().count, 9);
}

#[test]
fn builder_initial_state() {
    let store = Store::builder(counter)
        .initial_state(Counter { count: 5 })
        .build();
    assert_eq!(store.state().count, 5);
}

#[test]
fn builder_default_state() {
    let store = Store::builder(counter).build();
    assert_eq!(*store.state(), Counter::default());
}

#[test]
fn build_with_state_overrides_initial_state() {
    let store = Store::builder(counter)
        .initial_state(Counter { count: 5 })
        .build_with_state(Counter { count: 9 });
    assert_eq!(store.state().count, 9);
}

#[test]
fn increment_three_times() {
    let mut cr = CallRecorder::new();
    let store = Store::new(counter);
    let _a = store.subscribe(|s| call!("a {}", s.count));
    let _b = store.subscribe(|s| call!("b {}", s.count));

    for _ in 0..3 {
        assert_eq!(store.dispatch(CounterAction::Increment), Ok(true));
    }
    assert_eq!(*store.state(), Counter { count: 3 });
    cr.verify(["a 1", "b 1", "a 2", "b 2", "a 3", "b 3"]);
}

#[test]
fn no_notification_on_no_op() {
    let mut cr = CallRecorder::new();
    let store = Store::new(counter);
    let before = store.state();
    let _s = store.subscribe(|_| call!("notified"));

    assert_eq!(store.dispatch(CounterAction::Unknown), Ok(false));
    cr.verify(());
    assert!(Rc::ptr_eq(&before, &store.state()));
}

#[test]
fn state_is_shared_between_clones() {
    let store = Store::new(counter);
    let other = store.clone();
    other.dispatch(CounterAction::Increment).unwrap();
    assert_eq!(store.state().count, 1);
}

#[test]
fn old_snapshot_is_not_modified() {
    let store = Store::new(counter);
    let s0 = store.state();
    store.dispatch(CounterAction::Increment).unwrap();
    assert_eq!(s0.count, 0);
    assert_eq!(store.state().count, 1);
}

#[test]
fn reentrant_dispatch_from_subscriber_fails() {
    let mut cr = CallRecorder::new();
    let store = Store::new(counter);
    let inner = store.clone();
    let _s = store.subscribe(move |s| match inner.dispatch(CounterAction::Increment) {
        Ok(_) => call!("{} accepted", s.count),
        Err(e) => call!("{} {}", s.count, e),
    });

    assert_eq!(store.dispatch(CounterAction::Increment), Ok(true));
    cr.verify("1 cannot dispatch `Increment` while `Increment` is being dispatched");
    assert_eq!(store.state().count, 1);
    assert!(!store.is_dispatching());
}

#[test]
fn reentrant_dispatch_from_reducer_fails() {
    let slot: Rc<RefCell<Option<Store<Counter, CounterAction>>>> = Rc::new(RefCell::new(None));
    let inner = slot.clone();
    let store = Store::new(move |state: &Rc<Counter>, action: &CounterAction| {
        if let CounterAction::Increment = action {
            if let Some(store) = &*inner.borrow() {
                assert!(store.is_dispatching());
                assert_eq!(
                    store.dispatch(CounterAction::Decrement),
                    Err(DispatchError::Reentrant {
                        action: "Decrement",
                        active: "Increment",
                    })
                );
            }
        }
        counter(state, action)
    });
    *slot.borrow_mut() = Some(store.clone());

    assert_eq!(store.dispatch(CounterAction::Increment), Ok(true));
    assert_eq!(store.state().count, 1);
    *slot.borrow_mut() = None;
}

#[test]
fn unsubscribe_twice() {
    let mut cr = CallRecorder::new();
    let store = Store::new(counter);
    let mut a = store.subscribe(|_| call!("a"));
    let _b = store.subscribe(|_| call!("b"));
    assert_eq!(store.subscriber_count(), 2);

    a.unsubscribe();
    a.unsubscribe();
    assert_eq!(store.subscriber_count(), 1);

    store.dispatch(CounterAction::Increment).unwrap();
    cr.verify("b");
}

#[test]
fn drop_subscription_unsubscribes() {
    let mut cr = CallRecorder::new();
    let store = Store::new(counter);
    let s = store.subscribe(|_| call!("a"));
    drop(s);
    store.dispatch(CounterAction::Increment).unwrap();
    cr.verify(());
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn unsubscribe_during_notification() {
    let mut cr = CallRecorder::new();
    let store = Store::new(counter);
    let later: Rc<RefCell<Subscription>> = Rc::new(RefCell::new(Subscription::empty()));
    let target = later.clone();
    let _first = store.subscribe(move |s| {
        call!("first {}", s.count);
        target.borrow_mut().unsubscribe();
    });
    *later.borrow_mut() = store.subscribe(|s| call!("second {}", s.count));
    let _third = store.subscribe(|s| call!("third {}", s.count));

    store.dispatch(CounterAction::Increment).unwrap();
    cr.verify(["first 1", "second 1", "third 1"]);

    store.dispatch(CounterAction::Increment).unwrap();
    cr.verify(["first 2", "third 2"]);
}

#[test]
fn subscribe_during_notification_waits_for_next_dispatch() {
    let mut cr = CallRecorder::new();
    let store = Store::new(counter);
    let added = Rc::new(RefCell::new(Vec::new()));
    let inner = store.clone();
    let list = added.clone();
    let _s = store.subscribe(move |s| {
        call!("outer {}", s.count);
        if s.count == 1 {
            list.borrow_mut()
                .push(inner.subscribe(|s| call!("inner {}", s.count)));
        }
    });

    store.dispatch(CounterAction::Increment).unwrap();
    cr.verify("outer 1");
    store.dispatch(CounterAction::Increment).unwrap();
    cr.verify(["outer 2", "inner 2"]);
}

#[test]
fn subscription_outlives_store() {
    let store = Store::new(counter);
    let mut s = store.subscribe(|_| {});
    drop(store);
    s.unsubscribe();
    assert!(!s.is_active());
}

#[test]
fn reducer_panic_poisons_store() {
    let store = Store::new(counter);
    store.dispatch(CounterAction::Increment).unwrap();
    let before = store.state();

    let result = catch_unwind(AssertUnwindSafe(|| store.dispatch(CounterAction::Crash)));
    assert!(result.is_err());
    assert!(store.is_poisoned());
    assert!(!store.is_dispatching());
    assert!(Rc::ptr_eq(&before, &store.state()));

    assert_eq!(
        store.dispatch(CounterAction::Increment),
        Err(DispatchError::Poisoned {
            action: "Increment"
        })
    );
    assert_eq!(store.state().count, 1);
}

#[test]
fn subscriber_panic_does_not_poison() {
    let store = Store::new(counter);
    let s = store.subscribe(|_| panic!("subscriber failed"));
    let result = catch_unwind(AssertUnwindSafe(|| store.dispatch(CounterAction::Increment)));
    assert!(result.is_err());
    assert!(!store.is_poisoned());
    assert_eq!(store.state().count, 1);

    drop(s);
    assert_eq!(store.dispatch(CounterAction::Increment), Ok(true));
}

#[test]
fn error_display() {
    let e = DispatchError::Reentrant {
        action: "Decrement",
        active: "Increment",
    };
    assert_eq!(
        e.to_string(),
        "cannot dispatch `Decrement` while `Increment` is being dispatched"
    );
    let e = DispatchError::Poisoned { action: "Crash" };
    assert_eq!(
        e.to_string(),
        "cannot dispatch `Crash` because a reducer panicked"
    );
}

#[test]
fn serialize_snapshot() {
    let store = Store::new(counter);
    store.dispatch(CounterAction::Increment).unwrap();
    let json = serde_json::to_string(&store).unwrap();
    assert_eq!(json, r#"{"count":1}"#);

    let restored: Counter = serde_json::from_str(&json).unwrap();
    let store = Store::with_state(counter, restored);
    store.dispatch(CounterAction::Increment).unwrap();
    assert_eq!(store.state().count, 2);
}

#[test]
fn debug_shows_state() {
    let store = Store::with_state(counter, Counter { count: 7 });
    assert_eq!(format!("{store:?}"), "Counter { count: 7 }");
}

#[test]
fn dispatch_with_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
    let store = Store::new(counter);
    assert_eq!(store.dispatch(CounterAction::Increment), Ok(true));
    assert_eq!(store.dispatch(CounterAction::Unknown), Ok(false));
}
