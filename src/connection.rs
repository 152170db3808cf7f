use std::{
    cell::{Cell, Ref, RefCell},
    rc::Rc,
};

use crate::{Action, Store, Subscription};


/// Presentation unit that renders props derived from state.
pub trait Component<S: ?Sized> {
    type Props: PartialEq + 'static;

    /// Derives the props to render from a snapshot.
    fn props(&self, state: &S) -> Self::Props;

    /// Renders `props`. Called only when the props differ from the previously rendered ones.
    fn render(&mut self, props: &Self::Props);
}

/// Binding between a [`Component`] and a [`Store`] that lasts while the connection is active.
///
/// On activation the component is rendered with props from the current state, so there is no gap before the first render.
/// After that it is re-rendered after every state change whose props differ from the last rendered props.
///
/// `render` must not dispatch while a dispatch is in progress; such dispatches fail with
/// [`DispatchError::Reentrant`](crate::DispatchError::Reentrant).
pub struct Connection<S: 'static, C: Component<S> + 'static> {
    node: Rc<ConnectionNode<S, C>>,
    subscription: Subscription,
}

impl<S: 'static, C: Component<S> + 'static> Connection<S, C> {
    /// Subscribes `component` to `store` and renders it once with the current state.
    pub fn activate<A: Action>(store: &Store<S, A>, component: C) -> Self {
        let node = Rc::new(ConnectionNode {
            component: RefCell::new(component),
            props: RefCell::new(None),
            pending: RefCell::new(None),
            active: Cell::new(true),
            rendering: Cell::new(false),
            render_count: Cell::new(0),
        });
        let weak = Rc::downgrade(&node);
        let subscription = store.subscribe(move |state| {
            if let Some(node) = weak.upgrade() {
                if node.active.get() {
                    node.update(state.clone());
                }
            }
        });
        node.update(store.state());
        Self { node, subscription }
    }

    /// Stops receiving notifications. Does nothing if already deactivated.
    ///
    /// A connection deactivated while a notification is in progress is not rendered for that notification.
    pub fn deactivate(&mut self) {
        self.node.active.set(false);
        self.subscription.unsubscribe();
    }

    pub fn is_active(&self) -> bool {
        self.node.active.get()
    }

    /// The most recently rendered props.
    pub fn props(&self) -> Option<Ref<'_, C::Props>> {
        Ref::filter_map(self.node.props.borrow(), |props| props.as_ref()).ok()
    }

    pub fn render_count(&self) -> usize {
        self.node.render_count.get()
    }

    pub fn with_component<T>(&self, f: impl FnOnce(&C) -> T) -> T {
        f(&self.node.component.borrow())
    }
}

struct ConnectionNode<S, C: Component<S>> {
    component: RefCell<C>,
    props: RefCell<Option<C::Props>>,
    pending: RefCell<Option<Rc<S>>>,
    active: Cell<bool>,
    rendering: Cell<bool>,
    render_count: Cell<usize>,
}

impl<S, C: Component<S>> ConnectionNode<S, C> {
    fn update(&self, state: Rc<S>) {
        if self.rendering.get() {
            *self.pending.borrow_mut() = Some(state);
            return;
        }
        self.pending.borrow_mut().take();
        let mut state = state;
        loop {
            self.render(&state);
            match self.pending.borrow_mut().take() {
                Some(next) => state = next,
                None => break,
            }
        }
    }
    fn render(&self, state: &S) {
        let props = self.component.borrow().props(state);
        if self.props.borrow().as_ref() == Some(&props) {
            return;
        }
        {
            let _rendering = Rendering::enter(&self.rendering);
            self.component.borrow_mut().render(&props);
        }
        self.render_count.set(self.render_count.get() + 1);
        *self.props.borrow_mut() = Some(props);
    }
}

struct Rendering<'a>(&'a Cell<bool>);
impl<'a> Rendering<'a> {
    fn enter(rendering: &'a Cell<bool>) -> Self {
        rendering.set(true);
        Self(rendering)
    }
}
impl Drop for Rendering<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
