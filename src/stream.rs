use std::{
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver},
    Stream, StreamExt,
};

use crate::{Action, Store, Subscription};

impl<S: 'static, A: Action> Store<S, A> {
    /// Returns a stream of snapshots committed after this call.
    ///
    /// Snapshots are buffered until polled. Dropping the stream unsubscribes.
    pub fn watch(&self) -> Watch<S> {
        let (tx, rx) = unbounded();
        let subscription = self.subscribe(move |state| {
            let _ = tx.unbounded_send(state.clone());
        });
        Watch {
            rx,
            _subscription: subscription,
        }
    }
}

/// Stream returned by [`Store::watch`].
pub struct Watch<S> {
    rx: UnboundedReceiver<Rc<S>>,
    _subscription: Subscription,
}

impl<S> Stream for Watch<S> {
    type Item = Rc<S>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_next_unpin(cx)
    }
}
