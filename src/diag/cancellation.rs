//! Cancellation of diagnostic conversations.
//!
//! The conversation owns a [`CancellationSource`]; each request carries a
//! [`CancellationHandler`] that services observe. Cancelling only signals:
//! it is up to the service to resolve its [`super::ResponseFuture`].

use std::sync::{Arc, Mutex};
use tokio::sync::watch;

type Notifier = Box<dyn FnOnce() + Send>;

struct Shared {
    // Guards the notifiers and orders them against the cancel flag
    notifiers: Mutex<Vec<Notifier>>,
}

pub struct CancellationSource {
    tx: watch::Sender<bool>,
    shared: Arc<Shared>,
}

impl CancellationSource {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        CancellationSource {
            tx,
            shared: Arc::new(Shared { notifiers: Mutex::new(Vec::new()) }),
        }
    }

    pub fn handler(&self) -> CancellationHandler {
        CancellationHandler {
            rx: self.tx.subscribe(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Abort the conversation, running every registered notifier. Only the
    /// first call has an effect.
    pub fn cancel(&self) {
        let notifiers = {
            let mut notifiers = self.shared.notifiers.lock().unwrap_or_else(|e| e.into_inner());
            if self.tx.send_replace(true) {
                return;
            }
            std::mem::take(&mut *notifiers)
        };

        for notify in notifiers {
            notify();
        }
    }

    pub fn is_canceled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct CancellationHandler {
    rx: watch::Receiver<bool>,
    shared: Arc<Shared>,
}

impl CancellationHandler {
    /// A handler whose conversation can never be cancelled.
    pub fn detached() -> Self {
        CancellationSource::new().handler()
    }

    pub fn is_canceled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Run `notifier` once on cancellation; immediately if already cancelled.
    /// Notifiers from every handler of the conversation are kept.
    pub fn set_notifier<F>(&self, notifier: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut notifiers = self.shared.notifiers.lock().unwrap_or_else(|e| e.into_inner());
        if *self.rx.borrow() {
            drop(notifiers);
            notifier();
        } else {
            notifiers.push(Box::new(notifier));
        }
    }

    /// Resolves once the conversation is cancelled. Never resolves for a
    /// conversation whose source was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let outcome = rx.wait_for(|canceled| *canceled).await.map(|_| ());
        if outcome.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
