//! # Fan-out of lifecycle events to registered observers.
//!
//! A [`SubscriberSet`] owns one bounded queue and one worker task per
//! subscriber. Publishing into the set never waits on a handler: a full
//! queue drops the event for that subscriber only, and a panic inside a
//! handler is contained to its worker. Each subscriber sees its own events
//! in FIFO order; there is no ordering across subscribers.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event};

use super::Subscribe;

/// One subscriber's queue, kept with its name for diagnostics.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Queue plus worker for one subscriber.
fn spawn_worker(sub: Arc<dyn Subscribe>) -> (Lane, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
    let name = sub.name();
    let worker = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let handled = std::panic::AssertUnwindSafe(sub.on_event(ev.as_ref()))
                .catch_unwind()
                .await;
            if let Err(panic) = handled {
                tracing::error!(subscriber = sub.name(), ?panic, "event handler panicked");
            }
        }
    });
    (Lane { name, tx }, worker)
}

/// Set of subscribers fed from the bus through per-subscriber queues.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Builds the set, starting one worker per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let (lanes, workers) = subs.into_iter().map(spawn_worker).unzip();
        Self { lanes, workers }
    }

    /// Subscribes to the bus and forwards every event to the set until
    /// cancelled. Call once after constructing the set.
    pub fn spawn_listener(self: &Arc<Self>, bus: &Bus, token: &CancellationToken) {
        let mut rx = bus.subscribe();
        let set = Arc::clone(self);
        let token = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                            continue;
                        }
                    }
                }
            }
        });
    }

    /// Hands one event to every subscriber's queue without waiting.
    ///
    /// A subscriber whose queue is full or whose worker has stopped misses
    /// this event; that is logged with the subscriber's name and does not
    /// affect the others.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for lane in &self.lanes {
            match lane.tx.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = lane.name, "dropped event: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = lane.name, "dropped event: worker stopped");
                }
            }
        }
    }

    /// Closes every queue and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::events::EventKind;

    use super::*;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Subscribe for Counting {
        async fn on_event(&self, _event: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct Faulty;

    #[async_trait]
    impl Subscribe for Faulty {
        async fn on_event(&self, _event: &Event) {
            panic!("handler blew up");
        }
        fn name(&self) -> &'static str {
            "faulty"
        }
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        let set = SubscriberSet::new(vec![
            Arc::new(Counting(Arc::clone(&a))),
            Arc::new(Counting(Arc::clone(&b))),
        ]);
        assert_eq!(set.len(), 2);

        for _ in 0..3 {
            set.emit(&Event::now(EventKind::ApplicationLaunched));
        }
        set.shutdown().await;

        assert_eq!(a.load(Ordering::SeqCst), 3);
        assert_eq!(b.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn a_panicking_handler_is_isolated_from_the_rest() {
        let hits = Arc::new(AtomicUsize::new(0));
        let set = SubscriberSet::new(vec![
            Arc::new(Faulty),
            Arc::new(Counting(Arc::clone(&hits))),
        ]);

        set.emit(&Event::now(EventKind::ApplicationPaused));
        set.emit(&Event::now(EventKind::ApplicationResumed));
        set.shutdown().await;

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
