//! Serial delivery context for caller callbacks.
//!
//! A `Dispatcher` owns one Tokio task that runs submitted jobs one at a time
//! in submission order. Callbacks routed through it never run concurrently
//! with each other, whichever worker thread produced their result. A job
//! that panics is logged and the task moves on to the next one.

use std::panic::{self, AssertUnwindSafe};

use tokio::sync::mpsc;
use tracing::{error, trace};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Job>,
}

impl Dispatcher {
    /// Spawn the delivery task. Must be called from within a Tokio runtime.
    ///
    /// The task exits once every clone of the dispatcher has been dropped
    /// and the queue is drained.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    error!(panic = panic_message(payload.as_ref()), "dispatched job panicked");
                }
            }
            trace!("dispatcher stopped");
        });
        Self { tx }
    }

    /// Queue `job`. Returns false if the delivery task is gone.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(job)).is_ok()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn jobs_run_in_submission_order() {
        let dispatcher = Dispatcher::spawn();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..100 {
            let seen = Arc::clone(&seen);
            assert!(dispatcher.dispatch(move || seen.lock().unwrap().push(i)));
        }
        let (tx, rx) = oneshot::channel();
        dispatcher.dispatch(move || {
            let _ = tx.send(());
        });
        rx.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn panicking_job_does_not_stop_delivery() {
        let dispatcher = Dispatcher::spawn();
        assert!(dispatcher.dispatch(|| panic!("callback exploded")));
        assert!(dispatcher.dispatch(|| std::panic::panic_any(7_u32)));

        let (tx, rx) = oneshot::channel();
        assert!(dispatcher.dispatch(move || {
            let _ = tx.send("still running");
        }));
        assert_eq!(rx.await.unwrap(), "still running");
    }
}
