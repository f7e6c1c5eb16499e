// Progress Reporting - Startup status fan-out to UI observers
// The controller pushes engine progress here; any number of observers listen.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Poll interval used when draining from a thread that drives a runtime.
const RUNTIME_POLL_INTERVAL: Duration = Duration::from_millis(1);

// =============================================================================
// OBSERVER
// =============================================================================

/// Receives startup progress and the final load outcome.
pub trait LoadObserver: Send + Sync {
    fn on_progress(&self, status: &str);
    fn on_load_succeeded(&self);
    fn on_load_failed(&self);
}

// =============================================================================
// PROGRESS REPORTER
// =============================================================================

struct ReporterState {
    status: String,
    observers: Vec<Arc<dyn LoadObserver>>,
}

/// Broadcast hub for startup progress.
///
/// Observers are notified synchronously, in registration order, on the
/// thread that reports. Dispatch runs on a snapshot of the observer list, so
/// an observer may register or unregister (itself or others) from inside a
/// callback; the change takes effect from the next event.
///
/// An observer that panics is logged and skipped; the remaining observers
/// still receive the event.
pub struct ProgressReporter {
    inner: RwLock<ReporterState>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ReporterState {
                status: String::new(),
                observers: Vec::new(),
            }),
        }
    }

    /// Add an observer unless that same instance is already registered.
    /// Returns whether it was added.
    pub fn register(&self, observer: Arc<dyn LoadObserver>) -> bool {
        let mut state = self.inner.write();
        if state
            .observers
            .iter()
            .any(|existing| same_observer(existing, &observer))
        {
            return false;
        }
        state.observers.push(observer);
        true
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn unregister<O: LoadObserver + ?Sized>(&self, observer: &Arc<O>) -> bool {
        let target = Arc::as_ptr(observer).cast::<()>();
        let mut state = self.inner.write();
        let before = state.observers.len();
        state
            .observers
            .retain(|existing| Arc::as_ptr(existing).cast::<()>() != target);
        state.observers.len() != before
    }

    pub fn clear_observers(&self) {
        self.inner.write().observers.clear();
    }

    pub fn observer_count(&self) -> usize {
        self.inner.read().observers.len()
    }

    /// Last reported status text; empty before the first report.
    pub fn current_status(&self) -> String {
        self.inner.read().status.clone()
    }

    /// Store `status` and hand it to every observer.
    pub fn report_progress(&self, status: &str) {
        let observers = {
            let mut state = self.inner.write();
            state.status.clear();
            state.status.push_str(status);
            state.observers.clone()
        };
        debug!("progress: {status}");

        for observer in &observers {
            notify(|| observer.on_progress(status));
        }
    }

    /// Deliver the terminal load outcome. The status text is left as is.
    pub fn report_load_result(&self, success: bool) {
        let observers = self.inner.read().observers.clone();
        for observer in &observers {
            if success {
                notify(|| observer.on_load_succeeded());
            } else {
                notify(|| observer.on_load_failed());
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn same_observer(a: &Arc<dyn LoadObserver>, b: &Arc<dyn LoadObserver>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

fn notify(callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        warn!("progress observer panicked; continuing with remaining observers");
    }
}

// =============================================================================
// PROGRESS RELAY (worker threads -> driving thread)
// =============================================================================

/// Sending half of a [`ProgressRelay`]. Cheap to clone, usable from any thread.
#[derive(Clone)]
pub struct RelaySender {
    tx: UnboundedSender<String>,
}

impl RelaySender {
    /// Queue a status line. Dropped silently if the relay is already gone.
    pub fn send(&self, status: impl Into<String>) {
        let _ = self.tx.send(status.into());
    }
}

/// FIFO hand-off of progress text from engine worker threads to the thread
/// that called `start_simulation`.
///
/// Workers hold [`RelaySender`]s; the driving thread drains the relay and
/// forwards each line, in order, to its progress callback.
pub struct ProgressRelay {
    rx: UnboundedReceiver<String>,
}

impl ProgressRelay {
    pub fn channel() -> (RelaySender, ProgressRelay) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RelaySender { tx }, ProgressRelay { rx })
    }

    /// Forward everything queued so far without blocking.
    /// Returns the number of lines forwarded.
    pub fn pump(&mut self, sink: &mut dyn FnMut(&str)) -> usize {
        let mut forwarded = 0;
        loop {
            match self.rx.try_recv() {
                Ok(status) => {
                    sink(&status);
                    forwarded += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        forwarded
    }

    /// Block, forwarding lines as they arrive, until every sender is dropped.
    ///
    /// Safe to call from a thread that is driving a tokio runtime: there the
    /// receiver is polled instead of parked, since `blocking_recv` would
    /// panic. The runtime's own tasks still stall until this returns.
    pub fn forward_until_closed(&mut self, sink: &mut dyn FnMut(&str)) -> usize {
        if Handle::try_current().is_ok() {
            debug!("relay drained from inside a runtime; polling");
            return self.poll_until_closed(sink);
        }
        let mut forwarded = 0;
        while let Some(status) = self.rx.blocking_recv() {
            sink(&status);
            forwarded += 1;
        }
        forwarded
    }

    fn poll_until_closed(&mut self, sink: &mut dyn FnMut(&str)) -> usize {
        let mut forwarded = 0;
        loop {
            match self.rx.try_recv() {
                Ok(status) => {
                    sink(&status);
                    forwarded += 1;
                }
                Err(TryRecvError::Empty) => thread::sleep(RUNTIME_POLL_INTERVAL),
                Err(TryRecvError::Disconnected) => return forwarded,
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingObserver;

    #[test]
    fn test_current_status_starts_empty_and_tracks_last_report() {
        let reporter = ProgressReporter::new();
        assert_eq!(reporter.current_status(), "");

        reporter.report_progress("loading X");
        assert_eq!(reporter.current_status(), "loading X");

        reporter.report_progress("loading Y");
        assert_eq!(reporter.current_status(), "loading Y");
    }

    #[test]
    fn test_duplicate_registration_notifies_once() {
        let reporter = ProgressReporter::new();
        let observer = Arc::new(RecordingObserver::default());

        assert!(reporter.register(observer.clone()));
        assert!(!reporter.register(observer.clone()));
        assert_eq!(reporter.observer_count(), 1);

        reporter.report_progress("stars");
        reporter.report_load_result(true);

        assert_eq!(observer.progress(), vec!["stars"]);
        assert_eq!(observer.successes(), 1);
    }

    #[test]
    fn test_observers_notified_in_registration_order() {
        let reporter = ProgressReporter::new();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let first = Arc::new(RecordingObserver::tagged("first", log.clone()));
        let second = Arc::new(RecordingObserver::tagged("second", log.clone()));

        reporter.register(first);
        reporter.register(second);
        reporter.report_progress("catalog");
        reporter.report_load_result(false);

        assert_eq!(
            *log.lock(),
            vec![
                "first:catalog",
                "second:catalog",
                "first:failed",
                "second:failed"
            ]
        );
    }

    #[test]
    fn test_unregister_stops_future_notifications_only() {
        let reporter = ProgressReporter::new();
        let observer = Arc::new(RecordingObserver::default());
        reporter.register(observer.clone());

        reporter.report_progress("before");
        assert!(reporter.unregister(&observer));
        reporter.report_progress("after");
        reporter.report_load_result(true);

        assert_eq!(observer.progress(), vec!["before"]);
        assert_eq!(observer.successes(), 0);
        assert_eq!(reporter.current_status(), "after");
    }

    #[test]
    fn test_unregister_unknown_observer_is_noop() {
        let reporter = ProgressReporter::new();
        let stranger = Arc::new(RecordingObserver::default());
        assert!(!reporter.unregister(&stranger));
        assert_eq!(reporter.observer_count(), 0);
    }

    #[test]
    fn test_load_result_leaves_status_untouched() {
        let reporter = ProgressReporter::new();
        reporter.report_progress("textures");
        reporter.report_load_result(true);
        reporter.report_load_result(false);
        assert_eq!(reporter.current_status(), "textures");
    }

    #[test]
    fn test_panicking_observer_does_not_starve_others() {
        struct Exploding;
        impl LoadObserver for Exploding {
            fn on_progress(&self, _status: &str) {
                panic!("observer failure");
            }
            fn on_load_succeeded(&self) {
                panic!("observer failure");
            }
            fn on_load_failed(&self) {}
        }

        let reporter = ProgressReporter::new();
        let healthy = Arc::new(RecordingObserver::default());
        reporter.register(Arc::new(Exploding));
        reporter.register(healthy.clone());

        reporter.report_progress("still here");
        reporter.report_load_result(true);

        assert_eq!(healthy.progress(), vec!["still here"]);
        assert_eq!(healthy.successes(), 1);
    }

    #[test]
    fn test_observer_can_unregister_itself_during_dispatch() {
        struct OneShot {
            reporter: Arc<ProgressReporter>,
            seen: parking_lot::Mutex<Vec<String>>,
            me: parking_lot::Mutex<Option<Arc<OneShot>>>,
        }
        impl LoadObserver for OneShot {
            fn on_progress(&self, status: &str) {
                self.seen.lock().push(status.to_owned());
                if let Some(me) = self.me.lock().take() {
                    self.reporter.unregister(&me);
                }
            }
            fn on_load_succeeded(&self) {}
            fn on_load_failed(&self) {}
        }

        let reporter = Arc::new(ProgressReporter::new());
        let one_shot = Arc::new(OneShot {
            reporter: reporter.clone(),
            seen: parking_lot::Mutex::new(Vec::new()),
            me: parking_lot::Mutex::new(None),
        });
        *one_shot.me.lock() = Some(one_shot.clone());
        reporter.register(one_shot.clone());

        reporter.report_progress("first");
        reporter.report_progress("second");

        assert_eq!(*one_shot.seen.lock(), vec!["first"]);
        assert_eq!(reporter.observer_count(), 0);
    }

    #[test]
    fn test_relay_pump_preserves_fifo_order() {
        let (sender, mut relay) = ProgressRelay::channel();
        sender.send("one");
        sender.send("two");
        sender.send(String::from("three"));

        let mut received = Vec::new();
        assert_eq!(relay.pump(&mut |s| received.push(s.to_owned())), 3);
        assert_eq!(received, vec!["one", "two", "three"]);
        assert_eq!(relay.pump(&mut |_| panic!("nothing queued")), 0);
    }

    #[test]
    fn test_relay_forwards_worker_events_until_closed() {
        let (sender, mut relay) = ProgressRelay::channel();
        let worker = thread::spawn(move || {
            for i in 0..50 {
                sender.send(format!("step {i}"));
            }
        });

        let mut received = Vec::new();
        let count = relay.forward_until_closed(&mut |s| received.push(s.to_owned()));
        worker.join().unwrap();

        assert_eq!(count, 50);
        let expected: Vec<String> = (0..50).map(|i| format!("step {i}")).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn test_relay_drains_from_inside_a_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let received = runtime.block_on(async {
            let (sender, mut relay) = ProgressRelay::channel();
            let worker = thread::spawn(move || {
                for i in 0..20 {
                    sender.send(format!("chunk {i}"));
                    thread::sleep(Duration::from_micros(200));
                }
            });

            let mut received = Vec::new();
            relay.forward_until_closed(&mut |s| received.push(s.to_owned()));
            worker.join().unwrap();
            received
        });

        let expected: Vec<String> = (0..20).map(|i| format!("chunk {i}")).collect();
        assert_eq!(received, expected);
    }
}
