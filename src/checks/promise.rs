//! Single-fulfillment completion handle handed to procedures.
//!
//! A [`Promise`] wraps a oneshot sender. Completing it consumes the promise,
//! so a procedure can report at most once. Whichever of "procedure reports"
//! and "executor gives up" happens first wins; a report arriving after the
//! executor dropped its receiver is a no-op.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::checks::error::ProcedureFault;
use crate::checks::status::Status;

/// What a procedure run settles to.
pub(crate) type Completion = Result<Status, ProcedureFault>;

type Slot = Arc<Mutex<Option<oneshot::Sender<Completion>>>>;

/// Create a promise, the executor-side settler and the receiving end.
pub(crate) fn channel() -> (Promise, Settler, oneshot::Receiver<Completion>) {
    let (tx, rx) = oneshot::channel();
    let slot: Slot = Arc::new(Mutex::new(Some(tx)));
    (Promise { slot: slot.clone() }, Settler { slot }, rx)
}

fn settle(slot: &Slot, completion: Completion) -> bool {
    let tx = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    match tx {
        Some(tx) => tx.send(completion).is_ok(),
        None => false,
    }
}

/// Completion handle given to a procedure.
///
/// Dropping a promise without completing it reports
/// [`ProcedureFault::Abandoned`]. When the drop happens during a panic the
/// executor reports the panic instead.
pub struct Promise {
    slot: Slot,
}

impl Promise {
    /// Report a status. Returns `false` if the result was no longer wanted
    /// (the executor already timed out).
    pub fn complete(self, status: Status) -> bool {
        settle(&self.slot, Ok(status))
    }

    /// Report that the procedure itself failed.
    pub fn fail(self, cause: impl fmt::Display) -> bool {
        settle(&self.slot, Err(ProcedureFault::Failed(cause.to_string())))
    }

    pub(crate) fn panicked(self, message: String) -> bool {
        settle(&self.slot, Err(ProcedureFault::Panicked(message)))
    }

    /// True once nobody is waiting for this promise anymore.
    pub fn is_closed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }
}

impl Drop for Promise {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        settle(&self.slot, Err(ProcedureFault::Abandoned));
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Executor-side handle used to report a panic caught around the procedure.
pub(crate) struct Settler {
    slot: Slot,
}

impl Settler {
    pub(crate) fn panicked(&self, message: String) -> bool {
        settle(&self.slot, Err(ProcedureFault::Panicked(message)))
    }

    pub(crate) fn timed_out(&self, after: Duration) -> bool {
        settle(&self.slot, Err(ProcedureFault::TimedOut(after)))
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_delivers_once() {
        let (promise, settler, rx) = channel();
        assert!(promise.complete(Status::up()));
        assert!(!settler.panicked("late".into()));
        assert_eq!(rx.await.unwrap(), Ok(Status::up()));
    }

    #[tokio::test]
    async fn test_timed_out_wins_over_later_drop() {
        let (promise, settler, rx) = channel();
        assert!(settler.timed_out(Duration::from_millis(5)));
        drop(promise);
        assert_eq!(
            rx.await.unwrap(),
            Err(ProcedureFault::TimedOut(Duration::from_millis(5)))
        );
    }

    #[tokio::test]
    async fn test_drop_reports_abandoned() {
        let (promise, _settler, rx) = channel();
        drop(promise);
        assert_eq!(rx.await.unwrap(), Err(ProcedureFault::Abandoned));
    }

    #[tokio::test]
    async fn test_late_completion_is_noop() {
        let (promise, _settler, rx) = channel();
        drop(rx);
        assert!(promise.is_closed());
        assert!(!promise.complete(Status::up()));
    }

    #[tokio::test]
    async fn test_fail_carries_cause() {
        let (promise, _settler, rx) = channel();
        assert!(promise.fail("connection refused"));
        assert_eq!(
            rx.await.unwrap(),
            Err(ProcedureFault::Failed("connection refused".into()))
        );
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
