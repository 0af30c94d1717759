//! Bounded execution of a single procedure.
//!
//! # Responsibilities
//! - Dispatch the procedure onto its own task
//! - Race its completion against the per-node timeout
//! - Convert failures, panics, abandoned promises and timeouts into a DOWN
//!   status carrying the execution-failure flag
//!
//! # Design Decisions
//! - The procedure task is bounded by the same timeout: when it elapses the
//!   task settles `TimedOut` and drops the procedure future, even if the
//!   caller has already gone away
//! - Nothing raised by a procedure reaches the caller

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;

use crate::checks::error::ProcedureFault;
use crate::checks::procedure::Procedure;
use crate::checks::promise::{self, panic_message};
use crate::checks::status::Status;
use crate::observability::{self, metrics};

/// Run `procedure`, waiting at most `timeout` for it to report.
pub async fn run(procedure: &Procedure, timeout: Duration) -> Status {
    let started = Instant::now();
    let (promise, settler, rx) = promise::channel();

    let procedure = procedure.clone();
    tokio::spawn(async move {
        let call = AssertUnwindSafe(async move { procedure.call(promise).await }).catch_unwind();
        tokio::pin!(call);
        match tokio::time::timeout(timeout, &mut call).await {
            Ok(Ok(())) => {}
            Ok(Err(payload)) => {
                settler.panicked(panic_message(payload.as_ref()));
            }
            // Settle before `call` (and the promise inside it) is dropped.
            Err(_) => {
                settler.timed_out(timeout);
            }
        }
    });

    let completion = match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(completion)) => completion,
        Ok(Err(_)) => Err(ProcedureFault::Abandoned),
        Err(_) => Err(ProcedureFault::TimedOut(timeout)),
    };

    match completion {
        Ok(status) => {
            metrics::record_procedure(started, None);
            status
        }
        Err(fault) => {
            tracing::warn!(
                fault = fault.as_label(),
                error = %fault,
                elapsed_ms = observability::millis(started.elapsed()),
                "Health procedure did not report a status"
            );
            metrics::record_procedure(started, Some(&fault));
            Status::failure(&fault)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::promise::Promise;
    use crate::checks::status::{CAUSE, EXECUTION_FAILURE};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn cause(status: &Status) -> String {
        status.data().unwrap()[CAUSE].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_reported_status_is_returned_verbatim() {
        let procedure = Procedure::constant(Status::down().with_entry("reason", "disk full"));
        let status = run(&procedure, Duration::from_secs(1)).await;
        assert!(!status.is_up());
        assert!(!status.is_execution_failure());
        assert_eq!(status.data().unwrap()["reason"], "disk full");
    }

    #[tokio::test]
    async fn test_timeout_produces_failure() {
        let procedure = Procedure::new(|promise: Promise| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            promise.complete(Status::up());
        });

        let started = Instant::now();
        let status = run(&procedure, Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!status.is_up());
        assert_eq!(status.data().unwrap()[EXECUTION_FAILURE], true);
        assert!(cause(&status).contains("timed out"));
    }

    #[tokio::test]
    async fn test_straggler_never_reports() {
        let delivered = Arc::new(AtomicBool::new(false));
        let flag = delivered.clone();
        let procedure = Procedure::new(move |promise: Promise| {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                flag.store(promise.complete(Status::up()), Ordering::SeqCst);
            }
        });

        let status = run(&procedure, Duration::from_millis(20)).await;
        assert!(status.is_execution_failure());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!delivered.load(Ordering::SeqCst), "late report must be a no-op");
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn hanging(dropped: &Arc<AtomicBool>) -> Procedure {
        let dropped = dropped.clone();
        Procedure::new(move |promise: Promise| {
            let flag = DropFlag(dropped.clone());
            async move {
                let _flag = flag;
                let _held = promise;
                std::future::pending::<()>().await;
            }
        })
    }

    #[tokio::test]
    async fn test_hanging_task_stops_at_its_timeout() {
        let dropped = Arc::new(AtomicBool::new(false));

        let status = run(&hanging(&dropped), Duration::from_millis(50)).await;
        assert!(status.is_execution_failure());
        assert!(cause(&status).contains("timed out"), "got {}", cause(&status));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(dropped.load(Ordering::SeqCst), "procedure task outlived its timeout");
    }

    #[tokio::test]
    async fn test_hanging_task_stops_when_caller_goes_away() {
        let dropped = Arc::new(AtomicBool::new(false));
        let procedure = hanging(&dropped);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), run(&procedure, Duration::from_millis(50)))
                .await;
        assert!(abandoned.is_err());
        assert!(!dropped.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(dropped.load(Ordering::SeqCst), "procedure task outlived its timeout");
    }

    #[tokio::test]
    async fn test_error_is_a_procedure_failure() {
        let procedure = Procedure::from_async(|| async { Err::<Status, _>("connection refused") });
        let status = run(&procedure, Duration::from_secs(1)).await;
        assert!(status.is_execution_failure());
        assert!(cause(&status).contains("connection refused"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let procedure = Procedure::new(|promise: Promise| async move {
            let _held = promise;
            panic!("probe exploded");
        });
        let status = run(&procedure, Duration::from_secs(1)).await;
        assert!(status.is_execution_failure());
        assert!(cause(&status).contains("probe exploded"));
    }

    #[tokio::test]
    async fn test_panic_before_first_poll_is_contained() {
        let procedure = Procedure::new(|promise: Promise| -> std::future::Ready<()> {
            let _held = promise;
            panic!("construction exploded");
        });
        let status = run(&procedure, Duration::from_secs(1)).await;
        assert!(status.is_execution_failure());
        assert!(cause(&status).contains("construction exploded"));
    }

    #[tokio::test]
    async fn test_dropped_promise_is_abandoned() {
        let procedure = Procedure::new(|promise: Promise| async move {
            drop(promise);
        });
        let status = run(&procedure, Duration::from_secs(1)).await;
        assert!(status.is_execution_failure());
        assert!(cause(&status).contains("without reporting"));
    }

    #[tokio::test]
    async fn test_blocking_procedure() {
        let procedure = Procedure::blocking(|| {
            std::thread::sleep(Duration::from_millis(10));
            Ok::<_, String>(Status::up())
        });
        let status = run(&procedure, Duration::from_secs(1)).await;
        assert!(status.is_up());
    }

    #[tokio::test]
    async fn test_blocking_panic_is_contained() {
        let procedure = Procedure::blocking(|| -> Result<Status, String> {
            panic!("blocking probe exploded")
        });
        let status = run(&procedure, Duration::from_secs(1)).await;
        assert!(status.is_execution_failure());
        assert!(cause(&status).contains("blocking probe exploded"));
    }
}
