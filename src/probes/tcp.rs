//! TCP connect probe.

use std::time::Instant;

use tokio::net::TcpStream;

use crate::checks::{Procedure, Status};
use crate::observability::millis;

/// UP when a TCP connection to `target` (`host:port`) can be opened.
///
/// A refused or unreachable target is a legitimate DOWN, not a procedure
/// failure; a hanging connect is left to the executor's timeout.
pub fn tcp_probe(target: String) -> Procedure {
    Procedure::from_async(move || {
        let target = target.clone();
        async move {
            let started = Instant::now();
            let status = match TcpStream::connect(&target).await {
                Ok(_) => Status::up()
                    .with_entry("target", target)
                    .with_entry("latency_ms", millis(started.elapsed())),
                Err(e) => {
                    tracing::debug!(target = %target, error = %e, "TCP probe failed");
                    Status::down()
                        .with_entry("target", target)
                        .with_entry("error", e.to_string())
                }
            };
            Ok::<_, std::convert::Infallible>(status)
        }
    })
}
