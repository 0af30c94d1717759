//! HTTP GET probe.

use std::time::Instant;

use axum::body::Body;
use hyper::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::checks::{Procedure, Status};
use crate::observability::millis;

/// Shared client used by all HTTP probes.
pub type ProbeClient = Client<HttpConnector, Body>;

pub fn probe_client() -> ProbeClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// UP when `GET url` answers with a 2xx status.
///
/// Non-2xx answers and connection errors are DOWN; a request that cannot
/// even be built is reported as a procedure failure.
pub fn http_probe(client: ProbeClient, url: String) -> Procedure {
    Procedure::from_async(move || {
        let client = client.clone();
        let url = url.clone();
        async move {
            let request = Request::builder()
                .method("GET")
                .uri(url.as_str())
                .header("user-agent", "health-tree-probe")
                .body(Body::empty())?;

            let started = Instant::now();
            let status = match client.request(request).await {
                Ok(response) => {
                    let code = response.status();
                    let status = if code.is_success() {
                        Status::up()
                    } else {
                        tracing::debug!(url = %url, status = %code, "HTTP probe got non-success status");
                        Status::down()
                    };
                    status
                        .with_entry("status_code", code.as_u16())
                        .with_entry("latency_ms", millis(started.elapsed()))
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "HTTP probe connection error");
                    Status::down().with_entry("error", e.to_string())
                }
            };
            Ok::<_, hyper::http::Error>(status)
        }
    })
}
