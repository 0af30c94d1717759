//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use health_tree::checks::Promise;
use health_tree::lifecycle::Shutdown;
use health_tree::{HealthChecks, HealthServer, Procedure, ServiceConfig, Status};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A running health service bound to an ephemeral local port.
#[allow(dead_code)]
pub struct TestService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the HTTP boundary for `checks`.
#[allow(dead_code)]
pub async fn start_service(config: ServiceConfig, checks: HealthChecks) -> TestService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HealthServer::new(config, checks);
    let task = tokio::spawn(server.run(listener, shutdown.listen()));
    TestService { addr, shutdown, task }
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub fn up() -> Procedure {
    Procedure::constant(Status::up())
}

#[allow(dead_code)]
pub fn down() -> Procedure {
    Procedure::constant(Status::down())
}

/// A procedure that only reports long after any test timeout.
#[allow(dead_code)]
pub fn never() -> Procedure {
    Procedure::new(|promise: Promise| async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        promise.complete(Status::up());
    })
}
