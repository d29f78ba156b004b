//! HTTP launcher route tests.

#![allow(clippy::expect_used)]

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use blinkboard_adapters::launcher::{router, Launcher, START_FAILED, STARTED};

/// Counts launches instead of spawning anything.
#[derive(Default)]
struct CountingLauncher {
    launches: AtomicU32,
    fail: bool,
}

impl CountingLauncher {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn launches(&self) -> u32 {
        self.launches.load(Ordering::SeqCst)
    }
}

impl Launcher for CountingLauncher {
    fn launch(&self) -> io::Result<u32> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such program"))
        } else {
            Ok(4242)
        }
    }
}

fn server(launcher: Arc<CountingLauncher>) -> TestServer {
    TestServer::new(router(launcher)).expect("test server")
}

#[tokio::test]
async fn test_index_serves_page() {
    let server = server(Arc::new(CountingLauncher::default()));

    let response = server.get("/").await;

    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("<button"));
    assert!(body.contains("/runcode"));
}

#[tokio::test]
async fn test_runcode_launches_once() {
    let launcher = Arc::new(CountingLauncher::default());
    let server = server(Arc::clone(&launcher));

    let response = server.post("/runcode").await;

    response.assert_status_ok();
    response.assert_text(STARTED);
    assert_eq!(launcher.launches(), 1);
}

#[tokio::test]
async fn test_each_request_launches_again() {
    let launcher = Arc::new(CountingLauncher::default());
    let server = server(Arc::clone(&launcher));

    server.post("/runcode").await.assert_status_ok();
    server.post("/runcode").await.assert_status_ok();

    assert_eq!(launcher.launches(), 2);
}

#[tokio::test]
async fn test_runcode_reports_spawn_failure() {
    let launcher = Arc::new(CountingLauncher::failing());
    let server = server(Arc::clone(&launcher));

    let response = server.post("/runcode").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_text(START_FAILED);
    assert_eq!(launcher.launches(), 1);
}

#[tokio::test]
async fn test_runcode_rejects_get() {
    let launcher = Arc::new(CountingLauncher::default());
    let server = server(Arc::clone(&launcher));

    let response = server.get("/runcode").expect_failure().await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(launcher.launches(), 0);
}
