//! Graceful shutdown over a real listener.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, oneshot};
use tokio_util::sync::CancellationToken;

use warehouse_api::serve;

/// A route that takes `work` to finish unless `shutdown` is cancelled first.
fn slow_app(shutdown: CancellationToken, started: Arc<Notify>, work: Duration) -> Router {
    Router::new().route(
        "/slow",
        get(move || {
            let cancel = shutdown.child_token();
            let started = started.clone();
            async move {
                started.notify_one();
                tokio::select! {
                    _ = tokio::time::sleep(work) => StatusCode::OK,
                    _ = cancel.cancelled() => StatusCode::SERVICE_UNAVAILABLE,
                }
            }
        }),
    )
}

async fn get_slow(addr: std::net::SocketAddr) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /slow HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn start(
    work: Duration,
    grace: Duration,
) -> (
    std::net::SocketAddr,
    Arc<Notify>,
    oneshot::Sender<()>,
    CancellationToken,
    tokio::task::JoinHandle<std::io::Result<()>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let started = Arc::new(Notify::new());
    let app = slow_app(shutdown.clone(), started.clone(), work);

    let (tx, rx) = oneshot::channel::<()>();
    let signal = async move {
        let _ = rx.await;
    };
    let server = tokio::spawn(serve(listener, app, signal, shutdown.clone(), grace));
    (addr, started, tx, shutdown, server)
}

#[tokio::test]
async fn test_in_flight_request_finishes_after_signal() {
    let (addr, started, tx, shutdown, server) =
        start(Duration::from_millis(200), Duration::from_secs(5)).await;

    let client = tokio::spawn(get_slow(addr));
    started.notified().await;
    tx.send(()).unwrap();

    let response = client.await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");

    server.await.unwrap().unwrap();
    assert!(shutdown.is_cancelled());
}

#[tokio::test]
async fn test_request_outliving_grace_is_cancelled() {
    let (addr, started, tx, shutdown, server) =
        start(Duration::from_secs(30), Duration::from_millis(100)).await;

    let client = tokio::spawn(get_slow(addr));
    started.notified().await;
    assert!(!shutdown.is_cancelled());
    tx.send(()).unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after the grace period");
    finished.unwrap().unwrap();
    assert!(shutdown.is_cancelled());
    client.abort();
}
