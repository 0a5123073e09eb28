//! Application builder: wires router, middleware, and state into an Axum app.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tower_http::timeout::TimeoutLayer;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use warehouse_core::config::app::ServerConfig;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::middleware::request_id::{propagate_request_id_layer, set_request_id_layer};
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
///
/// Layers run outermost first: request id, tracing, logging, CORS, then
/// the request deadline.
pub fn build_app(state: AppState, server: &ServerConfig) -> Router {
    build_router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(build_cors_layer(&server.cors))
        .layer(axum_middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}

/// Serves `app` until `signal` resolves, then drains.
///
/// Once `signal` fires the listener stops accepting and in-flight
/// requests keep running. `shutdown` is cancelled only when the drain
/// finishes or `grace` elapses, whichever comes first, so work still
/// running past the grace period is interrupted rather than awaited.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    shutdown: CancellationToken,
    grace: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let draining = CancellationToken::new();
    let stop_accepting = draining.clone();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            tracing::info!("Shutdown signal received, draining in-flight requests");
            stop_accepting.cancel();
        })
        .into_future();

    let deadline = {
        let shutdown = shutdown.clone();
        async move {
            draining.cancelled().await;
            tokio::time::sleep(grace).await;
            tracing::warn!(
                "In-flight requests did not finish within {}s, cancelling",
                grace.as_secs()
            );
            shutdown.cancel();
            std::future::pending::<()>().await;
        }
    };

    let result = tokio::select! {
        result = server => result,
        _ = deadline => Ok(()),
    };
    shutdown.cancel();
    result
}
