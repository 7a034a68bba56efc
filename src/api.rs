use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use prometheus::{Encoder, TextEncoder};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;

use crate::metrics::MetricsRegistry;

pub const METRICS_PATH: &str = "/metrics";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind metrics listener on `{addr}`: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("metrics server failed: {0}")]
    Serve(#[source] std::io::Error),
}

type Result<T> = std::result::Result<T, Error>;

async fn render_metrics<R>(State(registry): State<Arc<R>>) -> Response
where
    R: MetricsRegistry + ?Sized + 'static,
{
    let encoder = TextEncoder::new();
    let families = registry.gather();
    let mut buffer = Vec::new();
    match encoder.encode(&families, &mut buffer) {
        Ok(()) => (
            [(header::CONTENT_TYPE, encoder.format_type().to_owned())],
            buffer,
        )
            .into_response(),
        Err(err) => {
            log::error!("Failed to encode metrics: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {err}"),
            )
                .into_response()
        }
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();
    let response = next.run(request).await;
    log::info!(
        "{} {} {} {}us",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_micros()
    );
    response
}

/// HTTP server exposing a registry at [`METRICS_PATH`].
pub struct MetricsServer {
    router: axum::Router,
}

impl MetricsServer {
    pub fn new<R>(registry: Arc<R>) -> Self
    where
        R: MetricsRegistry + ?Sized + 'static,
    {
        let router = axum::Router::new()
            .route(METRICS_PATH, get(render_metrics::<R>))
            .with_state(registry)
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(log_request))
                    .layer(CompressionLayer::new()),
            );
        Self { router }
    }

    /// Serves until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if `addr` cannot be bound and [`Error::Serve`] if
    /// the server stops on an I/O error.
    pub async fn listen(self, addr: &str, shutdown: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(addr).await.map_err(|source| Error::Bind {
            addr: addr.to_owned(),
            source,
        })?;
        match listener.local_addr() {
            Ok(local) => log::info!("Starting metrics server on http://{local}{METRICS_PATH}"),
            Err(_) => log::info!("Starting metrics server on http://{addr}{METRICS_PATH}"),
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(Error::Serve)
    }
}
