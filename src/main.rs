use std::time::Duration;

use axum::{
    Router,
    http::{Request, Response},
};
use chess_insight::{config::Config, state::AppState};
use tokio::sync::watch;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vise_exporter::MetricsExporter;

/// Wraps the API router in one span per request with start, finish and
/// failure events.
fn with_request_tracing(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<_>| {
                tracing::info_span!("request", method = %req.method(), uri = %req.uri())
            })
            .on_request(|_req: &Request<_>, _span: &Span| {
                tracing::debug!("Request received");
            })
            .on_response(|res: &Response<_>, latency: Duration, _span: &Span| {
                tracing::info!(status = %res.status(), took_ms = latency.as_millis(), "Request done");
            })
            .on_failure(
                |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                    tracing::error!(%error, took_ms = latency.as_millis(), "Request failed");
                },
            ),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        app = %config.app_name,
        environment = %config.environment,
        engine = ?config.engine_backend,
        "Loaded configuration"
    );

    let app = with_request_tracing(AppState::new(config.clone())?.into_router());

    // metrics are served until the API server stops
    let (stop_metrics, mut metrics_stopped) = watch::channel(());
    let exporter = MetricsExporter::default().with_graceful_shutdown(async move {
        metrics_stopped.changed().await.ok();
    });
    tokio::spawn(exporter.start(config.metrics_address.parse()?));
    tracing::info!("Metrics exported on {}", config.metrics_address);

    let listener = tokio::net::TcpListener::bind(&config.app_address).await?;
    tracing::info!("♟️ {} listening on {}", config.app_name, config.app_address);

    axum::serve(listener, app).await?;

    stop_metrics.send_replace(());

    Ok(())
}
