use crate::exporter::Exporter;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

struct AppState {
    exporter: Arc<Exporter>,
    web_path: String,
}

pub fn router(exporter: Arc<Exporter>, web_path: &str) -> Router {
    let state = Arc::new(AppState {
        exporter,
        web_path: web_path.to_string(),
    });

    let mut router = Router::new()
        .route(web_path, get(metrics_handler))
        .route("/healthz", get(health_handler))
        .route("/readyz", get(health_handler));
    if web_path != "/" {
        router = router.route("/", get(index_handler));
    }
    router.with_state(state)
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    match state.exporter.gather().await {
        Ok(body) => {
            debug!(elapsed_ms = started.elapsed().as_millis() as u64, "scrape finished");
            ([(CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to gather metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>Entity Exporter</title></head>\n<body>\n\
         <h1>Entity Exporter</h1>\n<p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n</html>\n",
        path = state.web_path
    ))
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, router: Router) -> anyhow::Result<()> {
    info!(address = %listener.local_addr()?, "listening for scrapes");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
