use std::net::SocketAddr;

use axum::{Router, routing::get, response::Html};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use helio_tilt::api_docs::ApiDoc;
use helio_tilt::config::Config;
use helio_tilt::routes::analysis_routes::api_routes;
use helio_tilt::shared_state::AppState;

#[cfg(feature = "verbose_log")]
const DEFAULT_LOG_LEVEL: tracing::Level = tracing::Level::DEBUG;
#[cfg(not(feature = "verbose_log"))]
const DEFAULT_LOG_LEVEL: tracing::Level = tracing::Level::INFO;

/// `RUST_LOG` directives win; the default level applies only when none are given.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(DEFAULT_LOG_LEVEL).into())
        .parse_lossy(directives)
}

#[tokio::main]
async fn main() {
    // 1. Logging
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .init();

    // 2. Load configuration
    let config_path = Config::path_from_env();
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load {}: {}", config_path, e);
            return;
        }
    };
    tracing::info!(
        policy = ?config.analysis.zero_irradiance_policy,
        parallel = config.analysis.parallel,
        timeout_secs = config.analysis.timeout_secs,
        "Configuration loaded from {}", config_path
    );

    // 3. Shared state
    let server_port = config.server.port;
    let static_dir = config.server.static_dir.clone();
    let state = AppState::new(config);

    // 4. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    tracing::info!("API Server listening on http://{}", addr);
    tracing::info!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!("HTTP server error: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_when_unset() {
        assert_eq!(log_filter("").max_level_hint(), Some(LevelFilter::from_level(DEFAULT_LOG_LEVEL)));
    }

    #[test]
    fn test_log_filter_env_level_overrides_default() {
        assert_eq!(log_filter("trace").max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(log_filter("warn").max_level_hint(), Some(LevelFilter::WARN));
    }
}
