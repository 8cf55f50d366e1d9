//! Core shared utilities for the Cyber IDS services.

use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod metrics;
pub use metrics::{encode_metrics, IdsMetrics, IDS_METRICS};

static TRACING_INIT: OnceCell<()> = OnceCell::new();
static NODE_READINESS: AtomicBool = AtomicBool::new(false);

pub fn mark_ready() { NODE_READINESS.store(true, Ordering::SeqCst); }
pub fn clear_ready() { NODE_READINESS.store(false, Ordering::SeqCst); }
pub fn is_ready() -> bool { NODE_READINESS.load(Ordering::SeqCst) }

/// Filter used when `RUST_LOG` is unset, from the configured `log_level`.
pub fn fallback_filter(level: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::try_new(level)?)
}

/// Install the global subscriber. `RUST_LOG` drives filtering and falls back to
/// `default_level`; `IDS_JSON_LOG=1` switches to flattened JSON lines. Safe to
/// call more than once.
pub fn init_tracing(service: &str, default_level: &str) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| -> Result<()> {
        let json = std::env::var("IDS_JSON_LOG").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(f) => f,
            Err(_) => fallback_filter(default_level)?,
        };
        let registry = tracing_subscriber::registry().with(env_filter);
        if json {
            registry
                .with(tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false))
                .try_init()?;
        } else {
            registry
                .with(tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(true))
                .try_init()?;
        }
        Ok(())
    })?;
    info!(target: "ids_core", service, "tracing initialized");
    Ok(())
}

/// Layered settings: built-in defaults, then the optional file named by
/// `IDS_CONFIG_FILE`, then `IDS__SECTION__KEY` environment variables.
pub fn load_config<T: DeserializeOwned>(service: &str) -> Result<T> {
    let mut builder = config::Config::builder()
        .set_default("service_name", service)?
        .set_default("log_level", "info")?;
    if let Ok(file) = std::env::var("IDS_CONFIG_FILE") {
        builder = builder.add_source(config::File::with_name(&file).required(false));
    }
    builder = builder.add_source(
        config::Environment::with_prefix("IDS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = builder.build()?;
    Ok(cfg.try_deserialize()?)
}

pub async fn live_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"live": true}))
}

pub async fn ready_handler() -> (StatusCode, Json<serde_json::Value>) {
    let ready = is_ready();
    let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(serde_json::json!({"ready": ready})))
}

pub async fn metrics_handler() -> axum::response::Response {
    match encode_metrics() {
        Ok(text) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], text).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("encode error: {e}")).into_response(),
    }
}

/// `/live`, `/ready` and `/metrics`; services merge this into their own router.
pub fn health_router() -> Router {
    Router::new()
        .route("/live", get(live_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Minimal { service_name: String, log_level: String }

    #[test]
    fn defaults_fill_config() {
        let cfg: Minimal = load_config("ids-core-test").unwrap();
        assert_eq!(cfg.service_name, "ids-core-test");
        assert!(!cfg.log_level.is_empty());
    }

    #[test]
    fn configured_level_bounds_fallback_filter() {
        use tracing_subscriber::filter::LevelFilter;
        assert_eq!(fallback_filter("warn").unwrap().max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(fallback_filter("debug").unwrap().max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[tokio::test]
    async fn readiness_follows_flag() {
        clear_ready();
        let (status, _) = ready_handler().await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        mark_ready();
        let (status, Json(body)) = ready_handler().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
        clear_ready();
    }
}
