use anyhow::Result;
use ids_core::{health_router, init_tracing, load_config, mark_ready};
use ids_inference::api::{router, AppState};
use ids_inference::{ArtifactStore, InferenceEngine, ServiceConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg: ServiceConfig = load_config("ids-inference")?;
    init_tracing(&cfg.service_name, &cfg.log_level)?;
    info!(?cfg, "config loaded");

    let store = Arc::new(ArtifactStore::new(cfg.artifacts.clone()));
    let engine = Arc::new(InferenceEngine::with_threshold(store.clone(), cfg.decision_threshold));

    if cfg.preload {
        let warm = store.clone();
        match tokio::task::spawn_blocking(move || warm.latest()).await? {
            Ok(bundle) => info!(version = %bundle.version(), "artifacts preloaded"),
            // keep serving un-ready: the first successful request load flips readiness
            Err(e) => error!(error = %e, root = %cfg.artifacts.root.display(), "artifact preload failed"),
        }
    } else {
        mark_ready();
    }

    let app = router(AppState { engine }).merge(health_router());
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    info!(addr = %cfg.listen_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await?;
    info!("shutdown");
    Ok(())
}
