//! Tollgate gateway entry point.
//!
//! Loads configuration, wires the PDP client and store, then serves the gated
//! API and the metrics listener until ctrl-c.
use anyhow::Context;
use gateway::app::{SERVICE_NAME, build_router, build_state};
use gateway::config::GatewayConfig;
use gateway::observability;
use std::future::Future;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env_or_yaml().context("load gateway config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: GatewayConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability(SERVICE_NAME);
    let state = build_state(&config)?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    let addr = listener.local_addr()?;

    let upkeep_task = observability::spawn_metrics_upkeep(
        metrics_handle.clone(),
        observability::METRICS_UPKEEP_INTERVAL,
    );
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);
    tracing::info!(%addr, metrics = %config.metrics_bind, "tollgate gateway listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("tollgate gateway stopped");
    metrics_task.abort();
    upkeep_task.abort();
    let _ = metrics_task.await;
    let _ = upkeep_task.await;
    Ok(())
}
