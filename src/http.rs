#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use actix_web::{get, web, App, HttpResponse, HttpServer};
use anyhow::Result as AnyResult;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::domain::{AppState, CpuLoadParams, MemoryLoadParams};
use crate::metrics::Metrics;
use crate::service::LoadRunner;
use crate::shutdown::ShutdownSignal;
use crate::validation::{normalize_cpu, normalize_memory};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[get("/")]
pub async fn home() -> HttpResponse {
    text("Autoscaling Demo App is running!".to_string())
}

#[get("/healthz")]
pub async fn healthz(data: web::Data<AppState>) -> HttpResponse {
    if data.runner.is_shutting_down() {
        HttpResponse::ServiceUnavailable().json(json!({"status":"shutting_down"}))
    } else {
        HttpResponse::Ok().json(json!({"status":"ok"}))
    }
}

#[get("/api/cpu-load")]
pub async fn generate_cpu_load(
    query: web::Query<CpuLoadParams>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let req = normalize_cpu(&query);
    let runner = data.runner.clone();
    // the run blocks for its whole duration, keep it off the async worker
    match web::block(move || runner.run_cpu(req)).await {
        Ok(body) => text(body),
        Err(e) => {
            error!(error = %e, "cpu load worker failed");
            HttpResponse::InternalServerError().content_type(TEXT_PLAIN).body("CPU load worker failed")
        }
    }
}

#[get("/api/memory-load")]
pub async fn generate_memory_load(
    query: web::Query<MemoryLoadParams>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let runner = data.runner.clone();
    let req = normalize_memory(&query, runner.settings().ceiling_mb);
    if i64::from(req.size_mb) < query.size_in_mb {
        warn!(requested_mb = query.size_in_mb, size_mb = req.size_mb, "sizeInMB clamped to ceiling");
    }
    match web::block(move || runner.run_memory(req)).await {
        Ok(body) => text(body),
        Err(e) => {
            error!(error = %e, "memory load worker failed");
            HttpResponse::InternalServerError().content_type(TEXT_PLAIN).body("Memory load worker failed")
        }
    }
}

#[get("/metrics")]
pub async fn scrape_metrics(data: web::Data<AppState>) -> HttpResponse {
    match data.metrics.encode_text() {
        Ok(buf) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buf),
        Err(e) => {
            error!(error=%format!("{e:#}"), "encode metrics failed");
            HttpResponse::InternalServerError().body("encode metrics failed")
        }
    }
}

/// Registers every endpoint; shared by [`serve`] and the tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(healthz)
        .service(generate_cpu_load)
        .service(generate_memory_load)
        .service(scrape_metrics);
}

pub fn build_state(cfg: &AppConfig, shutdown: ShutdownSignal) -> AnyResult<AppState> {
    let metrics = Metrics::new()?;
    let runner = LoadRunner::new(shutdown, metrics.clone(), cfg.memory_settings());
    Ok(AppState { runner, metrics })
}

/// Serves until SIGTERM/SIGINT. The shutdown signal is triggered before the
/// server starts draining so in-flight loads wind down within the grace
/// period.
pub async fn serve(cfg: AppConfig) -> std::io::Result<()> {
    let shutdown = ShutdownSignal::new();
    let state = build_state(&cfg, shutdown.clone()).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::Other, format!("state init: {e:#}"))
    })?;
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes)
    })
    .bind(cfg.bind.as_str())?
    .shutdown_timeout(cfg.shutdown_grace_secs)
    .disable_signals()
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        wait_for_termination().await;
        if shutdown.trigger() {
            info!("marked load generators for shutdown");
        }
        handle.stop(true).await;
        info!("http server stopped");
    });
    server.await
}

async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("received SIGTERM, starting graceful shutdown"),
                    _ = tokio::signal::ctrl_c() => info!("received SIGINT, starting graceful shutdown"),
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable, waiting for SIGINT only");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "SIGINT handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
        info!("received ctrl-c, starting graceful shutdown");
    }
}

fn text(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(TEXT_PLAIN).body(body)
}
