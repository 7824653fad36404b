//! `zipfetch serve` – HTTP service plus background janitor.

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use zipfetch_core::config::ZipfetchConfig;
use zipfetch_core::janitor::Janitor;
use zipfetch_core::lifecycle::ArchiveService;
use zipfetch_core::server;

pub async fn run_serve(cfg: &ZipfetchConfig) -> Result<()> {
    let svc = ArchiveService::from_config(cfg)?;
    std::fs::create_dir_all(svc.storage_dir()).with_context(|| {
        format!(
            "cannot create storage directory {}",
            svc.storage_dir().display()
        )
    })?;

    let listener = TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("cannot listen on {}", cfg.listen_addr))?;
    println!(
        "Serving on http://{} (archives in {})",
        listener.local_addr()?,
        svc.storage_dir().display()
    );

    let janitor = if cfg.janitor.enabled {
        Some(Janitor::for_dir(svc.storage_dir(), svc.locks().clone(), &cfg.janitor).spawn())
    } else {
        tracing::info!("janitor disabled by config");
        None
    };

    let served = server::serve_with_shutdown(listener, svc, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("shutdown requested");
    })
    .await;

    if let Some(janitor) = janitor {
        janitor.stop().await;
    }
    served
}
