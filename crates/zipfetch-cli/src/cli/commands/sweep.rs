//! `zipfetch sweep` – one janitor cycle, then exit.

use anyhow::{Context, Result};
use zipfetch_core::config::ZipfetchConfig;
use zipfetch_core::janitor::Janitor;
use zipfetch_core::lifecycle::ArchiveLocks;

pub async fn run_sweep(cfg: &ZipfetchConfig) -> Result<()> {
    let dir = cfg.resolved_storage_dir()?;
    let janitor = Janitor::for_dir(dir.clone(), ArchiveLocks::new(), &cfg.janitor);
    let report = tokio::task::spawn_blocking(move || janitor.sweep_once())
        .await
        .context("sweep task failed")?;

    if report.removed.is_empty() {
        println!("No stale archives in {}.", dir.display());
    } else {
        for name in &report.removed {
            println!("removed {}", name);
        }
    }
    for err in &report.errors {
        eprintln!("error: {}", err);
    }
    Ok(())
}
