//! Rebuild the output whenever the markdown tree changes.

use crate::commands::build::{build_site, build_with_config};
use crate::scheduler::RenderScheduler;
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use plog_core::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn watch_site(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;
    let docs_dir = config.docs_dir();
    let ignored = vec![config.output_dir(), config.assets_dir()];

    let scheduler = Arc::new(RenderScheduler::new());
    let config_path = config_path.to_path_buf();

    // Initial render uses the already loaded config; a failure here is fatal.
    let summary = tokio::task::spawn_blocking({
        let scheduler = scheduler.clone();
        move || {
            let mut result = None;
            scheduler.run(|| result = Some(build_with_config(&config)));
            result
        }
    })
    .await
    .context("Initial render task panicked")?;
    if let Some(summary) = summary.transpose()? {
        tracing::info!(
            "Rendered {} documents, watching {:?} (Ctrl+C to stop)",
            summary.documents,
            docs_dir
        );
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut _watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize file watcher")?;

    _watcher
        .watch(&docs_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {:?}", docs_dir))?;

    while let Some(event) = rx.recv().await {
        match event {
            Ok(ev) => {
                if !is_relevant(&ev, &ignored) {
                    continue;
                }
                tracing::debug!("Change detected: {:?} {:?}", ev.kind, ev.paths);
                tokio::task::spawn_blocking({
                    let scheduler = scheduler.clone();
                    let config_path = config_path.clone();
                    move || scheduler.run(|| rerender(&config_path))
                });
            }
            Err(err) => tracing::warn!("Watcher error: {}", err),
        }
    }

    Ok(())
}

fn rerender(config_path: &Path) {
    tracing::info!("Change detected, rendering documents...");
    match build_site(config_path) {
        Ok(summary) => tracing::info!("Render complete: {} documents", summary.documents),
        Err(e) => tracing::error!("Render failed: {:?}", e),
    }
}

/// Access events and changes confined to generated directories never
/// trigger a render.
fn is_relevant(event: &Event, ignored: &[PathBuf]) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| !ignored.iter().any(|dir| path.starts_with(dir)))
}
