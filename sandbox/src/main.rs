// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod args;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use spool_agents::PreloadAgent;
use spool_core::{AssetRegistry, PreloadConfig, PreloadEvent, Transport};
use spool_infra::{FsTransport, HttpTransport, ObjectUrlStore};
use spool_telemetry::MetricsRegistry;
use std::sync::Arc;

fn transport(args: &Args) -> Result<Arc<dyn Transport>> {
    Ok(match &args.base_url {
        Some(url) => {
            log::info!("Fetching assets from {url}");
            Arc::new(HttpTransport::with_base_url(url).context("Failed to set up HTTP transport")?)
        }
        None => {
            log::info!("Reading assets from '{}'", args.root.display());
            Arc::new(FsTransport::new(&args.root))
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("reqwest", log::LevelFilter::Warn)
        .filter_module("hyper_util", log::LevelFilter::Warn)
        .init();

    let args = Args::parse();

    let registry = AssetRegistry::from_path(&args.registry)
        .with_context(|| format!("Failed to load registry '{}'", args.registry.display()))?;
    let config = match &args.config {
        Some(path) => PreloadConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration '{}'", path.display()))?,
        None => PreloadConfig::default(),
    };
    let background = config.background_group.clone();

    let store = Arc::new(ObjectUrlStore::new());
    let metrics = MetricsRegistry::new();
    let agent = PreloadAgent::with_telemetry(
        transport(&args)?,
        store.clone(),
        Arc::new(registry),
        config,
        &metrics,
    )?;

    let events = agent.events();
    let reporter = tokio::spawn(async move {
        while let Ok(event) = events.recv_async().await {
            match event {
                PreloadEvent::AssetFailed { id, error } => log::warn!("'{id}' failed: {error}"),
                PreloadEvent::GroupSettled { group, report } => log::info!(
                    "Group '{group}': {} ready, {} failed, {} cancelled",
                    report.ready(),
                    report.failed,
                    report.cancelled
                ),
                PreloadEvent::Progress(progress) => {
                    log::debug!("{:.0}% ({}/{})", progress.percent(), progress.completed, progress.total)
                }
                PreloadEvent::AssetLoaded { .. } => {}
            }
        }
    });

    agent.start();
    agent.wait_initialized().await;

    for group in &args.groups {
        agent.preload_group(group).await;
    }

    if let (true, Some(name)) = (args.wait_background, background) {
        log::info!("Waiting for background group '{name}'");
        agent.wait_for_group(&name).await;
    }

    log::info!(
        "Loaded groups: {:?} ({} object URLs, {} bytes)",
        agent.loaded_groups(),
        store.live_count(),
        store.stored_bytes()
    );
    metrics.log_summary();

    agent.dispose().await;
    drop(agent);
    if let Err(e) = reporter.await {
        log::error!("Event reporter stopped abnormally: {e}");
    }

    log::info!("{} object URLs left after disposal", store.live_count());
    Ok(())
}
