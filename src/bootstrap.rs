// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Runner entry point

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};

use crate::{
    BackfillMode, BlockvaultConfig, DiskStore, ExplorerService, RpcLedgerSource,
    ServiceOptions, SubscriptionHandle,
};

/// Main entry point for the application.
pub async fn run() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = BlockvaultConfig::from_env().context("invalid configuration")?;
    info!(
        url = %config.source.url,
        store = %config.store_path.display(),
        mode = %config.mode,
        "Starting blockvault"
    );

    let store = DiskStore::open(&config.store_path)
        .await
        .with_context(|| format!("failed to open store at {}", config.store_path.display()))?;
    let source = RpcLedgerSource::new(config.source.clone())?;

    let service = ExplorerService::with_options(
        Arc::new(source),
        Arc::new(store),
        ServiceOptions::from(&config),
    );

    match config.mode {
        BackfillMode::Once => {
            let summary = service.trigger_one_shot_backfill().await?;
            info!(%summary, stats = %service.store_stats().await, "Backfill finished");
        }
        BackfillMode::Live => {
            let handle = service.start_live().await?;
            run_until_shutdown(handle).await;
        }
        BackfillMode::Continuous => {
            let handle = service.trigger_continuous_backfill().await?;
            run_until_shutdown(handle).await;
        }
    }

    Ok(())
}

/// Waits for Ctrl-C or for the subscription to end on its own
async fn run_until_shutdown(mut handle: SubscriptionHandle) {
    let interrupted = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            true
        }
        result = handle.wait() => {
            if let Err(e) = result {
                warn!(error = %e, "Head subscription task failed");
            }
            false
        }
    };

    if interrupted {
        info!("Shutting down");
        handle.shutdown().await;
    } else {
        warn!("Head subscription ended unexpectedly");
    }
}
