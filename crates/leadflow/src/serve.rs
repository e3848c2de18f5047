// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadflow serve` command implementation.
//!
//! Wires storage, channel, notifier, flow provider, and scheduler, then
//! runs until SIGTERM or SIGINT. No real messaging transport is
//! bundled: the log-only channel has no inbound side, so serve runs the
//! automation pipeline only. A real channel adapter would additionally
//! construct a `FunnelEngine` with the trigger as its status hook and
//! feed inbound events through it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use leadflow_automation::{FlowScheduler, FlowTrigger, TomlFlowProvider};
use leadflow_config::model::LeadflowConfig;
use leadflow_core::{FlowProvider, LeadflowError, StorageAdapter};
use leadflow_storage::SqliteStorage;

use crate::adapters::LogChannel;

/// Runs the `leadflow serve` command.
pub async fn run_serve(config: LeadflowConfig) -> Result<(), LeadflowError> {
    init_tracing(&config.bot.log_level);

    info!(bot = %config.bot.name, "starting leadflow serve");

    let storage: Arc<dyn StorageAdapter> = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };

    let channel = Arc::new(LogChannel);

    let provider: Arc<dyn FlowProvider> = match &config.flows.definitions_path {
        Some(path) => {
            let provider = TomlFlowProvider::from_path(path)?;
            if provider.is_empty() {
                warn!(path, "flow definitions file contains no flows");
            }
            Arc::new(provider)
        }
        None => {
            info!("no flow definitions configured, automation idle");
            Arc::new(TomlFlowProvider::empty())
        }
    };

    let trigger = Arc::new(FlowTrigger::new(
        storage.clone(),
        provider.clone(),
        config.scheduler.max_chain_depth,
    ));

    let scheduler = FlowScheduler::new(
        storage.clone(),
        provider,
        channel,
        trigger,
        config.scheduler.clone(),
    );

    let cancel = install_signal_handler();
    scheduler.run(cancel).await;

    storage.close().await?;
    info!("leadflow serve shutdown complete");
    Ok(())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leadflow={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
