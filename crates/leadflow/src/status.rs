// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadflow status` command implementation.
//!
//! Opens the configured database read path, runs the storage health
//! check, and prints row counts. `--json` emits structured output for
//! scripting.

use serde::Serialize;

use leadflow_config::model::LeadflowConfig;
use leadflow_core::{HealthStatus, LeadflowError, PluginAdapter, StorageAdapter};
use leadflow_storage::SqliteStorage;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub healthy: bool,
    pub database_path: String,
    pub sessions: i64,
    pub handoff_sessions: i64,
    pub leads: i64,
    pub messages: i64,
    pub active_executions: i64,
}

/// Run the `leadflow status` command.
pub async fn run_status(config: &LeadflowConfig, json: bool) -> Result<(), LeadflowError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;

    let health = storage.health_check().await?;
    let stats = storage.stats().await?;
    storage.close().await?;

    let healthy = matches!(health, HealthStatus::Healthy);
    if json {
        let response = StatusResponse {
            healthy,
            database_path: config.storage.database_path.clone(),
            sessions: stats.sessions,
            handoff_sessions: stats.handoff_sessions,
            leads: stats.leads,
            messages: stats.messages,
            active_executions: stats.active_executions,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("leadflow status");
        println!("  database:          {}", config.storage.database_path);
        println!("  storage:           {}", if healthy { "healthy" } else { "unhealthy" });
        println!("  sessions:          {}", stats.sessions);
        println!("  in handoff:        {}", stats.handoff_sessions);
        println!("  leads:             {}", stats.leads);
        println!("  messages logged:   {}", stats.messages);
        println!("  active executions: {}", stats.active_executions);
    }

    Ok(())
}
