// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrative commands: handoff listing and reset, lead status
//! edits, and execution lifecycle control.
//!
//! These operate directly on storage. `set-status` also fires the
//! automation trigger so flows react to manual edits exactly as they
//! do to scheduled ones.

use std::sync::Arc;

use leadflow_automation::{FlowTrigger, TomlFlowProvider};
use leadflow_config::model::LeadflowConfig;
use leadflow_core::types::ExecutionStatus;
use leadflow_core::{FlowProvider, LeadflowError, StorageAdapter};
use leadflow_storage::SqliteStorage;

async fn open_storage(config: &LeadflowConfig) -> Result<Arc<SqliteStorage>, LeadflowError> {
    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    Ok(storage)
}

/// List all sessions currently parked in human handoff.
pub async fn run_handoffs(config: &LeadflowConfig) -> Result<(), LeadflowError> {
    let storage = open_storage(config).await?;
    let sessions = storage.list_sessions(Some("human_handoff")).await?;
    storage.close().await?;

    if sessions.is_empty() {
        println!("no sessions in human handoff");
        return Ok(());
    }
    println!("{} session(s) in human handoff:", sessions.len());
    for session in sessions {
        println!("  {}  (since {})", session.customer_id, session.updated_at);
    }
    Ok(())
}

/// Reset a handed-off session back to the welcome state.
pub async fn run_reset_handoff(
    config: &LeadflowConfig,
    customer_id: &str,
) -> Result<(), LeadflowError> {
    let storage = open_storage(config).await?;
    let Some(mut session) = storage.get_session(customer_id).await? else {
        storage.close().await?;
        eprintln!("no session found for {customer_id}");
        std::process::exit(1);
    };

    if session.current_state != "human_handoff" {
        println!(
            "{} is in state '{}', resetting anyway",
            customer_id, session.current_state
        );
    }
    session.current_state = "welcome".to_string();
    storage.update_session(&session).await?;
    storage.close().await?;

    println!("{customer_id} reset to welcome");
    Ok(())
}

/// Set a lead's status, creating the lead if necessary, then fire the
/// automation trigger for the new status.
pub async fn run_set_status(
    config: &LeadflowConfig,
    customer_id: &str,
    status: &str,
) -> Result<(), LeadflowError> {
    let storage = open_storage(config).await?;

    let provider: Arc<dyn FlowProvider> = match &config.flows.definitions_path {
        Some(path) => Arc::new(TomlFlowProvider::from_path(path)?),
        None => Arc::new(TomlFlowProvider::empty()),
    };
    let trigger = FlowTrigger::new(
        storage.clone(),
        provider,
        config.scheduler.max_chain_depth,
    );

    let existed = storage.get_lead(customer_id).await?.is_some();
    trigger.apply_status(customer_id, status).await?;
    if existed {
        println!("updated lead {customer_id} to status '{status}'");
    } else {
        println!("created lead {customer_id} with status '{status}'");
    }

    storage.close().await?;
    Ok(())
}

/// Execution lifecycle subcommands.
pub enum ExecutionAction {
    List { customer_id: String },
    Pause { id: String },
    Resume { id: String },
    Cancel { id: String },
}

pub async fn run_executions(
    config: &LeadflowConfig,
    action: ExecutionAction,
) -> Result<(), LeadflowError> {
    let storage = open_storage(config).await?;
    let result = apply_execution_action(storage.as_ref(), action).await;
    storage.close().await?;
    result
}

async fn apply_execution_action(
    storage: &dyn StorageAdapter,
    action: ExecutionAction,
) -> Result<(), LeadflowError> {
    match action {
        ExecutionAction::List { customer_id } => {
            let executions = storage.list_executions(&customer_id).await?;
            if executions.is_empty() {
                println!("no executions for {customer_id}");
                return Ok(());
            }
            for e in executions {
                println!(
                    "  {}  flow={}  step={}  status={}  next_run={}",
                    e.id, e.flow_id, e.current_step, e.status, e.next_run_at
                );
            }
            Ok(())
        }
        ExecutionAction::Pause { id } => {
            transition_execution(storage, &id, "active", ExecutionStatus::Paused).await
        }
        ExecutionAction::Resume { id } => {
            transition_execution(storage, &id, "paused", ExecutionStatus::Active).await
        }
        ExecutionAction::Cancel { id } => {
            // Cancellation is a terminal completion at the current cursor.
            transition_execution(storage, &id, "active", ExecutionStatus::Completed).await
        }
    }
}

async fn transition_execution(
    storage: &dyn StorageAdapter,
    id: &str,
    expected: &str,
    target: ExecutionStatus,
) -> Result<(), LeadflowError> {
    let Some(execution) = storage.get_execution(id).await? else {
        eprintln!("no execution with id {id}");
        std::process::exit(1);
    };
    if execution.status != expected {
        eprintln!(
            "execution {id} is '{}', expected '{expected}'",
            execution.status
        );
        std::process::exit(1);
    }
    storage.set_execution_status(id, target, None).await?;
    println!("execution {id}: {expected} -> {target}");
    Ok(())
}
