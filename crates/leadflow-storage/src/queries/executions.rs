// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow execution state operations.
//!
//! The scheduler's due scan relies on `next_run_at` being RFC 3339 UTC
//! text, where lexicographic order equals chronological order.

use leadflow_core::LeadflowError;
use rusqlite::params;

use crate::database::Database;
use crate::models::FlowExecution;

const EXECUTION_COLUMNS: &str =
    "id, flow_id, customer_id, current_step, next_run_at, status, created_at, updated_at";

fn row_to_execution(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlowExecution> {
    Ok(FlowExecution {
        id: row.get(0)?,
        flow_id: row.get(1)?,
        customer_id: row.get(2)?,
        current_step: row.get(3)?,
        next_run_at: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Create a new execution row.
pub async fn create_execution(
    db: &Database,
    execution: &FlowExecution,
) -> Result<(), LeadflowError> {
    let execution = execution.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO flow_executions
                     (id, flow_id, customer_id, current_step, next_run_at, status,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    execution.id,
                    execution.flow_id,
                    execution.customer_id,
                    execution.current_step,
                    execution.next_run_at,
                    execution.status,
                    execution.created_at,
                    execution.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an execution by id.
pub async fn get_execution(
    db: &Database,
    id: &str,
) -> Result<Option<FlowExecution>, LeadflowError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXECUTION_COLUMNS} FROM flow_executions WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_execution);
            match result {
                Ok(execution) => Ok(Some(execution)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The active execution for a `(flow, customer)` pair, if any.
pub async fn find_active_execution(
    db: &Database,
    flow_id: &str,
    customer_id: &str,
) -> Result<Option<FlowExecution>, LeadflowError> {
    let flow_id = flow_id.to_string();
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXECUTION_COLUMNS} FROM flow_executions
                 WHERE flow_id = ?1 AND customer_id = ?2 AND status = 'active'
                 LIMIT 1"
            ))?;
            let result = stmt.query_row(params![flow_id, customer_id], row_to_execution);
            match result {
                Ok(execution) => Ok(Some(execution)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active executions with `next_run_at <= now`, oldest due first.
pub async fn due_executions(
    db: &Database,
    now: &str,
    limit: i64,
) -> Result<Vec<FlowExecution>, LeadflowError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXECUTION_COLUMNS} FROM flow_executions
                 WHERE status = 'active' AND next_run_at <= ?1
                 ORDER BY next_run_at ASC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![now, limit], row_to_execution)?;
            let mut executions = Vec::new();
            for row in rows {
                executions.push(row?);
            }
            Ok(executions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist cursor and next run time in one update.
pub async fn advance_execution(
    db: &Database,
    id: &str,
    current_step: i64,
    next_run_at: &str,
) -> Result<(), LeadflowError> {
    let id = id.to_string();
    let next_run_at = next_run_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE flow_executions
                 SET current_step = ?1, next_run_at = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![current_step, next_run_at, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move an execution to another status, optionally persisting a final
/// cursor position in the same update.
pub async fn set_execution_status(
    db: &Database,
    id: &str,
    status: &str,
    current_step: Option<i64>,
) -> Result<(), LeadflowError> {
    let id = id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            match current_step {
                Some(step) => {
                    conn.execute(
                        "UPDATE flow_executions
                         SET status = ?1, current_step = ?2,
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?3",
                        params![status, step, id],
                    )?;
                }
                None => {
                    conn.execute(
                        "UPDATE flow_executions
                         SET status = ?1,
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?2",
                        params![status, id],
                    )?;
                }
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All executions for one customer, newest first.
pub async fn list_executions(
    db: &Database,
    customer_id: &str,
) -> Result<Vec<FlowExecution>, LeadflowError> {
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EXECUTION_COLUMNS} FROM flow_executions
                 WHERE customer_id = ?1 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![customer_id], row_to_execution)?;
            let mut executions = Vec::new();
            for row in rows {
                executions.push(row?);
            }
            Ok(executions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
