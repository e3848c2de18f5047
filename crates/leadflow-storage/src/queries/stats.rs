// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row counts for the operator `status` command.

use leadflow_core::LeadflowError;

use crate::database::Database;
use crate::models::StorageStats;

/// Collect row counts across all stores in one connection call.
pub async fn collect(db: &Database) -> Result<StorageStats, LeadflowError> {
    db.connection()
        .call(|conn| {
            let count = |sql: &str| -> rusqlite::Result<i64> {
                conn.query_row(sql, [], |row| row.get(0))
            };
            Ok(StorageStats {
                sessions: count("SELECT COUNT(*) FROM sessions")?,
                handoff_sessions: count(
                    "SELECT COUNT(*) FROM sessions WHERE current_state = 'human_handoff'",
                )?,
                leads: count("SELECT COUNT(*) FROM leads")?,
                messages: count("SELECT COUNT(*) FROM message_log")?,
                active_executions: count(
                    "SELECT COUNT(*) FROM flow_executions WHERE status = 'active'",
                )?,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}
