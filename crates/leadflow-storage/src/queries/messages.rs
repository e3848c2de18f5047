// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only message audit log.

use leadflow_core::LeadflowError;
use rusqlite::params;

use crate::database::Database;
use crate::models::MessageLogEntry;

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageLogEntry> {
    Ok(MessageLogEntry {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        direction: row.get(2)?,
        kind: row.get(3)?,
        content: row.get(4)?,
        button_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Append an audit log entry. Returns the generated row id.
pub async fn log_message(
    db: &Database,
    customer_id: &str,
    direction: &str,
    kind: &str,
    content: &str,
    button_id: Option<&str>,
) -> Result<i64, LeadflowError> {
    let customer_id = customer_id.to_string();
    let direction = direction.to_string();
    let kind = kind.to_string();
    let content = content.to_string();
    let button_id = button_id.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_log (customer_id, direction, kind, content, button_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![customer_id, direction, kind, content, button_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get log entries for one customer in chronological order.
pub async fn get_messages(
    db: &Database,
    customer_id: &str,
    limit: Option<i64>,
) -> Result<Vec<MessageLogEntry>, LeadflowError> {
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut entries = Vec::new();
            match limit {
                Some(n) => {
                    // Most recent n entries, returned oldest first.
                    let mut stmt = conn.prepare(
                        "SELECT id, customer_id, direction, kind, content, button_id, created_at
                         FROM (SELECT * FROM message_log WHERE customer_id = ?1
                               ORDER BY id DESC LIMIT ?2)
                         ORDER BY id ASC",
                    )?;
                    let rows = stmt.query_map(params![customer_id, n], row_to_entry)?;
                    for row in rows {
                        entries.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, customer_id, direction, kind, content, button_id, created_at
                         FROM message_log WHERE customer_id = ?1 ORDER BY id ASC",
                    )?;
                    let rows = stmt.query_map(params![customer_id], row_to_entry)?;
                    for row in rows {
                        entries.push(row?);
                    }
                }
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
