// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead upsert and status operations.
//!
//! Leads are keyed on customer id with one row per customer. Repeat
//! qualification runs overwrite the previous answers.

use leadflow_core::LeadflowError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Lead;

fn row_to_lead(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        customer_id: row.get(0)?,
        intent: row.get(1)?,
        size_category: row.get(2)?,
        site_condition: row.get(3)?,
        location: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert-or-update a lead keyed on customer id.
///
/// On conflict the answers and status are overwritten while `created_at`
/// is preserved.
pub async fn upsert_lead(db: &Database, lead: &Lead) -> Result<(), LeadflowError> {
    let lead = lead.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO leads (customer_id, intent, size_category, site_condition,
                                    location, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(customer_id) DO UPDATE SET
                     intent = excluded.intent,
                     size_category = excluded.size_category,
                     site_condition = excluded.site_condition,
                     location = excluded.location,
                     status = excluded.status,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    lead.customer_id,
                    lead.intent,
                    lead.size_category,
                    lead.site_condition,
                    lead.location,
                    lead.status,
                    lead.created_at,
                    lead.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a lead by customer id.
pub async fn get_lead(db: &Database, customer_id: &str) -> Result<Option<Lead>, LeadflowError> {
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT customer_id, intent, size_category, site_condition,
                        location, status, created_at, updated_at
                 FROM leads WHERE customer_id = ?1",
            )?;
            let result = stmt.query_row(params![customer_id], row_to_lead);
            match result {
                Ok(lead) => Ok(Some(lead)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update only the status of an existing lead.
///
/// Returns `false` if no lead row exists for the customer.
pub async fn update_lead_status(
    db: &Database,
    customer_id: &str,
    status: &str,
) -> Result<bool, LeadflowError> {
    let customer_id = customer_id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE leads SET status = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE customer_id = ?2",
                params![status, customer_id],
            )?;
            Ok(affected > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
