// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session CRUD operations.

use leadflow_core::LeadflowError;
use rusqlite::params;

use crate::database::{Database, StoreError};
use crate::models::{LeadData, Session};

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let raw_lead_data: String = row.get(2)?;
    // Corrupt lead_data self-heals to empty, mirroring the state machine's
    // handling of corrupt state strings.
    let lead_data: LeadData = serde_json::from_str(&raw_lead_data).unwrap_or_default();
    Ok(Session {
        customer_id: row.get(0)?,
        current_state: row.get(1)?,
        lead_data,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn encode_lead_data(lead_data: &LeadData) -> Result<String, StoreError> {
    Ok(serde_json::to_string(lead_data)?)
}

/// Create a new session.
pub async fn create_session(db: &Database, session: &Session) -> Result<(), LeadflowError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            let lead_data = encode_lead_data(&session.lead_data)?;
            conn.execute(
                "INSERT INTO sessions (customer_id, current_state, lead_data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    session.customer_id,
                    session.current_state,
                    lead_data,
                    session.created_at,
                    session.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by customer id.
pub async fn get_session(
    db: &Database,
    customer_id: &str,
) -> Result<Option<Session>, LeadflowError> {
    let customer_id = customer_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT customer_id, current_state, lead_data, created_at, updated_at
                 FROM sessions WHERE customer_id = ?1",
            )?;
            let result = stmt.query_row(params![customer_id], row_to_session);
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist a session's state and lead data, refreshing updated_at.
pub async fn update_session(db: &Database, session: &Session) -> Result<(), LeadflowError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            let lead_data = encode_lead_data(&session.lead_data)?;
            conn.execute(
                "UPDATE sessions
                 SET current_state = ?1, lead_data = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE customer_id = ?3",
                params![session.current_state, lead_data, session.customer_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List sessions, optionally filtered by current state.
pub async fn list_sessions(
    db: &Database,
    state: Option<&str>,
) -> Result<Vec<Session>, LeadflowError> {
    let state = state.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut sessions = Vec::new();
            match &state {
                Some(state_filter) => {
                    let mut stmt = conn.prepare(
                        "SELECT customer_id, current_state, lead_data, created_at, updated_at
                         FROM sessions WHERE current_state = ?1 ORDER BY updated_at DESC",
                    )?;
                    let rows = stmt.query_map(params![state_filter], row_to_session)?;
                    for row in rows {
                        sessions.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT customer_id, current_state, lead_data, created_at, updated_at
                         FROM sessions ORDER BY updated_at DESC",
                    )?;
                    let rows = stmt.query_map([], row_to_session)?;
                    for row in rows {
                        sessions.push(row?);
                    }
                }
            }
            Ok(sessions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_session(customer_id: &str) -> Session {
        Session {
            customer_id: customer_id.to_string(),
            current_state: "welcome".to_string(),
            lead_data: LeadData::default(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get_session_roundtrips() {
        let (db, _dir) = setup_db().await;
        let mut session = make_session("+15550001");
        session.lead_data.intent = Some("sales".to_string());

        create_session(&db, &session).await.unwrap();
        let retrieved = get_session(&db, "+15550001").await.unwrap().unwrap();
        assert_eq!(retrieved.customer_id, "+15550001");
        assert_eq!(retrieved.current_state, "welcome");
        assert_eq!(retrieved.lead_data.intent, Some("sales".to_string()));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_nonexistent_session_returns_none() {
        let (db, _dir) = setup_db().await;
        let result = get_session(&db, "+19990000").await.unwrap();
        assert!(result.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_session_persists_state_and_answers() {
        let (db, _dir) = setup_db().await;
        let mut session = make_session("+15550002");
        create_session(&db, &session).await.unwrap();

        session.current_state = "qualify_floor".to_string();
        session.lead_data.size_category = Some("size_medium".to_string());
        update_session(&db, &session).await.unwrap();

        let retrieved = get_session(&db, "+15550002").await.unwrap().unwrap();
        assert_eq!(retrieved.current_state, "qualify_floor");
        assert_eq!(
            retrieved.lead_data.size_category,
            Some("size_medium".to_string())
        );
        // updated_at is refreshed by the database.
        assert_ne!(retrieved.updated_at, "2026-01-01T00:00:00.000Z");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_sessions_with_state_filter() {
        let (db, _dir) = setup_db().await;
        let s1 = make_session("+15550003");
        let mut s2 = make_session("+15550004");
        s2.current_state = "human_handoff".to_string();

        create_session(&db, &s1).await.unwrap();
        create_session(&db, &s2).await.unwrap();

        let all = list_sessions(&db, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let handed_off = list_sessions(&db, Some("human_handoff")).await.unwrap();
        assert_eq!(handed_off.len(), 1);
        assert_eq!(handed_off[0].customer_id, "+15550004");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_lead_data_self_heals_to_empty() {
        let (db, _dir) = setup_db().await;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO sessions (customer_id, current_state, lead_data)
                     VALUES ('+15550005', 'qualify_size', 'not json at all')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let session = get_session(&db, "+15550005").await.unwrap().unwrap();
        assert_eq!(session.lead_data, LeadData::default());
        db.close().await.unwrap();
    }
}
