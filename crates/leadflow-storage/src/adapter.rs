// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use leadflow_config::model::StorageConfig;
use leadflow_core::types::{
    ExecutionStatus, FlowExecution, Lead, MessageLogEntry, Session, StorageStats,
};
use leadflow_core::{AdapterType, HealthStatus, LeadflowError, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, LeadflowError> {
        self.db.get().ok_or_else(|| LeadflowError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        // Shutdown delegates to a checkpoint if the DB was initialized.
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), LeadflowError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LeadflowError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LeadflowError> {
        let db = self.db()?;
        // Checkpoint WAL before close.
        db.connection()
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Session operations ---

    async fn create_session(&self, session: &Session) -> Result<(), LeadflowError> {
        queries::sessions::create_session(self.db()?, session).await
    }

    async fn get_session(&self, customer_id: &str) -> Result<Option<Session>, LeadflowError> {
        queries::sessions::get_session(self.db()?, customer_id).await
    }

    async fn update_session(&self, session: &Session) -> Result<(), LeadflowError> {
        queries::sessions::update_session(self.db()?, session).await
    }

    async fn list_sessions(&self, state: Option<&str>) -> Result<Vec<Session>, LeadflowError> {
        queries::sessions::list_sessions(self.db()?, state).await
    }

    // --- Lead operations ---

    async fn upsert_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        queries::leads::upsert_lead(self.db()?, lead).await
    }

    async fn get_lead(&self, customer_id: &str) -> Result<Option<Lead>, LeadflowError> {
        queries::leads::get_lead(self.db()?, customer_id).await
    }

    async fn update_lead_status(
        &self,
        customer_id: &str,
        status: &str,
    ) -> Result<bool, LeadflowError> {
        queries::leads::update_lead_status(self.db()?, customer_id, status).await
    }

    // --- Message log ---

    async fn log_message(
        &self,
        customer_id: &str,
        direction: &str,
        kind: &str,
        content: &str,
        button_id: Option<&str>,
    ) -> Result<i64, LeadflowError> {
        queries::messages::log_message(self.db()?, customer_id, direction, kind, content, button_id)
            .await
    }

    async fn get_messages(
        &self,
        customer_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<MessageLogEntry>, LeadflowError> {
        queries::messages::get_messages(self.db()?, customer_id, limit).await
    }

    // --- Flow execution operations ---

    async fn create_execution(&self, execution: &FlowExecution) -> Result<(), LeadflowError> {
        queries::executions::create_execution(self.db()?, execution).await
    }

    async fn get_execution(&self, id: &str) -> Result<Option<FlowExecution>, LeadflowError> {
        queries::executions::get_execution(self.db()?, id).await
    }

    async fn find_active_execution(
        &self,
        flow_id: &str,
        customer_id: &str,
    ) -> Result<Option<FlowExecution>, LeadflowError> {
        queries::executions::find_active_execution(self.db()?, flow_id, customer_id).await
    }

    async fn due_executions(
        &self,
        now: &str,
        limit: i64,
    ) -> Result<Vec<FlowExecution>, LeadflowError> {
        queries::executions::due_executions(self.db()?, now, limit).await
    }

    async fn advance_execution(
        &self,
        id: &str,
        current_step: i64,
        next_run_at: &str,
    ) -> Result<(), LeadflowError> {
        queries::executions::advance_execution(self.db()?, id, current_step, next_run_at).await
    }

    async fn set_execution_status(
        &self,
        id: &str,
        status: ExecutionStatus,
        current_step: Option<i64>,
    ) -> Result<(), LeadflowError> {
        queries::executions::set_execution_status(self.db()?, id, &status.to_string(), current_step)
            .await
    }

    async fn list_executions(&self, customer_id: &str) -> Result<Vec<FlowExecution>, LeadflowError> {
        queries::executions::list_executions(self.db()?, customer_id).await
    }

    // --- Reporting ---

    async fn stats(&self) -> Result<StorageStats, LeadflowError> {
        queries::stats::collect(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::types::LeadData;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let result = storage.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn health_check_fails_when_not_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        let result = storage.health_check().await;
        assert!(result.is_err(), "health_check should fail before initialize");
    }

    #[tokio::test]
    async fn health_check_returns_healthy_when_initialized() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        let status = storage.health_check().await.unwrap();
        assert_eq!(status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn full_customer_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        // Session appears when the customer first writes in.
        let mut session = Session {
            customer_id: "+15550040".to_string(),
            current_state: "welcome".to_string(),
            lead_data: LeadData::default(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        storage.create_session(&session).await.unwrap();

        // Inbound and outbound messages are logged.
        storage
            .log_message("+15550040", "incoming", "text", "hi", None)
            .await
            .unwrap();
        storage
            .log_message("+15550040", "outgoing", "buttons", "How can we help?", None)
            .await
            .unwrap();
        let messages = storage.get_messages("+15550040", None).await.unwrap();
        assert_eq!(messages.len(), 2);

        // Qualification answers accumulate on the session.
        session.current_state = "ask_location".to_string();
        session.lead_data = LeadData {
            intent: Some("sales".to_string()),
            size_category: Some("size_small".to_string()),
            site_condition: Some("site_ready".to_string()),
            location: None,
        };
        storage.update_session(&session).await.unwrap();

        // Completion finalizes a lead.
        let lead = Lead {
            customer_id: "+15550040".to_string(),
            intent: Some("sales".to_string()),
            size_category: Some("size_small".to_string()),
            site_condition: Some("site_ready".to_string()),
            location: Some("Springfield".to_string()),
            status: "completed".to_string(),
            created_at: "2026-01-01T00:05:00.000Z".to_string(),
            updated_at: "2026-01-01T00:05:00.000Z".to_string(),
        };
        storage.upsert_lead(&lead).await.unwrap();
        assert!(storage
            .update_lead_status("+15550040", "contacted")
            .await
            .unwrap());

        // Automation rows attach to the same customer.
        let execution = FlowExecution {
            id: "exec-lifecycle".to_string(),
            flow_id: "flow-welcome".to_string(),
            customer_id: "+15550040".to_string(),
            current_step: 0,
            next_run_at: "2026-01-01T00:06:00.000Z".to_string(),
            status: "active".to_string(),
            created_at: "2026-01-01T00:05:00.000Z".to_string(),
            updated_at: "2026-01-01T00:05:00.000Z".to_string(),
        };
        storage.create_execution(&execution).await.unwrap();
        storage
            .set_execution_status("exec-lifecycle", ExecutionStatus::Completed, Some(1))
            .await
            .unwrap();
        let listed = storage.list_executions("+15550040").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, "completed");

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.leads, 1);
        assert_eq!(stats.messages, 2);
        assert_eq!(stats.active_executions, 0);

        storage.close().await.unwrap();
        storage.shutdown().await.unwrap();
    }
}
