// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::LeadflowError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ExecutionStatus, FlowExecution, Lead, MessageLogEntry, Session, StorageStats,
};

/// Adapter for the durable customer-record and flow-execution stores.
///
/// Session and Lead are written by both the funnel engine and the
/// scheduler's `change_status` step; callers are responsible for
/// serializing read-modify-write sequences per customer.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), LeadflowError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), LeadflowError>;

    // --- Session operations ---

    async fn create_session(&self, session: &Session) -> Result<(), LeadflowError>;

    async fn get_session(&self, customer_id: &str) -> Result<Option<Session>, LeadflowError>;

    /// Persists the session's state and lead data, refreshing `updated_at`.
    async fn update_session(&self, session: &Session) -> Result<(), LeadflowError>;

    /// Lists sessions, optionally filtered by current state.
    async fn list_sessions(&self, state: Option<&str>) -> Result<Vec<Session>, LeadflowError>;

    // --- Lead operations ---

    /// Insert-or-update keyed on customer id. One row per customer.
    async fn upsert_lead(&self, lead: &Lead) -> Result<(), LeadflowError>;

    async fn get_lead(&self, customer_id: &str) -> Result<Option<Lead>, LeadflowError>;

    /// Updates only the status of an existing lead. Returns `false` if
    /// no lead row exists for the customer.
    async fn update_lead_status(
        &self,
        customer_id: &str,
        status: &str,
    ) -> Result<bool, LeadflowError>;

    // --- Message log (append-only) ---

    /// Appends an audit log entry. Returns the generated row id.
    async fn log_message(
        &self,
        customer_id: &str,
        direction: &str,
        kind: &str,
        content: &str,
        button_id: Option<&str>,
    ) -> Result<i64, LeadflowError>;

    async fn get_messages(
        &self,
        customer_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<MessageLogEntry>, LeadflowError>;

    // --- Flow execution operations ---

    async fn create_execution(&self, execution: &FlowExecution) -> Result<(), LeadflowError>;

    async fn get_execution(&self, id: &str) -> Result<Option<FlowExecution>, LeadflowError>;

    /// The active execution for a `(flow, customer)` pair, if any.
    async fn find_active_execution(
        &self,
        flow_id: &str,
        customer_id: &str,
    ) -> Result<Option<FlowExecution>, LeadflowError>;

    /// Active executions with `next_run_at <= now`, ordered by
    /// `next_run_at` ascending, at most `limit` rows.
    async fn due_executions(
        &self,
        now: &str,
        limit: i64,
    ) -> Result<Vec<FlowExecution>, LeadflowError>;

    /// Persists cursor and next run time in one update.
    async fn advance_execution(
        &self,
        id: &str,
        current_step: i64,
        next_run_at: &str,
    ) -> Result<(), LeadflowError>;

    /// Moves an execution to a terminal or administrative status,
    /// optionally persisting a final cursor position in the same update.
    async fn set_execution_status(
        &self,
        id: &str,
        status: ExecutionStatus,
        current_step: Option<i64>,
    ) -> Result<(), LeadflowError>;

    /// All executions for one customer, newest first.
    async fn list_executions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<FlowExecution>, LeadflowError>;

    // --- Reporting ---

    /// Row counts for the `status` command.
    async fn stats(&self) -> Result<StorageStats, LeadflowError>;
}
