// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Leadflow workspace.
//!
//! The customer identifier (a phone number or similar stable external
//! handle) keys every entity here: sessions, leads, message log rows,
//! and flow executions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier returned by a channel adapter for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Notifier,
    FlowProvider,
    Storage,
}

// --- Conversation funnel ---

/// States of the conversation funnel.
///
/// `SummaryHandoff` is transient: a session never durably rests there
/// because the machine immediately self-transitions back to `Welcome`
/// after emitting the summary. `HumanHandoff` is absorbing until an
/// explicit reset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FunnelState {
    #[default]
    Welcome,
    QualifySize,
    QualifyFloor,
    AskLocation,
    SummaryHandoff,
    HumanHandoff,
}

/// Qualification answers collected while walking the funnel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadData {
    pub intent: Option<String>,
    pub size_category: Option<String>,
    pub site_condition: Option<String>,
    pub location: Option<String>,
}

/// Per-customer conversation state record.
///
/// `current_state` is stored as text; unknown or corrupt values are not
/// an error — the state machine self-heals them to `Welcome` on the
/// next inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub customer_id: String,
    pub current_state: String,
    pub lead_data: LeadData,
    pub created_at: String,
    pub updated_at: String,
}

/// A qualified customer record. One row per customer, upserted on
/// qualification completion and on every status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub customer_id: String,
    pub intent: Option<String>,
    pub size_category: Option<String>,
    pub site_condition: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Message direction in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Append-only audit log entry. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLogEntry {
    pub id: i64,
    pub customer_id: String,
    pub direction: String,
    pub kind: String,
    pub content: String,
    pub button_id: Option<String>,
    pub created_at: String,
}

// --- Flow automation ---

/// One step of an automation flow.
///
/// The tagged representation matches the provider wire format
/// (`{"type": "send_message", "content": ...}`); step types outside
/// this enum are rejected at deserialization, so the scheduler never
/// sees an unrecognized step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowStep {
    SendMessage { content: String },
    Wait { delay_minutes: i64 },
    ChangeStatus { status: String },
}

/// A named, ordered automation sequence triggered by a lead status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub trigger_on_status: String,
    pub steps: Vec<FlowStep>,
}

/// Lifecycle of a flow execution.
///
/// `Completed` and `Failed` are terminal; `Paused` is reachable only
/// through administrative action, never from the scheduler itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Active,
    Paused,
    Completed,
    Failed,
}

/// A running instance of a flow for one customer.
///
/// Invariant enforced by the trigger: at most one `active` row per
/// `(flow_id, customer_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowExecution {
    pub id: String,
    pub flow_id: String,
    pub customer_id: String,
    pub current_step: i64,
    pub next_run_at: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Row counts reported by the storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub sessions: i64,
    pub handoff_sessions: i64,
    pub leads: i64,
    pub messages: i64,
    pub active_executions: i64,
}

// --- Channel wire types ---

/// Content of an inbound customer event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundContent {
    Text(String),
    Button { id: String, title: String },
}

impl InboundContent {
    /// Human-readable text for logging and notification forwarding.
    pub fn display_text(&self) -> &str {
        match self {
            InboundContent::Text(t) => t,
            InboundContent::Button { title, .. } => title,
        }
    }

    /// Message kind tag for the audit log.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundContent::Text(_) => "text",
            InboundContent::Button { .. } => "button",
        }
    }
}

/// An inbound event from the channel collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub customer_id: String,
    pub content: InboundContent,
    pub timestamp: String,
}

/// A reply button offered to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    pub title: String,
}

impl Button {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// An outbound command descriptor produced by the state machine.
///
/// The recipient is implicit: commands are always addressed to the
/// customer whose event produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundCommand {
    Text { body: String },
    Buttons { body: String, buttons: Vec<Button> },
}
