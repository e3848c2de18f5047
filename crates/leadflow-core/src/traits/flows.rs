// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only flow definition provider trait.

use async_trait::async_trait;

use crate::error::LeadflowError;
use crate::traits::adapter::PluginAdapter;
use crate::types::FlowDefinition;

/// Source of automation flow definitions.
///
/// Definitions are owned elsewhere (a dashboard, a config file); this
/// core only reads them. Both lookups may return flows with
/// `is_active = false` filtered out or not depending on the query:
/// `flows_for_status` returns active flows only, `get_flow` returns
/// the definition regardless of its active flag so the scheduler can
/// observe deactivation.
#[async_trait]
pub trait FlowProvider: PluginAdapter {
    /// Active flow definitions whose `trigger_on_status` matches.
    async fn flows_for_status(&self, status: &str) -> Result<Vec<FlowDefinition>, LeadflowError>;

    /// A flow definition by id, active or not. `None` if deleted.
    async fn get_flow(&self, id: &str) -> Result<Option<FlowDefinition>, LeadflowError>;
}
