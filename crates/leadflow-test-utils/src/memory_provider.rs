// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory flow provider with mutable definitions.
//!
//! Unlike the production TOML provider, definitions can be changed
//! mid-test to exercise mid-flight deactivation and deletion.

use async_trait::async_trait;
use tokio::sync::RwLock;

use leadflow_core::types::FlowDefinition;
use leadflow_core::{AdapterType, FlowProvider, HealthStatus, LeadflowError, PluginAdapter};

/// A mutable [`FlowProvider`] over a plain vector.
pub struct MemoryFlowProvider {
    flows: RwLock<Vec<FlowDefinition>>,
}

impl MemoryFlowProvider {
    pub fn new(flows: Vec<FlowDefinition>) -> Self {
        Self {
            flows: RwLock::new(flows),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub async fn push(&self, flow: FlowDefinition) {
        self.flows.write().await.push(flow);
    }

    /// Flip a flow's active flag. Returns false if the id is unknown.
    pub async fn set_active(&self, id: &str, is_active: bool) -> bool {
        let mut flows = self.flows.write().await;
        match flows.iter_mut().find(|f| f.id == id) {
            Some(flow) => {
                flow.is_active = is_active;
                true
            }
            None => false,
        }
    }

    /// Delete a flow definition. Returns false if the id is unknown.
    pub async fn remove(&self, id: &str) -> bool {
        let mut flows = self.flows.write().await;
        let before = flows.len();
        flows.retain(|f| f.id != id);
        flows.len() != before
    }
}

#[async_trait]
impl PluginAdapter for MemoryFlowProvider {
    fn name(&self) -> &str {
        "memory-flows"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FlowProvider
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl FlowProvider for MemoryFlowProvider {
    async fn flows_for_status(&self, status: &str) -> Result<Vec<FlowDefinition>, LeadflowError> {
        Ok(self
            .flows
            .read()
            .await
            .iter()
            .filter(|f| f.is_active && f.trigger_on_status == status)
            .cloned()
            .collect())
    }

    async fn get_flow(&self, id: &str) -> Result<Option<FlowDefinition>, LeadflowError> {
        Ok(self.flows.read().await.iter().find(|f| f.id == id).cloned())
    }
}
