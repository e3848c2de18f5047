// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow definitions loaded from a TOML file.
//!
//! Definitions are read once at construction; edits to the file require
//! a restart. The expected shape:
//!
//! ```toml
//! [[flows]]
//! id = "follow-up"
//! name = "Follow up after qualification"
//! is_active = true
//! trigger_on_status = "completed"
//!
//! [[flows.steps]]
//! type = "send_message"
//! content = "Thanks! We will be in touch."
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use leadflow_core::types::FlowDefinition;
use leadflow_core::{AdapterType, FlowProvider, HealthStatus, LeadflowError, PluginAdapter};

#[derive(Debug, Deserialize)]
struct FlowFile {
    #[serde(default)]
    flows: Vec<FlowDefinition>,
}

/// Read-only [`FlowProvider`] backed by a TOML definitions file.
#[derive(Debug)]
pub struct TomlFlowProvider {
    flows: Vec<FlowDefinition>,
}

impl TomlFlowProvider {
    /// Provider with no definitions. Every lookup returns empty.
    pub fn empty() -> Self {
        Self { flows: Vec::new() }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LeadflowError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| LeadflowError::Flows {
            message: format!("cannot read flow definitions at {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        let provider = Self::from_str(&raw)?;
        info!(path = %path.display(), count = provider.flows.len(), "flow definitions loaded");
        Ok(provider)
    }

    pub fn from_str(raw: &str) -> Result<Self, LeadflowError> {
        let file: FlowFile = toml::from_str(raw).map_err(|e| LeadflowError::Flows {
            message: "malformed flow definitions".to_string(),
            source: Some(Box::new(e)),
        })?;
        Ok(Self { flows: file.flows })
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for TomlFlowProvider {
    fn name(&self) -> &str {
        "toml-flows"
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
impl FlowProvider for TomlFlowProvider {
    async fn flows_for_status(&self, status: &str) -> Result<Vec<FlowDefinition>, LeadflowError> {
        Ok(self
            .flows
            .iter()
            .filter(|f| f.is_active && f.trigger_on_status == status)
            .cloned()
            .collect())
    }

    async fn get_flow(&self, id: &str) -> Result<Option<FlowDefinition>, LeadflowError> {
        Ok(self.flows.iter().find(|f| f.id == id).cloned())
    }
}
