// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete bot stack with mock adapters
//! and a temp SQLite database: funnel engine, status trigger, and flow
//! scheduler, all sharing one storage. Provides `send_text()` /
//! `send_button()` to drive the conversation pipeline and `tick()` to
//! advance the scheduler.

use std::sync::Arc;

use leadflow_automation::{FlowScheduler, FlowTrigger};
use leadflow_config::model::{LeadflowConfig, StorageConfig};
use leadflow_core::types::{FlowDefinition, InboundContent, InboundEvent};
use leadflow_core::{time, LeadflowError, StorageAdapter};
use leadflow_funnel::FunnelEngine;
use leadflow_storage::SqliteStorage;

use crate::memory_provider::MemoryFlowProvider;
use crate::mock_channel::MockChannel;
use crate::mock_notifier::MockNotifier;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    flows: Vec<FlowDefinition>,
    config: LeadflowConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            flows: Vec::new(),
            config: LeadflowConfig::default(),
        }
    }

    /// Seed the flow provider with definitions.
    pub fn with_flows(mut self, flows: Vec<FlowDefinition>) -> Self {
        self.flows = flows;
        self
    }

    /// Replace the default configuration (messages, buttons, keywords,
    /// scheduler settings). The storage path is always overridden with
    /// the harness temp database.
    pub fn with_config(mut self, config: LeadflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, LeadflowError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| LeadflowError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        }));
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = storage;

        let channel = Arc::new(MockChannel::new());
        let notifier = Arc::new(MockNotifier::new());
        let provider = Arc::new(MemoryFlowProvider::new(self.flows));

        let trigger = Arc::new(FlowTrigger::new(
            storage.clone(),
            provider.clone(),
            self.config.scheduler.max_chain_depth,
        ));

        let engine = FunnelEngine::new(
            storage.clone(),
            channel.clone(),
            notifier.clone(),
            self.config.messages.clone(),
            self.config.buttons.clone(),
            self.config.keywords.clone(),
        )
        .with_status_hook(trigger.clone());

        let scheduler = FlowScheduler::new(
            storage.clone(),
            provider.clone(),
            channel.clone(),
            trigger.clone(),
            self.config.scheduler.clone(),
        );

        Ok(TestHarness {
            channel,
            notifier,
            provider,
            storage,
            trigger,
            engine,
            scheduler,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock outbound channel.
    pub channel: Arc<MockChannel>,
    /// The mock staff notifier.
    pub notifier: Arc<MockNotifier>,
    /// Mutable in-memory flow definitions.
    pub provider: Arc<MemoryFlowProvider>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    /// The status-change trigger shared by engine and scheduler.
    pub trigger: Arc<FlowTrigger>,
    /// The conversation funnel engine.
    pub engine: FunnelEngine,
    /// The flow scheduler. Ticked manually; no background loop runs.
    pub scheduler: FlowScheduler,
    /// The configuration the stack was built from.
    pub config: LeadflowConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Drive one inbound text message through the funnel.
    pub async fn send_text(&self, customer_id: &str, text: &str) -> Result<(), LeadflowError> {
        self.engine
            .handle_inbound(&InboundEvent {
                customer_id: customer_id.to_string(),
                content: InboundContent::Text(text.to_string()),
                timestamp: time::now(),
            })
            .await
    }

    /// Drive one inbound button reply through the funnel.
    pub async fn send_button(
        &self,
        customer_id: &str,
        id: &str,
        title: &str,
    ) -> Result<(), LeadflowError> {
        self.engine
            .handle_inbound(&InboundEvent {
                customer_id: customer_id.to_string(),
                content: InboundContent::Button {
                    id: id.to_string(),
                    title: title.to_string(),
                },
                timestamp: time::now(),
            })
            .await
    }

    /// Run one scheduler pass.
    pub async fn tick(&self) {
        self.scheduler.tick().await;
    }
}
