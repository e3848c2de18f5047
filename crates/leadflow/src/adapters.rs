// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log-only channel adapter.
//!
//! Stand-in used when no real messaging transport is configured. Every
//! outbound message becomes a structured log line, which keeps `serve`
//! observable in development.

use async_trait::async_trait;
use tracing::info;

use leadflow_core::types::{Button, MessageId};
use leadflow_core::{AdapterType, ChannelAdapter, HealthStatus, LeadflowError, PluginAdapter};

/// Channel adapter that logs instead of sending.
pub struct LogChannel;

#[async_trait]
impl PluginAdapter for LogChannel {
    fn name(&self) -> &str {
        "log-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for LogChannel {
    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, LeadflowError> {
        info!(to, body, "outbound text");
        Ok(MessageId(format!("log-{}", uuid::Uuid::new_v4())))
    }

    async fn send_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[Button],
    ) -> Result<MessageId, LeadflowError> {
        let ids: Vec<&str> = buttons.iter().map(|b| b.id.as_str()).collect();
        info!(to, body, buttons = ?ids, "outbound buttons");
        Ok(MessageId(format!("log-{}", uuid::Uuid::new_v4())))
    }
}
