// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with captured outbound
//! messages for assertion in tests and a switchable failure mode.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use leadflow_core::types::{Button, MessageId};
use leadflow_core::{AdapterType, ChannelAdapter, HealthStatus, LeadflowError, PluginAdapter};

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
    /// Empty for plain text sends.
    pub buttons: Vec<Button>,
}

/// A mock messaging channel for testing.
///
/// Everything passed to `send_text()` / `send_buttons()` is captured
/// and retrievable via `sent_messages()`. With `set_failing(true)`
/// every send returns a channel error instead.
pub struct MockChannel {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All messages captured so far, in send order.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    async fn capture(&self, msg: SentMessage) -> Result<MessageId, LeadflowError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LeadflowError::Channel {
                message: "mock channel failure".to_string(),
                source: None,
            });
        }
        self.sent.lock().await.push(msg);
        Ok(MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4())))
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
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
impl ChannelAdapter for MockChannel {
    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, LeadflowError> {
        self.capture(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            buttons: Vec::new(),
        })
        .await
    }

    async fn send_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[Button],
    ) -> Result<MessageId, LeadflowError> {
        self.capture(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
            buttons: buttons.to_vec(),
        })
        .await
    }
}
