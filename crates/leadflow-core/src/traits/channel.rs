// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound channel adapter trait for the customer-facing messaging platform.

use async_trait::async_trait;

use crate::error::LeadflowError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Button, MessageId};

/// Adapter for the outbound messaging channel.
///
/// Inbound events arrive through the transport layer (webhook), which
/// is outside this crate; the core only ever sends.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Sends a plain text message to a customer.
    async fn send_text(&self, to: &str, body: &str) -> Result<MessageId, LeadflowError>;

    /// Sends a text message with reply buttons to a customer.
    async fn send_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[Button],
    ) -> Result<MessageId, LeadflowError>;
}
