// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secondary notification bridge trait (e.g. a staff Telegram group).

use async_trait::async_trait;

use crate::error::LeadflowError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for the human-notification side channel.
///
/// Used for handoff alerts, new-lead announcements, and inbound
/// message forwarding. Delivery is fire-and-forget from the caller's
/// perspective: a failed notification never rolls back a transition.
#[async_trait]
pub trait NotifierAdapter: PluginAdapter {
    /// Delivers a notification to the staff channel.
    async fn notify(&self, text: &str) -> Result<(), LeadflowError>;
}
