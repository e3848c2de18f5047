// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status-change hook connecting lead writers to the automation engine.

use async_trait::async_trait;

use crate::error::LeadflowError;

/// Invoked after a lead's status changes, from any writer: funnel
/// finalization, a scheduler `change_status` step, or an administrative
/// edit.
#[async_trait]
pub trait StatusChangeHook: Send + Sync {
    async fn on_status_change(
        &self,
        customer_id: &str,
        new_status: &str,
    ) -> Result<(), LeadflowError>;
}

/// Hook that does nothing. Used when automation is disabled.
pub struct NoopStatusHook;

#[async_trait]
impl StatusChangeHook for NoopStatusHook {
    async fn on_status_change(&self, _: &str, _: &str) -> Result<(), LeadflowError> {
        Ok(())
    }
}
