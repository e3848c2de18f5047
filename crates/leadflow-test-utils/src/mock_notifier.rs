// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notifier adapter capturing staff notifications.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use leadflow_core::{AdapterType, HealthStatus, LeadflowError, NotifierAdapter, PluginAdapter};

/// Captures every notification for later assertion. With
/// `set_failing(true)` each notify returns an error, which callers are
/// expected to swallow.
pub struct MockNotifier {
    notifications: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn notifications(&self) -> Vec<String> {
        self.notifications.lock().await.clone()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockNotifier {
    fn name(&self) -> &str {
        "mock-notifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}

#[async_trait]
impl NotifierAdapter for MockNotifier {
    async fn notify(&self, text: &str) -> Result<(), LeadflowError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LeadflowError::Notifier {
                message: "mock notifier failure".to_string(),
                source: None,
            });
        }
        self.notifications.lock().await.push(text.to_string());
        Ok(())
    }
}
