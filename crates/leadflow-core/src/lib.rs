// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Leadflow bot.
//!
//! This crate provides the foundational trait definitions, error types,
//! domain types, and timestamp helpers used throughout the Leadflow
//! workspace. All adapters implement traits defined here.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LeadflowError;
pub use types::{AdapterType, HealthStatus, MessageId};

// Re-export all adapter traits at crate root.
pub use traits::{
    ChannelAdapter, FlowProvider, NoopStatusHook, NotifierAdapter, PluginAdapter, StatusChangeHook,
    StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leadflow_error_has_all_variants() {
        let _config = LeadflowError::Config("test".into());
        let _storage = LeadflowError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _channel = LeadflowError::Channel {
            message: "test".into(),
            source: None,
        };
        let _notifier = LeadflowError::Notifier {
            message: "test".into(),
            source: None,
        };
        let _flows = LeadflowError::Flows {
            message: "test".into(),
            source: None,
        };
        let _not_found = LeadflowError::AdapterNotFound {
            adapter_type: "Channel".into(),
            name: "test".into(),
        };
        let _health = LeadflowError::HealthCheckFailed {
            name: "test".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = LeadflowError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = LeadflowError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Channel,
            AdapterType::Notifier,
            AdapterType::FlowProvider,
            AdapterType::Storage,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // If any trait module is missing or has a compile error,
        // this test won't compile.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_notifier_adapter<T: NotifierAdapter>() {}
        fn _assert_flow_provider<T: FlowProvider>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
    }
}
