// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for all external collaborators.

pub mod adapter;
pub mod channel;
pub mod flows;
pub mod hooks;
pub mod notifier;
pub mod storage;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use flows::FlowProvider;
pub use hooks::{NoopStatusHook, StatusChangeHook};
pub use notifier::NotifierAdapter;
pub use storage::StorageAdapter;
