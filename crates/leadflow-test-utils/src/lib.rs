// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Leadflow integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Outbound channel with message capture and a failure mode
//! - [`MockNotifier`] - Staff notifier with notification capture
//! - [`MemoryFlowProvider`] - Mutable in-memory flow definitions
//! - [`TestHarness`] - The full bot stack over a temp database

pub mod harness;
pub mod memory_provider;
pub mod mock_channel;
pub mod mock_notifier;

pub use harness::TestHarness;
pub use memory_provider::MemoryFlowProvider;
pub use mock_channel::{MockChannel, SentMessage};
pub use mock_notifier::MockNotifier;
