// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status-driven flow automation.
//!
//! The [`trigger::FlowTrigger`] starts executions when a lead's status
//! changes, the [`scheduler::FlowScheduler`] runs due steps on a fixed
//! interval, and the [`provider::TomlFlowProvider`] supplies the flow
//! definitions both read.

pub mod provider;
pub mod scheduler;
pub mod trigger;

pub use provider::TomlFlowProvider;
pub use scheduler::FlowScheduler;
pub use trigger::FlowTrigger;
