// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation funnel for the Leadflow bot.
//!
//! Three layers: the [`classifier`] turns raw inbound content into a
//! [`classifier::ClassifiedInput`], the pure [`machine`] evaluates it
//! against the stored session state, and the [`engine`] applies the
//! resulting transition (persistence, sends, notifications).

pub mod classifier;
pub mod engine;
pub mod machine;

pub use classifier::{classify, ClassifiedInput};
pub use engine::FunnelEngine;
pub use machine::{evaluate, Notice, Transition};
