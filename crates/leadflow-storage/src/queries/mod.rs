// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod executions;
pub mod leads;
pub mod messages;
pub mod sessions;
pub mod stats;
