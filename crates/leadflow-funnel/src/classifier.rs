// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound input classification.
//!
//! Raw channel content plus the configured keyword lists become a
//! [`ClassifiedInput`] that the state machine consumes. Keyword
//! semantics: agent keywords match as case-insensitive substrings,
//! reset keywords as exact (trimmed, lowercased) matches.

use leadflow_config::model::KeywordConfig;
use leadflow_core::types::InboundContent;

/// Classified customer input, fed to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedInput {
    /// Text containing an agent-request keyword. Pulls the session into
    /// human handoff from any non-handoff state.
    AgentRequest,
    /// Text exactly matching a reset keyword. Only meaningful in handoff.
    Reset,
    /// A reply button press.
    Button { id: String, title: String },
    /// Free-form text with no keyword match.
    Text(String),
}

/// Classify inbound content against the configured keyword lists.
pub fn classify(content: &InboundContent, keywords: &KeywordConfig) -> ClassifiedInput {
    match content {
        InboundContent::Button { id, title } => ClassifiedInput::Button {
            id: id.clone(),
            title: title.clone(),
        },
        InboundContent::Text(text) => {
            let normalized = text.trim().to_lowercase();
            if keywords
                .reset_keywords
                .iter()
                .any(|k| normalized == k.trim().to_lowercase())
            {
                return ClassifiedInput::Reset;
            }
            if keywords
                .agent_keywords
                .iter()
                .any(|k| !k.trim().is_empty() && normalized.contains(&k.trim().to_lowercase()))
            {
                return ClassifiedInput::AgentRequest;
            }
            ClassifiedInput::Text(text.clone())
        }
    }
}
