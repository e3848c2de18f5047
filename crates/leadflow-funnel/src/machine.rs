// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The pure conversation state machine.
//!
//! [`evaluate`] is a total function of (stored state, classified input).
//! It performs no IO; the engine applies the returned [`Transition`]
//! (persistence, sends, notification) afterwards.

use std::str::FromStr;

use leadflow_config::model::{ButtonCatalog, ButtonSpec, MessageCatalog};
use leadflow_core::types::{Button, FunnelState, LeadData, OutboundCommand};

use crate::classifier::ClassifiedInput;

/// Welcome menu wire ids.
pub const BTN_SALES: &str = "btn_sales";
pub const BTN_ORDER: &str = "btn_order";
pub const BTN_SUPPORT: &str = "btn_support";
/// Site-condition id that triggers the groundwork warning.
pub const SITE_UNPREPARED: &str = "site_unprepared";

/// Out-of-band notification requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The customer asked for a human.
    AgentRequested,
    /// Qualification completed and the lead was finalized.
    LeadQualified,
}

/// Result of evaluating one inbound input against the stored state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next_state: FunnelState,
    pub lead_data: LeadData,
    pub commands: Vec<OutboundCommand>,
    /// Upsert the lead with status "completed" before applying hooks.
    pub finalize_lead: bool,
    pub notice: Option<Notice>,
}

impl Transition {
    fn stay(state: FunnelState, lead_data: LeadData, commands: Vec<OutboundCommand>) -> Self {
        Self {
            next_state: state,
            lead_data,
            commands,
            finalize_lead: false,
            notice: None,
        }
    }
}

fn to_buttons(specs: &[ButtonSpec]) -> Vec<Button> {
    specs
        .iter()
        .map(|s| Button::new(s.id.clone(), s.title.clone()))
        .collect()
}

fn welcome_menu(messages: &MessageCatalog, buttons: &ButtonCatalog) -> OutboundCommand {
    OutboundCommand::Buttons {
        body: messages.welcome.clone(),
        buttons: to_buttons(&buttons.welcome_menu),
    }
}

fn handoff(lead_data: LeadData, messages: &MessageCatalog) -> Transition {
    Transition {
        next_state: FunnelState::HumanHandoff,
        lead_data,
        commands: vec![OutboundCommand::Text {
            body: messages.handoff_ack.clone(),
        }],
        finalize_lead: false,
        notice: Some(Notice::AgentRequested),
    }
}

/// Evaluate one classified input against the stored session state.
///
/// `raw_state` is the state string as persisted; unknown or corrupt
/// values self-heal to `Welcome`. The agent-request override precedes
/// all state-specific logic except inside `HumanHandoff`, where the bot
/// is silent until an explicit reset.
pub fn evaluate(
    raw_state: &str,
    input: &ClassifiedInput,
    lead_data: &LeadData,
    messages: &MessageCatalog,
    buttons: &ButtonCatalog,
) -> Transition {
    // Self-healing: corrupt state falls back to the initial state.
    let state = FunnelState::from_str(raw_state).unwrap_or_default();
    let mut lead_data = lead_data.clone();

    if state != FunnelState::HumanHandoff && matches!(input, ClassifiedInput::AgentRequest) {
        return handoff(lead_data, messages);
    }

    match state {
        // SummaryHandoff is transient; a session found resting there is
        // treated as Welcome.
        FunnelState::Welcome | FunnelState::SummaryHandoff => match input {
            ClassifiedInput::Button { id, .. } if id == BTN_SALES => {
                lead_data.intent = Some("sales".to_string());
                Transition::stay(
                    FunnelState::QualifySize,
                    lead_data,
                    vec![OutboundCommand::Buttons {
                        body: messages.size_question.clone(),
                        buttons: to_buttons(&buttons.size_options),
                    }],
                )
            }
            ClassifiedInput::Button { id, .. } if id == BTN_ORDER => Transition::stay(
                FunnelState::Welcome,
                lead_data,
                vec![OutboundCommand::Text {
                    body: messages.order_status_instruction.clone(),
                }],
            ),
            ClassifiedInput::Button { id, .. } if id == BTN_SUPPORT => {
                handoff(lead_data, messages)
            }
            // Anything else re-emits the menu, idempotently.
            _ => Transition::stay(
                FunnelState::Welcome,
                lead_data,
                vec![welcome_menu(messages, buttons)],
            ),
        },

        FunnelState::QualifySize => match input {
            ClassifiedInput::Button { id, .. }
                if buttons.size_options.iter().any(|b| b.id == *id) =>
            {
                lead_data.size_category = Some(id.clone());
                Transition::stay(
                    FunnelState::QualifyFloor,
                    lead_data,
                    vec![OutboundCommand::Buttons {
                        body: messages.floor_question.clone(),
                        buttons: to_buttons(&buttons.floor_options),
                    }],
                )
            }
            _ => Transition::stay(
                FunnelState::QualifySize,
                lead_data,
                vec![OutboundCommand::Buttons {
                    body: messages.validation_select_size.clone(),
                    buttons: to_buttons(&buttons.size_options),
                }],
            ),
        },

        FunnelState::QualifyFloor => match input {
            ClassifiedInput::Button { id, .. }
                if buttons.floor_options.iter().any(|b| b.id == *id) =>
            {
                lead_data.site_condition = Some(id.clone());
                let mut commands = Vec::new();
                if id == SITE_UNPREPARED {
                    commands.push(OutboundCommand::Text {
                        body: messages.floor_warning.clone(),
                    });
                }
                commands.push(OutboundCommand::Text {
                    body: messages.location_prompt.clone(),
                });
                Transition::stay(FunnelState::AskLocation, lead_data, commands)
            }
            _ => Transition::stay(
                FunnelState::QualifyFloor,
                lead_data,
                vec![OutboundCommand::Buttons {
                    body: messages.validation_select_floor.clone(),
                    buttons: to_buttons(&buttons.floor_options),
                }],
            ),
        },

        FunnelState::AskLocation => match input {
            ClassifiedInput::Text(text) if !text.trim().is_empty() => {
                let location = text.trim().to_string();
                lead_data.location = Some(location.clone());
                let summary = messages.lead_summary.replace("{location}", &location);
                Transition {
                    // SummaryHandoff auto-resets: the persisted state is
                    // already Welcome.
                    next_state: FunnelState::Welcome,
                    lead_data,
                    commands: vec![OutboundCommand::Text { body: summary }],
                    finalize_lead: true,
                    notice: Some(Notice::LeadQualified),
                }
            }
            _ => Transition::stay(
                FunnelState::AskLocation,
                lead_data,
                vec![OutboundCommand::Text {
                    body: messages.validation_enter_location.clone(),
                }],
            ),
        },

        FunnelState::HumanHandoff => match input {
            ClassifiedInput::Reset => Transition::stay(
                FunnelState::Welcome,
                lead_data,
                vec![OutboundCommand::Text {
                    body: messages.reset_confirmation.clone(),
                }],
            ),
            // Suppressed while a human owns the conversation.
            _ => Transition::stay(FunnelState::HumanHandoff, lead_data, Vec::new()),
        },
    }
}
