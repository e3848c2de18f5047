// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Leadflow bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Leadflow configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadflowConfig {
    /// Bot identity and behavior settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Flow scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Flow definition provider settings.
    #[serde(default)]
    pub flows: FlowsConfig,

    /// Keyword lists driving input classification.
    #[serde(default)]
    pub keywords: KeywordConfig,

    /// Customer-facing message copy.
    #[serde(default)]
    pub messages: MessageCatalog,

    /// Reply button sets presented by the funnel.
    #[serde(default)]
    pub buttons: ButtonCatalog,
}

/// Bot identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "leadflow".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("leadflow").join("leadflow.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "leadflow.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Flow scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between scheduler ticks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Maximum due executions processed per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Maximum status-change chain length per trigger invocation.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            batch_size: default_batch_size(),
            max_chain_depth: default_max_chain_depth(),
        }
    }
}

fn default_tick_secs() -> u64 {
    60
}

fn default_batch_size() -> i64 {
    100
}

fn default_max_chain_depth() -> usize {
    8
}

/// Flow definition provider configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlowsConfig {
    /// Path to the TOML file holding flow definitions. `None` disables
    /// the automation engine.
    #[serde(default)]
    pub definitions_path: Option<String>,
}

/// Keyword lists driving input classification.
///
/// Matching is case-insensitive substring containment for agent
/// keywords and exact (trimmed, lowercased) match for reset keywords.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordConfig {
    /// Words that pull the conversation into human handoff from any state.
    #[serde(default = "default_agent_keywords")]
    pub agent_keywords: Vec<String>,

    /// Words that reset a handed-off session back to the welcome state.
    #[serde(default = "default_reset_keywords")]
    pub reset_keywords: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            agent_keywords: default_agent_keywords(),
            reset_keywords: default_reset_keywords(),
        }
    }
}

fn default_agent_keywords() -> Vec<String> {
    vec![
        "agent".to_string(),
        "human".to_string(),
        "representative".to_string(),
    ]
}

fn default_reset_keywords() -> Vec<String> {
    vec!["reset".to_string(), "restart".to_string()]
}

/// Customer-facing message copy.
///
/// The funnel engine never hardcodes customer-visible text; everything
/// it sends comes from this catalog so operators can localize it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessageCatalog {
    #[serde(default = "default_welcome")]
    pub welcome: String,

    #[serde(default = "default_order_status_instruction")]
    pub order_status_instruction: String,

    #[serde(default = "default_handoff_ack")]
    pub handoff_ack: String,

    #[serde(default = "default_size_question")]
    pub size_question: String,

    #[serde(default = "default_validation_select_size")]
    pub validation_select_size: String,

    #[serde(default = "default_floor_question")]
    pub floor_question: String,

    #[serde(default = "default_validation_select_floor")]
    pub validation_select_floor: String,

    #[serde(default = "default_floor_warning")]
    pub floor_warning: String,

    #[serde(default = "default_location_prompt")]
    pub location_prompt: String,

    #[serde(default = "default_validation_enter_location")]
    pub validation_enter_location: String,

    /// Summary shown on qualification completion. `{location}` is
    /// replaced with the customer's answer.
    #[serde(default = "default_lead_summary")]
    pub lead_summary: String,

    #[serde(default = "default_reset_confirmation")]
    pub reset_confirmation: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            welcome: default_welcome(),
            order_status_instruction: default_order_status_instruction(),
            handoff_ack: default_handoff_ack(),
            size_question: default_size_question(),
            validation_select_size: default_validation_select_size(),
            floor_question: default_floor_question(),
            validation_select_floor: default_validation_select_floor(),
            floor_warning: default_floor_warning(),
            location_prompt: default_location_prompt(),
            validation_enter_location: default_validation_enter_location(),
            lead_summary: default_lead_summary(),
            reset_confirmation: default_reset_confirmation(),
        }
    }
}

fn default_welcome() -> String {
    "Hi! How can we help you today?".to_string()
}

fn default_order_status_instruction() -> String {
    "To check an existing order, reply with your order number and a team member will look it up."
        .to_string()
}

fn default_handoff_ack() -> String {
    "Connecting you with a team member, please hold on...".to_string()
}

fn default_size_question() -> String {
    "Great! What size are you looking for?".to_string()
}

fn default_validation_select_size() -> String {
    "Please pick one of the size options below.".to_string()
}

fn default_floor_question() -> String {
    "Is the installation site already prepared with a level surface?".to_string()
}

fn default_validation_select_floor() -> String {
    "Please pick one of the site options below.".to_string()
}

fn default_floor_warning() -> String {
    "Heads up: an unprepared site may require extra groundwork before installation.".to_string()
}

fn default_location_prompt() -> String {
    "Last step! Which city or town should we quote delivery for?".to_string()
}

fn default_validation_enter_location() -> String {
    "Please type your city or town as a text message.".to_string()
}

fn default_lead_summary() -> String {
    "Thanks! We have everything we need for {location}. A team member will be in touch shortly."
        .to_string()
}

fn default_reset_confirmation() -> String {
    "The conversation with our team has ended. You are back with the bot.".to_string()
}

/// One reply button.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonSpec {
    pub id: String,
    pub title: String,
}

/// Reply button sets presented by the funnel.
///
/// Ids are part of the wire contract with the classifier: the welcome
/// menu uses `btn_*` ids, size options use `size_*` ids, and site
/// options use `site_ready`/`site_unprepared`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonCatalog {
    #[serde(default = "default_welcome_menu")]
    pub welcome_menu: Vec<ButtonSpec>,

    #[serde(default = "default_size_options")]
    pub size_options: Vec<ButtonSpec>,

    #[serde(default = "default_floor_options")]
    pub floor_options: Vec<ButtonSpec>,
}

impl Default for ButtonCatalog {
    fn default() -> Self {
        Self {
            welcome_menu: default_welcome_menu(),
            size_options: default_size_options(),
            floor_options: default_floor_options(),
        }
    }
}

fn default_welcome_menu() -> Vec<ButtonSpec> {
    vec![
        ButtonSpec {
            id: "btn_sales".to_string(),
            title: "Get a quote".to_string(),
        },
        ButtonSpec {
            id: "btn_order".to_string(),
            title: "Order status".to_string(),
        },
        ButtonSpec {
            id: "btn_support".to_string(),
            title: "Talk to a person".to_string(),
        },
    ]
}

fn default_size_options() -> Vec<ButtonSpec> {
    vec![
        ButtonSpec {
            id: "size_small".to_string(),
            title: "Small".to_string(),
        },
        ButtonSpec {
            id: "size_medium".to_string(),
            title: "Medium".to_string(),
        },
        ButtonSpec {
            id: "size_large".to_string(),
            title: "Large".to_string(),
        },
    ]
}

fn default_floor_options() -> Vec<ButtonSpec> {
    vec![
        ButtonSpec {
            id: "site_ready".to_string(),
            title: "Site is ready".to_string(),
        },
        ButtonSpec {
            id: "site_unprepared".to_string(),
            title: "Not prepared yet".to_string(),
        },
    ]
}
