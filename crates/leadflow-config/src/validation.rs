// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths, positive scheduler intervals,
//! and unique button ids.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{ButtonSpec, LeadflowConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LeadflowConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.scheduler.tick_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.tick_secs must be at least 1".to_string(),
        });
    }

    if config.scheduler.batch_size < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "scheduler.batch_size must be at least 1, got {}",
                config.scheduler.batch_size
            ),
        });
    }

    if config.scheduler.max_chain_depth < 1 {
        errors.push(ConfigError::Validation {
            message: "scheduler.max_chain_depth must be at least 1".to_string(),
        });
    }

    if config.keywords.agent_keywords.is_empty() {
        errors.push(ConfigError::Validation {
            message: "keywords.agent_keywords must not be empty".to_string(),
        });
    }

    if config.keywords.reset_keywords.is_empty() {
        errors.push(ConfigError::Validation {
            message: "keywords.reset_keywords must not be empty".to_string(),
        });
    }

    for (keyword_list, name) in [
        (&config.keywords.agent_keywords, "agent_keywords"),
        (&config.keywords.reset_keywords, "reset_keywords"),
    ] {
        for (i, keyword) in keyword_list.iter().enumerate() {
            if keyword.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: format!("keywords.{name}[{i}] must not be empty"),
                });
            }
        }
    }

    validate_buttons(&config.buttons.welcome_menu, "buttons.welcome_menu", &mut errors);
    validate_buttons(&config.buttons.size_options, "buttons.size_options", &mut errors);
    validate_buttons(&config.buttons.floor_options, "buttons.floor_options", &mut errors);

    if !config.messages.lead_summary.contains("{location}") {
        errors.push(ConfigError::Validation {
            message: "messages.lead_summary must contain the {location} placeholder".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a button set for emptiness, blank fields, and duplicate ids.
fn validate_buttons(buttons: &[ButtonSpec], section: &str, errors: &mut Vec<ConfigError>) {
    if buttons.is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{section} must contain at least one button"),
        });
    }

    let mut seen_ids = HashSet::new();
    for (i, button) in buttons.iter().enumerate() {
        if button.id.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{section}[{i}].id must not be empty"),
            });
        }
        if button.title.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{section}[{i}].title must not be empty"),
            });
        }
        if !seen_ids.insert(&button.id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate button id `{}` in {section}", button.id),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = LeadflowConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = LeadflowConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn zero_tick_secs_fails_validation() {
        let mut config = LeadflowConfig::default();
        config.scheduler.tick_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("tick_secs"))));
    }

    #[test]
    fn empty_agent_keywords_fails_validation() {
        let mut config = LeadflowConfig::default();
        config.keywords.agent_keywords.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("agent_keywords"))));
    }

    #[test]
    fn duplicate_button_ids_fail_validation() {
        let mut config = LeadflowConfig::default();
        config.buttons.size_options = vec![
            ButtonSpec {
                id: "size_small".to_string(),
                title: "Small".to_string(),
            },
            ButtonSpec {
                id: "size_small".to_string(),
                title: "Also small".to_string(),
            },
        ];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("duplicate button id"))));
    }

    #[test]
    fn summary_without_location_placeholder_fails() {
        let mut config = LeadflowConfig::default();
        config.messages.lead_summary = "Thanks, all done.".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("{location}"))));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = LeadflowConfig::default();
        config.storage.database_path = "/tmp/leads.db".to_string();
        config.scheduler.tick_secs = 5;
        config.scheduler.batch_size = 10;
        assert!(validate_config(&config).is_ok());
    }
}
