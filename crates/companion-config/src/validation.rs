// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::CompanionConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first.
pub fn validate_config(config: &CompanionConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "app.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.app.log_level
        )));
    }

    let endpoint = config.chat.endpoint.trim();
    if endpoint.is_empty() {
        errors.push(ConfigError::validation("chat.endpoint must not be empty"));
    } else if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "chat.endpoint must be an http(s) URL, got `{endpoint}`"
        )));
    }

    if config.chat.timezone.trim().is_empty() {
        errors.push(ConfigError::validation("chat.timezone must not be empty"));
    }

    if config.chat.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "chat.request_timeout_secs must be greater than 0",
        ));
    }
    if config.chat.inactivity_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "chat.inactivity_timeout_secs must be greater than 0",
        ));
    }

    let mut seen = HashSet::new();
    for entry in &config.models {
        if entry.name.trim().is_empty() {
            errors.push(ConfigError::validation("models.name must not be empty"));
        }
        if !seen.insert(entry.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "model `{}` is listed more than once",
                entry.name
            )));
        }
        if entry.context_window == 0 {
            errors.push(ConfigError::validation(format!(
                "model `{}` must have a context_window greater than 0",
                entry.name
            )));
        }
    }

    let catalog = config.model_catalog();
    match catalog.get(&config.context.model) {
        Ok(model) => {
            if let Some(limit) = config.context.token_limit
                && limit > model.context_window
            {
                errors.push(ConfigError::validation(format!(
                    "context.token_limit {limit} exceeds the {} context window of {}",
                    model.name, model.context_window
                )));
            }
        }
        Err(_) => errors.push(ConfigError::validation(format!(
            "context.model `{}` is not a known model; add it under [[models]]",
            config.context.model
        ))),
    }

    if catalog.get(&config.fine_tune.model).is_err() {
        errors.push(ConfigError::validation(format!(
            "fine_tune.model `{}` is not a known model; add it under [[models]]",
            config.fine_tune.model
        )));
    }
    let price = config.fine_tune.base_cost_per_million_tokens;
    if !price.is_finite() || price < 0.0 {
        errors.push(ConfigError::validation(format!(
            "fine_tune.base_cost_per_million_tokens must be non-negative, got {price}"
        )));
    }
    if config.fine_tune.max_tokens_per_example == 0 {
        errors.push(ConfigError::validation(
            "fine_tune.max_tokens_per_example must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelEntry;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&CompanionConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = CompanionConfig::default();
        config.chat.endpoint = " ".into();
        config.chat.request_timeout_secs = 0;
        config.fine_tune.base_cost_per_million_tokens = -1.0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "{:?}", messages(&errors));
    }

    #[test]
    fn token_limit_above_model_window() {
        let mut config = CompanionConfig::default();
        config.context.model = "inflection_3_pi".into();
        config.context.token_limit = Some(9_000);
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("context.token_limit 9000"));

        config.context.token_limit = Some(8_000);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn custom_models_extend_the_catalog() {
        let mut config = CompanionConfig::default();
        config.context.model = "local-llama".into();
        assert!(validate_config(&config).is_err());

        config.models.push(ModelEntry {
            name: "local-llama".into(),
            context_window: 4_096,
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn duplicate_and_empty_models() {
        let mut config = CompanionConfig::default();
        let entry = ModelEntry {
            name: "local".into(),
            context_window: 0,
        };
        config.models = vec![entry.clone(), entry];
        let all = messages(&validate_config(&config).unwrap_err()).join("\n");
        assert!(all.contains("more than once"));
        assert!(all.contains("context_window greater than 0"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = CompanionConfig::default();
        config.app.log_level = "verbose".into();
        assert!(validate_config(&config).is_err());
    }
}
