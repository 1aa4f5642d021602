// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Companion configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompanionConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Chat endpoint and session settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Token window settings for outbound history.
    #[serde(default)]
    pub context: ContextConfig,

    /// Extra models on top of the built-in table.
    #[serde(default)]
    pub models: Vec<ModelEntry>,

    /// Fine-tuning dataset preparation settings.
    #[serde(default)]
    pub fine_tune: FineTuneConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chat endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// URL the chat request is POSTed to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Conversation id. `None` generates a fresh one per run.
    #[serde(default)]
    pub chat_id: Option<String>,

    /// IANA timezone sent with every request.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Bearer credential. `None` requires `COMPANION_CHAT_ACCESS_TOKEN`.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Upper bound on waiting for the endpoint to start responding.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on the gap between two response chunks.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// Extra top-level fields merged into every request body.
    #[serde(default)]
    pub extra_body: serde_json::Map<String, serde_json::Value>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            chat_id: None,
            timezone: default_timezone(),
            access_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            extra_body: serde_json::Map::new(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000/chat".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_inactivity_timeout_secs() -> u64 {
    60
}

/// Token window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Model whose tokenizer and context window govern trimming.
    #[serde(default = "default_model")]
    pub model: String,

    /// Token budget for outbound history. `None` sends the whole transcript.
    #[serde(default)]
    pub token_limit: Option<usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            token_limit: None,
        }
    }
}

fn default_model() -> String {
    companion_window::DEFAULT_MODEL.to_string()
}

/// An additional model and its maximum context window.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub name: String,
    pub context_window: usize,
}

/// Fine-tuning dataset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FineTuneConfig {
    /// Model the dataset is tokenized and priced for.
    #[serde(default = "default_model")]
    pub model: String,

    /// Training price in USD per million tokens.
    #[serde(default = "default_base_cost_per_million_tokens")]
    pub base_cost_per_million_tokens: f64,

    /// Examples above this many tokens are truncated by the trainer.
    #[serde(default = "default_max_tokens_per_example")]
    pub max_tokens_per_example: usize,

    /// Smallest dataset the trainer accepts.
    #[serde(default = "default_min_examples")]
    pub min_examples: usize,

    /// Require a `name` on every user and assistant message.
    #[serde(default)]
    pub require_names: bool,
}

impl Default for FineTuneConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_cost_per_million_tokens: default_base_cost_per_million_tokens(),
            max_tokens_per_example: default_max_tokens_per_example(),
            min_examples: default_min_examples(),
            require_names: false,
        }
    }
}

fn default_base_cost_per_million_tokens() -> f64 {
    0.9
}

fn default_max_tokens_per_example() -> usize {
    65_536
}

fn default_min_examples() -> usize {
    10
}

impl CompanionConfig {
    /// Built-in models plus any `[[models]]` entries.
    pub fn model_catalog(&self) -> companion_window::ModelCatalog {
        let mut catalog = companion_window::ModelCatalog::builtin();
        for entry in &self.models {
            catalog.register(companion_window::ModelInfo::new(
                entry.name.clone(),
                entry.context_window,
            ));
        }
        catalog
    }

    /// The defaults rendered as TOML, for `companion config init`.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }
}
