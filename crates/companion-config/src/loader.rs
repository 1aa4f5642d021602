// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading with Figment.
//!
//! Lookup order: `./companion.toml` > `~/.config/companion/companion.toml` >
//! `/etc/companion/companion.toml`, then `COMPANION_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CompanionConfig;

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "companion.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/companion/companion.toml";

/// Top-level sections an environment variable can address. Longest first so
/// `fine_tune_` wins over any shorter prefix.
const ENV_SECTIONS: &[&str] = &["fine_tune", "context", "chat", "app"];

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("companion").join(LOCAL_CONFIG))
}

/// Build the full layered figment without extracting.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/companion/companion.toml`
/// 3. `~/.config/companion/companion.toml`
/// 4. `./companion.toml`
/// 5. `COMPANION_*` environment variables
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(CompanionConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment.merge(Toml::file(LOCAL_CONFIG)).merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<CompanionConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults only.
pub fn load_config_from_str(toml_content: &str) -> Result<CompanionConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CompanionConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, skipping the lookup hierarchy
/// but still honouring environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<CompanionConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CompanionConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// `COMPANION_CHAT_ACCESS_TOKEN` -> `chat.access_token`.
///
/// Only the section prefix becomes a dot; underscores inside key names stay.
fn env_provider() -> Env {
    Env::prefixed("COMPANION_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
