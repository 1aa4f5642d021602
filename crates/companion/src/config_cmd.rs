// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `companion config` command implementation.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use companion_config::CompanionConfig;
use companion_core::CompanionError;

const REDACTED: &str = "********";

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a config file with every default spelled out.
    Init(InitArgs),
    /// Print the effective configuration with secrets redacted.
    Show,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[arg(default_value = companion_config::loader::LOCAL_CONFIG)]
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

pub fn run_init(args: &InitArgs) -> Result<(), CompanionError> {
    write_default_config(&args.path, args.force)?;
    println!("wrote {}", args.path.display());
    Ok(())
}

pub fn run_config(config: &CompanionConfig, command: &ConfigCommand) -> Result<(), CompanionError> {
    match command {
        ConfigCommand::Init(args) => run_init(args),
        ConfigCommand::Show => {
            print!("{}", render_config(config)?);
            Ok(())
        }
    }
}

fn write_default_config(path: &Path, force: bool) -> Result<(), CompanionError> {
    if path.exists() && !force {
        return Err(CompanionError::Configuration(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    let content = CompanionConfig::default_toml().map_err(|e| {
        CompanionError::Internal(format!("failed to render default config: {e}"))
    })?;
    std::fs::write(path, content)?;
    Ok(())
}

fn render_config(config: &CompanionConfig) -> Result<String, CompanionError> {
    let mut shown = config.clone();
    if shown.chat.access_token.is_some() {
        shown.chat.access_token = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| CompanionError::Internal(format!("failed to render config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companion.toml");

        write_default_config(&path, false).unwrap();

        let config = companion_config::load_and_validate_path(&path).unwrap();
        assert_eq!(config.chat.timezone, "UTC");
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companion.toml");
        std::fs::write(&path, "[app]\nlog_level = \"debug\"\n").unwrap();

        let err = write_default_config(&path, false).unwrap_err();
        assert!(matches!(err, CompanionError::Configuration(_)));
        assert!(std::fs::read_to_string(&path).unwrap().contains("debug"));

        write_default_config(&path, true).unwrap();
        assert!(!std::fs::read_to_string(&path).unwrap().contains("debug"));
    }

    #[test]
    fn show_redacts_access_token() {
        let config =
            companion_config::load_and_validate_str("[chat]\naccess_token = \"sk-live-123\"\n")
                .unwrap();
        let rendered = render_config(&config).unwrap();
        assert!(!rendered.contains("sk-live-123"));
        assert!(rendered.contains(REDACTED));
    }
}
