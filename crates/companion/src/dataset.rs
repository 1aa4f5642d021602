// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `companion dataset` command implementation.

use std::path::PathBuf;

use clap::Subcommand;
use colored::Colorize;

use companion_config::CompanionConfig;
use companion_config::model::FineTuneConfig;
use companion_core::CompanionError;
use companion_dataset::{
    FineTuneProfile, estimate_training_cost, read_jsonl, validate_training_dataset,
};
use companion_window::TiktokenCounter;

#[derive(Subcommand, Debug)]
pub enum DatasetCommand {
    /// Check a JSONL training file for format problems.
    Validate {
        /// One training example per line.
        file: PathBuf,
    },
    /// Estimate what fine-tuning on a JSONL training file costs.
    Cost {
        /// One training example per line.
        file: PathBuf,
    },
}

pub fn run_dataset(config: &CompanionConfig, command: &DatasetCommand) -> Result<(), CompanionError> {
    let profile = fine_tune_profile(&config.fine_tune);
    let catalog = config.model_catalog();
    let counter = TiktokenCounter::new(catalog.get(&profile.model)?)?;

    match command {
        DatasetCommand::Validate { file } => {
            let examples = read_jsonl(file)?;
            let summary = validate_training_dataset(&examples, &counter, &profile)?;
            println!(
                "{} {} examples, {} tokens (largest example {} tokens)",
                "valid:".green(),
                summary.examples,
                summary.total_tokens,
                summary.max_example_tokens
            );
        }
        DatasetCommand::Cost { file } => {
            let examples = read_jsonl(file)?;
            let estimate = estimate_training_cost(&examples, &counter, &profile)?;
            println!(
                "estimated cost: ${:.4} ({} tokens x {} epochs on {})",
                estimate.cost, estimate.tokens, estimate.epochs, profile.model
            );
        }
    }
    Ok(())
}

pub(crate) fn fine_tune_profile(config: &FineTuneConfig) -> FineTuneProfile {
    FineTuneProfile {
        model: config.model.clone(),
        base_cost_per_million_tokens: config.base_cost_per_million_tokens,
        max_tokens_per_example: config.max_tokens_per_example,
        min_examples: config.min_examples,
        require_names: config.require_names,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_builtin_profile() {
        let config = companion_config::load_and_validate_str("").unwrap();
        let profile = fine_tune_profile(&config.fine_tune);
        assert_eq!(
            profile,
            FineTuneProfile::builtin("gpt-4o-mini-2024-07-18").unwrap()
        );
    }

    #[test]
    fn overrides_flow_into_profile() {
        let config = companion_config::load_and_validate_str(
            "[fine_tune]\nmin_examples = 2\nrequire_names = true\n",
        )
        .unwrap();
        let profile = fine_tune_profile(&config.fine_tune);
        assert_eq!(profile.min_examples, 2);
        assert!(profile.require_names);
    }
}
