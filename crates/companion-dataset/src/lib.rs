// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fine-tuning dataset tooling for Companion.
//!
//! Reads and writes JSON Lines training files, checks examples against a
//! model's [`FineTuneProfile`], estimates training cost, and selects the
//! token-budgeted context around a message.

pub mod context;
pub mod cost;
pub mod jsonl;
pub mod profile;
pub mod validate;

pub use context::{ContextWindow, context_around};
pub use cost::{CostEstimate, estimate_training_cost, training_epochs};
pub use jsonl::{
    append_jsonl, count_json_objects, read_jsonl, replace_jsonl_line, timestamped_file_name,
};
pub use profile::FineTuneProfile;
pub use validate::{
    DatasetSummary, IssueCounts, IssueKind, count_example_tokens, inspect_training_dataset,
    validate_training_dataset,
};
