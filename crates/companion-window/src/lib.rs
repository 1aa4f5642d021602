// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-budgeted window selection.
//!
//! Picks the longest run of messages at the end (or start) of a conversation
//! that fits a token limit, so requests stay inside a model's context window.
//! [`TiktokenCounter`] supplies real token counts; [`TokenBudget`] ties a
//! validated limit to a model.

pub mod budget;
pub mod models;
pub mod selector;
pub mod tiktoken;

pub use budget::TokenBudget;
pub use models::{DEFAULT_MODEL, ModelCatalog, ModelInfo};
pub use selector::{select_final_messages_by_token_limit, select_initial_messages_by_token_limit};
pub use tiktoken::TiktokenCounter;
