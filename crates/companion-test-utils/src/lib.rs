// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Companion integration tests.
//!
//! Provides mock collaborators for fast, deterministic tests without a live
//! chat endpoint or tokenizer download.
//!
//! # Components
//!
//! - [`MockTransport`] - Scripted chat endpoint that records requests
//! - [`DeclaredTokenCounter`] - Token counter driven by costs written into message content
//! - [`FailingTokenCounter`] - Token counter that always errors

pub mod counters;
pub mod mock_transport;

pub use counters::{DeclaredTokenCounter, FailingTokenCounter};
pub use mock_transport::{MockTransport, MockTurn};
