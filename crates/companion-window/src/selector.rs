// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary-search selection of the longest suffix or prefix of a message
//! sequence that fits a token limit.
//!
//! Counting is expensive (proportional to the text in the candidate slice),
//! so both selectors evaluate the counter O(log n) times instead of scanning.
//! The counter must be monotonic in slice length.

use companion_core::CompanionError;
use tracing::debug;

/// Returns the longest suffix of `messages` whose token count is at most
/// `token_limit`.
///
/// Fails with [`CompanionError::Configuration`] when `token_limit` exceeds
/// `max_context_window`, before any counting. An empty input yields an empty
/// result without invoking the counter. If not even the last message fits,
/// the result is empty.
pub fn select_final_messages_by_token_limit<'a, M, F>(
    messages: &'a [M],
    token_limit: usize,
    mut token_counter: F,
    max_context_window: usize,
) -> Result<&'a [M], CompanionError>
where
    F: FnMut(&[M]) -> Result<usize, CompanionError>,
{
    check_limit(token_limit, max_context_window)?;
    if messages.is_empty() {
        return Ok(messages);
    }

    // Smallest start index whose suffix fits. Start index `len` (the empty
    // suffix) is accepted without counting.
    let mut evaluations = 0usize;
    let mut low = 0usize;
    let mut high = messages.len();
    while low < high {
        let mid = low + (high - low) / 2;
        evaluations += 1;
        if token_counter(&messages[mid..])? <= token_limit {
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    debug!(
        total = messages.len(),
        kept = messages.len() - low,
        token_limit,
        evaluations,
        "selected final messages"
    );

    Ok(&messages[low..])
}

/// Returns the longest prefix of `messages` whose token count is at most
/// `token_limit`.
///
/// Same preconditions and edge cases as
/// [`select_final_messages_by_token_limit`].
pub fn select_initial_messages_by_token_limit<'a, M, F>(
    messages: &'a [M],
    token_limit: usize,
    mut token_counter: F,
    max_context_window: usize,
) -> Result<&'a [M], CompanionError>
where
    F: FnMut(&[M]) -> Result<usize, CompanionError>,
{
    check_limit(token_limit, max_context_window)?;
    if messages.is_empty() {
        return Ok(messages);
    }

    // Largest prefix length that fits. Length 0 is accepted without counting.
    let mut evaluations = 0usize;
    let mut low = 0usize;
    let mut high = messages.len();
    while low < high {
        let mid = low + (high - low).div_ceil(2);
        evaluations += 1;
        if token_counter(&messages[..mid])? <= token_limit {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    debug!(
        total = messages.len(),
        kept = low,
        token_limit,
        evaluations,
        "selected initial messages"
    );

    Ok(&messages[..low])
}

fn check_limit(token_limit: usize, max_context_window: usize) -> Result<(), CompanionError> {
    if token_limit > max_context_window {
        return Err(CompanionError::Configuration(format!(
            "token limit {token_limit} exceeds the model's maximum context window of {max_context_window}"
        )));
    }
    Ok(())
}
