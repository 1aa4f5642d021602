// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON Lines files: one JSON value per line.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use companion_core::CompanionError;

/// Reads every non-blank line as a JSON value.
///
/// Stops at the first line that is not valid JSON; the error names the file
/// and the 1-based line number.
pub fn read_jsonl(path: &Path) -> Result<Vec<Value>, CompanionError> {
    let text = fs::read_to_string(path)?;
    let mut values = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(line).map_err(|e| {
            CompanionError::malformed(format!("{}:{}: {e}", path.display(), index + 1))
        })?;
        values.push(value);
    }
    debug!(path = %path.display(), records = values.len(), "read jsonl file");
    Ok(values)
}

/// Appends `record` as one line, creating the file if needed.
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> Result<(), CompanionError> {
    let line = to_line(record)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Number of lines that parse to a JSON object. Other lines are ignored.
pub fn count_json_objects(path: &Path) -> Result<usize, CompanionError> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .filter(|line| matches!(serde_json::from_str::<Value>(line), Ok(Value::Object(_))))
        .count())
}

/// Replaces the line at 0-based `line_index` with `record`.
///
/// Every other line is written back unchanged, followed by a final newline.
pub fn replace_jsonl_line<T: Serialize>(
    path: &Path,
    line_index: usize,
    record: &T,
) -> Result<(), CompanionError> {
    let new_line = to_line(record)?;
    let text = fs::read_to_string(path)?;
    let mut lines: Vec<&str> = text.lines().collect();
    let Some(slot) = lines.get_mut(line_index) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "invalid line index {line_index} for {} ({} lines)",
                path.display(),
                lines.len()
            ),
        )
        .into());
    };
    *slot = &new_line;

    let mut out = lines.join("\n");
    out.push('\n');
    fs::write(path, out)?;
    Ok(())
}

/// `base_YYYYMMDD_HHMMSS.ext` in local time.
pub fn timestamped_file_name(base: &str, extension: &str) -> String {
    stamped_name(base, extension, Local::now().naive_local())
}

fn stamped_name(base: &str, extension: &str, at: NaiveDateTime) -> String {
    format!("{base}_{}.{extension}", at.format("%Y%m%d_%H%M%S"))
}

fn to_line<T: Serialize>(record: &T) -> Result<String, CompanionError> {
    serde_json::to_string(record)
        .map_err(|e| CompanionError::Internal(format!("failed to serialize record: {e}")))
}
