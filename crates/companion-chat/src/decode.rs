// SPDX-FileCopyrightText: 2026 Companion Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental UTF-8 decoding of a chunked byte body.

use std::char::REPLACEMENT_CHARACTER;

/// Decodes bytes chunk by chunk, carrying an incomplete trailing code point
/// over to the next chunk.
///
/// Invalid sequences become U+FFFD, as does a code point still incomplete
/// when the body ends.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text completed by `chunk`. May be empty when the chunk only holds the
    /// start of a multi-byte character.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            let (valid, invalid) = match std::str::from_utf8(&self.pending) {
                Ok(_) => (self.pending.len(), None),
                Err(e) => (e.valid_up_to(), Some(e.error_len())),
            };
            out.push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());

            match invalid {
                None => {
                    self.pending.clear();
                    break;
                }
                // Truncated sequence: wait for more bytes.
                Some(None) => {
                    self.pending.drain(..valid);
                    break;
                }
                Some(Some(len)) => {
                    out.push(REPLACEMENT_CHARACTER);
                    self.pending.drain(..valid + len);
                }
            }
        }

        out
    }

    /// Flushes whatever is left at end of body.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(rest)
    }

    /// True if bytes are waiting for the rest of a code point.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
