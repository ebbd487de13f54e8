// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The marker-stripping state machine.

/// Removes every occurrence of a fixed marker from a chunked text stream,
/// emitting cleared text as early as safety allows.
///
/// Buffering rule: text is held back only while it could still be part of an
/// incomplete marker. An incomplete occurrence can only start within the last
/// `marker.len()` bytes of the buffer, so once `pending` grows past
/// `2 * marker.len()` the prefix of length `pending.len() - marker.len()` is
/// provably safe to flush. The flush point is snapped back to a UTF-8 char
/// boundary, so the retained tail may exceed `marker.len()` by at most three
/// bytes when a multi-byte character straddles it.
#[derive(Debug)]
pub struct MarkerFilter {
    marker: String,
    pending: String,
    occurrences: usize,
}

impl MarkerFilter {
    /// Create a filter for the given marker.
    ///
    /// The marker must be non-empty; an empty marker would make every flush
    /// decision degenerate. Validated at config load, asserted here.
    pub fn new(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        debug_assert!(!marker.is_empty(), "marker must be non-empty");
        Self {
            marker,
            pending: String::new(),
            occurrences: 0,
        }
    }

    /// Feed one incoming chunk; returns text that is now safe to emit.
    ///
    /// Every full marker occurrence in the buffer is removed first (removal
    /// can expose a new occurrence, so this loops), with trailing whitespace
    /// at the removal point trimmed. The cleared text then goes through the
    /// normal buffering rule: once it exceeds twice the marker length, the
    /// provably-safe prefix is flushed and the last `marker.len()` bytes are
    /// retained. Text after a removed marker is never flushed eagerly: it
    /// may itself hold the start of the next occurrence.
    pub fn push(&mut self, chunk: &str) -> Option<String> {
        self.pending.push_str(chunk);

        let mut removed = false;
        while let Some(idx) = self.pending.find(&self.marker) {
            self.occurrences += 1;
            self.pending.replace_range(idx..idx + self.marker.len(), "");
            removed = true;
        }
        if removed {
            let keep = self.pending.trim_end().len();
            self.pending.truncate(keep);
        }

        if self.pending.len() > self.marker.len() * 2 {
            let mut split = self.pending.len() - self.marker.len();
            while !self.pending.is_char_boundary(split) {
                split -= 1;
            }
            let tail = self.pending.split_off(split);
            let safe = std::mem::replace(&mut self.pending, tail);
            if safe.is_empty() { None } else { Some(safe) }
        } else {
            None
        }
    }

    /// Drain the buffer at end of stream.
    ///
    /// Removes any marker occurrences still buffered, trims trailing
    /// whitespace, and returns the remainder if non-empty. Idempotent: a
    /// second call returns `None`.
    pub fn finish(&mut self) -> Option<String> {
        while let Some(idx) = self.pending.find(&self.marker) {
            self.occurrences += 1;
            let end = idx + self.marker.len();
            self.pending.replace_range(idx..end, "");
        }
        let cleared = self.pending.trim_end().to_string();
        self.pending.clear();
        if cleared.is_empty() { None } else { Some(cleared) }
    }

    /// Number of marker occurrences removed so far.
    pub fn occurrences(&self) -> usize {
        self.occurrences
    }
}
