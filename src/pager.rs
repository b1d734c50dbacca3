//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Large-output pagination
//!
//! Long text is queued as lines and released in batches sized to the
//! client's terminal. An empty keystroke releases the next batch, any
//! other input abandons the rest.

use std::collections::VecDeque;

/// Smallest batch released regardless of terminal height
pub const MIN_LINES: usize = 10;

/// Queue of lines awaiting release
#[derive(Debug, Default)]
pub struct Pager {
    queue: VecDeque<String>,
    released: usize,
    /// Last appended text did not end in a newline; the next append's
    /// first segment belongs to the same line.
    trailing_partial: bool,
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines per batch for a terminal of the given height
    pub fn batch_size(rows: u16) -> usize {
        MIN_LINES.max(rows.saturating_sub(2) as usize)
    }

    /// Queue text, merging a previously appended partial trailing line
    /// with the first segment instead of splitting it.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let ends_nl = text.ends_with('\n');
        let mut segments: Vec<&str> = text.split('\n').collect();
        if ends_nl {
            segments.pop();
        }

        let mut segments = segments.into_iter();
        if let Some(first) = segments.next() {
            match self.queue.back_mut() {
                Some(last) if self.trailing_partial => last.push_str(first),
                _ => self.queue.push_back(first.to_string()),
            }
        }
        for segment in segments {
            self.queue.push_back(segment.to_string());
        }
        self.trailing_partial = !ends_nl;
    }

    /// Pop and return up to `n` lines, tracking the per-page count.
    pub fn release(&mut self, n: usize) -> Vec<String> {
        let mut lines = Vec::with_capacity(n.min(self.queue.len()));
        for _ in 0..n {
            match self.queue.pop_front() {
                Some(line) => lines.push(line),
                None => break,
            }
        }
        self.released += lines.len();
        if self.queue.is_empty() {
            self.released = 0;
            self.trailing_partial = false;
        }
        lines
    }

    /// One continuation keystroke: empty asks for the next batch, anything
    /// else abandons the remainder.
    pub fn continuation(&mut self, rows: u16, keypress: &str) -> Vec<String> {
        if !keypress.is_empty() {
            tracing::debug!(remaining = self.queue.len(), "pager aborted");
            self.queue.clear();
            self.released = 0;
            self.trailing_partial = false;
            return Vec::new();
        }
        // the keystroke opens a fresh page
        self.released = 0;
        self.release(Self::batch_size(rows))
    }

    /// Lines still queued
    pub fn is_active(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Lines released on the current page
    pub fn released(&self) -> usize {
        self.released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(lines: usize) -> Pager {
        let mut pager = Pager::new();
        let text: String = (0..lines).map(|i| format!("line {}\n", i)).collect();
        pager.append(&text);
        pager
    }

    #[test]
    fn test_batch_size() {
        assert_eq!(Pager::batch_size(24), 22);
        assert_eq!(Pager::batch_size(50), 48);
        // small terminals still get a useful page
        assert_eq!(Pager::batch_size(5), MIN_LINES);
        assert_eq!(Pager::batch_size(0), MIN_LINES);
    }

    #[test]
    fn test_hundred_lines_at_rows_24() {
        let mut pager = filled(100);
        for _ in 0..4 {
            let batch = pager.continuation(24, "");
            assert_eq!(batch.len(), 22);
            assert!(pager.is_active());
        }
        let batch = pager.continuation(24, "");
        assert_eq!(batch.len(), 12);
        // queue drained, pager idle again
        assert!(!pager.is_active());
        assert_eq!(pager.released(), 0);
    }

    #[test]
    fn test_released_tracks_open_page() {
        let mut pager = filled(30);
        assert_eq!(pager.release(22).len(), 22);
        // the page stays open until a continuation keystroke
        assert_eq!(pager.released(), 22);
        pager.append("tail\n");
        assert_eq!(pager.released(), 22);
        // the keystroke starts the count over for the next page
        assert_eq!(pager.continuation(24, "").len(), 9);
        assert_eq!(pager.released(), 0);
    }

    #[test]
    fn test_nonempty_keystroke_aborts() {
        let mut pager = filled(100);
        pager.continuation(24, "");
        let batch = pager.continuation(24, "q");
        assert!(batch.is_empty());
        assert!(!pager.is_active());
        assert_eq!(pager.released(), 0);
    }

    #[test]
    fn test_release_order_preserved() {
        let mut pager = filled(30);
        let batch = pager.continuation(24, "");
        assert_eq!(batch[0], "line 0");
        assert_eq!(batch[21], "line 21");
        let batch = pager.continuation(24, "");
        assert_eq!(batch[0], "line 22");
    }

    #[test]
    fn test_partial_trailing_line_merges() {
        let mut pager = Pager::new();
        pager.append("first\nsecond half");
        pager.append(" continues\nthird\n");
        let lines = pager.release(10);
        assert_eq!(
            lines,
            vec![
                "first".to_string(),
                "second half continues".to_string(),
                "third".to_string(),
            ]
        );
    }

    #[test]
    fn test_append_after_complete_line_starts_new_line() {
        let mut pager = Pager::new();
        pager.append("one\n");
        pager.append("two\n");
        assert_eq!(pager.release(10), vec!["one".to_string(), "two".to_string()]);
    }
}
