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

//! Input line assembly
//!
//! Decoded plain bytes become newline-delimited command strings here.
//! Carriage returns normalize to newlines, backspace edits apply within
//! the bytes of the current read only, and the CRLF pair that survives
//! normalization as a double newline counts as a single terminator.

use std::collections::VecDeque;

const BS: u8 = 8;
const DEL: u8 = 127;

/// Rolling line buffer plus the queue of completed commands
#[derive(Debug, Default)]
pub struct InputLineAssembler {
    buffer: Vec<u8>,
    commands: VecDeque<String>,
}

impl InputLineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the decoded bytes of one read and extract completed lines.
    pub fn feed(&mut self, bytes: &[u8]) {
        // backspace may not reach behind what this read appended
        let region = self.buffer.len();

        for &byte in bytes {
            match byte {
                b'\r' => self.buffer.push(b'\n'),
                BS | DEL => {
                    if self.buffer.len() > region {
                        self.buffer.pop();
                    } else {
                        // underflow clears rather than erroring
                        self.buffer.clear();
                    }
                }
                _ => self.buffer.push(byte),
            }
        }

        self.extract_lines();
    }

    /// Next completed command, oldest first
    pub fn next_command(&mut self) -> Option<String> {
        self.commands.pop_front()
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    fn extract_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..pos).collect();
            self.buffer.remove(0);
            // CRLF normalizes to a double newline; eat the second half
            if self.buffer.first() == Some(&b'\n') {
                self.buffer.remove(0);
            }
            self.commands
                .push_back(String::from_utf8_lossy(&line).into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_line() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"look north\n");
        assert_eq!(asm.next_command(), Some("look north".to_string()));
        assert_eq!(asm.next_command(), None);
    }

    #[test]
    fn test_crlf_is_one_terminator() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"north\r\nsouth\r\n");
        assert_eq!(asm.next_command(), Some("north".to_string()));
        assert_eq!(asm.next_command(), Some("south".to_string()));
        assert_eq!(asm.next_command(), None);
    }

    #[test]
    fn test_bare_cr_terminates() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"jump\r");
        assert_eq!(asm.next_command(), Some("jump".to_string()));
    }

    #[test]
    fn test_lone_newline_is_empty_command() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"\r\n");
        assert_eq!(asm.next_command(), Some(String::new()));
        assert_eq!(asm.next_command(), None);
    }

    #[test]
    fn test_partial_line_across_reads() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"ki");
        assert_eq!(asm.next_command(), None);
        asm.feed(b"ll rat\n");
        assert_eq!(asm.next_command(), Some("kill rat".to_string()));
    }

    #[test]
    fn test_backspace_edits_current_read() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"nortj\x08h\n");
        assert_eq!(asm.next_command(), Some("north".to_string()));
    }

    #[test]
    fn test_del_behaves_like_backspace() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"ab\x7f\x7fcd\n");
        assert_eq!(asm.next_command(), Some("cd".to_string()));
    }

    #[test]
    fn test_backspace_does_not_reach_previous_read() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"abc");
        // underflowing backspaces clear the whole buffer
        asm.feed(b"\x08ok\n");
        assert_eq!(asm.next_command(), Some("ok".to_string()));
    }

    #[test]
    fn test_underflow_clears_buffer() {
        let mut asm = InputLineAssembler::new();
        asm.feed(b"\x08\x08hello\n");
        assert_eq!(asm.next_command(), Some("hello".to_string()));
    }
}
