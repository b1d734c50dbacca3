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

//! Command dispatch seam
//!
//! Completed command lines leave the engine through this trait. The game
//! world behind it is someone else's problem; replies come back as
//! marked-up text for the encoder.

/// Receives completed command lines, returns marked-up reply text
pub trait CommandDispatcher {
    fn dispatch(&mut self, line: &str) -> Vec<String>;
}

/// Swallows everything; useful in tests
#[derive(Debug, Default)]
pub struct NullDispatcher;

impl CommandDispatcher for NullDispatcher {
    fn dispatch(&mut self, _line: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Stand-in dispatcher until a world backend is attached: echoes the
/// command back at the player.
#[derive(Debug, Default)]
pub struct EchoDispatcher;

impl CommandDispatcher for EchoDispatcher {
    fn dispatch(&mut self, line: &str) -> Vec<String> {
        if line.trim().is_empty() {
            Vec::new()
        } else {
            vec![format!("You say, '^c{}^x'\n", line.trim())]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_dispatcher() {
        let mut echo = EchoDispatcher;
        assert_eq!(echo.dispatch("look"), vec!["You say, '^clook^x'\n".to_string()]);
        assert!(echo.dispatch("   ").is_empty());
    }
}
