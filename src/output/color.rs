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

//! Caret color codes
//!
//! Game text carries color as caret codes (`^r`, `^G`, ...). Lowercase is
//! the normal palette, uppercase the bright one, `^x` resets. The bright
//! palette differs between plain ANSI and 256-color terminals: legacy
//! clients want the aixterm 90-97 range, xterm-class clients the
//! `38;5;8..15` palette indexes.

use crate::telnet::options::ColorLevel;

/// ANSI sequence for a caret code at the given color level.
///
/// Returns `None` for unrecognized codes; the encoder drops those.
pub fn sequence(code: u8, level: ColorLevel) -> Option<&'static str> {
    let xterm = level == ColorLevel::Xterm256;
    let seq = match code {
        b'x' | b'0' => "\x1b[0m",
        b'u' => "\x1b[4m",
        b'k' => "\x1b[30m",
        b'r' => "\x1b[31m",
        b'g' => "\x1b[32m",
        b'y' => "\x1b[33m",
        b'b' => "\x1b[34m",
        b'p' => "\x1b[35m",
        b'c' => "\x1b[36m",
        b'w' => "\x1b[37m",
        b'K' => if xterm { "\x1b[38;5;8m" } else { "\x1b[90m" },
        b'R' => if xterm { "\x1b[38;5;9m" } else { "\x1b[91m" },
        b'G' => if xterm { "\x1b[38;5;10m" } else { "\x1b[92m" },
        b'Y' => if xterm { "\x1b[38;5;11m" } else { "\x1b[93m" },
        b'B' => if xterm { "\x1b[38;5;12m" } else { "\x1b[94m" },
        b'P' => if xterm { "\x1b[38;5;13m" } else { "\x1b[95m" },
        b'C' => if xterm { "\x1b[38;5;14m" } else { "\x1b[96m" },
        b'W' => if xterm { "\x1b[38;5;15m" } else { "\x1b[97m" },
        _ => return None,
    };
    Some(seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_palette() {
        assert_eq!(sequence(b'r', ColorLevel::Ansi), Some("\x1b[31m"));
        assert_eq!(sequence(b'x', ColorLevel::Ansi), Some("\x1b[0m"));
    }

    #[test]
    fn test_bright_palette_depends_on_level() {
        assert_eq!(sequence(b'R', ColorLevel::Ansi), Some("\x1b[91m"));
        assert_eq!(sequence(b'R', ColorLevel::Xterm256), Some("\x1b[38;5;9m"));
    }

    #[test]
    fn test_unrecognized_code() {
        assert_eq!(sequence(b'q', ColorLevel::Ansi), None);
        assert_eq!(sequence(b'q', ColorLevel::Xterm256), None);
    }
}
