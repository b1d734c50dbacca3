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

//! Output encoding
//!
//! `encode` turns internal marked-up text into wire bytes for one
//! connection: newline conversion, caret color codes, and MXP tag spans.
//! It is a pure single pass over the input with no side effects on the
//! capabilities. `strip_telnet` and `needs_prompt` are the flush-side
//! utilities for inspecting already-encoded wire bytes.

use crate::telnet::mxp;
use crate::telnet::options::TelnetOptions;
use crate::telnet::protocol::{DO, DONT, EOR, GA, IAC, SB, SE, WILL, WONT};

/// Encode marked-up text into wire bytes per the negotiated capabilities.
///
/// Rules: `\n` becomes `\r\n`; `^` plus a code character becomes an ANSI
/// sequence when color is enabled and vanishes otherwise (`^^` is a
/// literal caret either way); a tag span between the reserved open and
/// close bytes is rewritten as a secure-locked MXP tag when MXP is on and
/// stripped when it is off.
pub fn encode(text: &str, opts: &TelnetOptions) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 8);
    let mut in_tag = false;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        match byte {
            b'\n' => {
                out.extend_from_slice(b"\r\n");
                i += 1;
            }
            b'^' => {
                let Some(&code) = bytes.get(i + 1) else {
                    // dangling caret at end of input is dropped
                    break;
                };
                if code == b'^' {
                    out.push(b'^');
                } else if opts.color_enabled() {
                    if let Some(seq) = super::color::sequence(code, opts.color) {
                        out.extend_from_slice(seq.as_bytes());
                    }
                }
                i += 2;
            }
            mxp::TAG_OPEN => {
                if opts.mxp {
                    out.extend_from_slice(mxp::SECURE_OPEN);
                    out.push(b'<');
                }
                in_tag = true;
                i += 1;
            }
            mxp::TAG_CLOSE => {
                if opts.mxp {
                    out.push(b'>');
                    out.extend_from_slice(mxp::LOCK_CLOSE);
                }
                in_tag = false;
                i += 1;
            }
            _ => {
                if !in_tag || opts.mxp {
                    out.push(byte);
                }
                i += 1;
            }
        }
    }
    out
}

/// Remove telnet framing from wire bytes: negotiation triplets, prompt
/// markers, and complete subnegotiation blocks. Doubled IACs collapse to
/// one data byte. Incomplete trailing framing is left untouched.
pub fn strip_telnet(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != IAC {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let Some(&command) = bytes.get(i + 1) else {
            out.push(bytes[i]);
            break;
        };
        match command {
            IAC => {
                out.push(IAC);
                i += 2;
            }
            WILL | WONT | DO | DONT => {
                if i + 2 < bytes.len() {
                    i += 3;
                } else {
                    // truncated triplet, keep as-is
                    out.extend_from_slice(&bytes[i..]);
                    break;
                }
            }
            SB => {
                // skip only a complete block
                let mut j = i + 2;
                let mut end = None;
                while j + 1 < bytes.len() {
                    if bytes[j] == IAC && bytes[j + 1] == SE {
                        end = Some(j + 2);
                        break;
                    }
                    j += 1;
                }
                match end {
                    Some(end) => i = end,
                    None => {
                        out.extend_from_slice(&bytes[i..]);
                        break;
                    }
                }
            }
            EOR | GA => {
                i += 2;
            }
            _ => {
                // other two-byte commands
                i += 2;
            }
        }
    }
    out
}

/// True when the buffer holds anything beyond telnet framing, meaning a
/// prompt should follow it.
pub fn needs_prompt(bytes: &[u8]) -> bool {
    !strip_telnet(bytes).is_empty()
}
