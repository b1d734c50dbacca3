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

//! MSDP (MUD Server Data Protocol) Implementation
//!
//! This module parses completed MSDP subnegotiation payloads, dispatches
//! the client's commands (SEND, LIST, REPORT, UNREPORT, RESET), maintains
//! the per-connection reporting table, and encodes outgoing variable
//! frames. MSDP uses telnet option 69.
//!
//! Reference: https://tintin.mudhalla.net/protocols/msdp/

use crate::telnet::protocol::{IAC, SB, SE, TelnetOption};
use std::collections::HashMap;

/// MSDP payload markers
pub const MSDP_VAR: u8 = 1;
pub const MSDP_VAL: u8 = 2;
pub const MSDP_TABLE_OPEN: u8 = 3;
pub const MSDP_TABLE_CLOSE: u8 = 4;
pub const MSDP_ARRAY_OPEN: u8 = 5;
pub const MSDP_ARRAY_CLOSE: u8 = 6;

/// Commands a client may issue over MSDP
const COMMANDS: &[&str] = &["LIST", "REPORT", "SEND", "UNREPORT", "RESET"];

/// Variables this server answers for
const REPORTABLE_VARIABLES: &[&str] = &["SERVER_ID"];

/// Per-connection table of variables the client asked to have reported
#[derive(Debug, Default)]
pub struct MsdpReporter {
    reported: HashMap<String, String>,
}

impl MsdpReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable for continuous reporting
    pub fn report(&mut self, name: &str, current: &str) {
        self.reported.insert(name.to_string(), current.to_string());
    }

    /// Stop reporting a variable
    pub fn unreport(&mut self, name: &str) {
        self.reported.remove(name);
    }

    /// Drop the whole reporting table
    pub fn reset(&mut self) {
        self.reported.clear();
    }

    pub fn is_reported(&self, name: &str) -> bool {
        self.reported.contains_key(name)
    }

    /// Record a new value; returns the update frame when the value changed
    /// for a reported variable.
    pub fn update(&mut self, name: &str, value: &str) -> Option<Vec<u8>> {
        let entry = self.reported.get_mut(name)?;
        if entry == value {
            return None;
        }
        *entry = value.to_string();
        Some(encode_pair(name, value))
    }
}

/// Parse the `VAR name VAL value` pairs of a completed payload.
///
/// Table and array markers inside a value adjust a nesting counter; VAR
/// and VAL only delimit at depth zero, so nested structures are captured
/// whole. Malformed input stops the parse silently, yielding whatever was
/// complete up to that point.
pub fn parse_pairs(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut pairs = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        if data[pos] != MSDP_VAR {
            break;
        }
        pos += 1;

        let name_start = pos;
        while pos < data.len() && data[pos] != MSDP_VAL && data[pos] != MSDP_VAR {
            pos += 1;
        }
        if pos >= data.len() || data[pos] != MSDP_VAL {
            break;
        }
        let name = String::from_utf8_lossy(&data[name_start..pos]).into_owned();

        // one VAR may carry several VALs; each becomes its own pair
        while pos < data.len() && data[pos] == MSDP_VAL {
            pos += 1;
            let value_start = pos;
            let mut depth: i32 = 0;
            while pos < data.len() {
                match data[pos] {
                    MSDP_TABLE_OPEN | MSDP_ARRAY_OPEN => depth += 1,
                    MSDP_TABLE_CLOSE | MSDP_ARRAY_CLOSE => depth -= 1,
                    MSDP_VAR | MSDP_VAL if depth == 0 => break,
                    _ => {}
                }
                pos += 1;
            }
            if depth != 0 {
                // unbalanced nesting, stop silently
                return pairs;
            }
            pairs.push((name.clone(), data[value_start..pos].to_vec()));
        }
    }

    pairs
}

/// Interpret a completed MSDP payload and produce the reply frames.
///
/// `server_id` is the value announced for the SERVER_ID variable.
pub fn handle_payload(
    data: &[u8],
    reporter: &mut MsdpReporter,
    server_id: &str,
) -> Vec<Vec<u8>> {
    let mut replies = Vec::new();

    for (name, value) in parse_pairs(data) {
        let value = String::from_utf8_lossy(&value).into_owned();
        match name.to_uppercase().as_str() {
            "SEND" => {
                if let Some(current) = lookup(&value, server_id) {
                    replies.push(encode_pair(&value, &current));
                } else {
                    tracing::debug!(var = %value, "msdp send for unknown variable");
                }
            }
            "LIST" => match value.to_uppercase().as_str() {
                "COMMANDS" => replies.push(encode_list("COMMANDS", COMMANDS)),
                "REPORTABLE_VARIABLES" | "SENDABLE_VARIABLES" => {
                    replies.push(encode_list(&value.to_uppercase(), REPORTABLE_VARIABLES));
                }
                _ => replies.push(encode_list(&value.to_uppercase(), &[])),
            },
            "REPORT" => {
                if let Some(current) = lookup(&value, server_id) {
                    reporter.report(&value, &current);
                    replies.push(encode_pair(&value, &current));
                }
            }
            "UNREPORT" => reporter.unreport(&value),
            "RESET" => reporter.reset(),
            other => {
                tracing::debug!(var = %other, "unhandled msdp variable");
            }
        }
    }

    replies
}

fn lookup(name: &str, server_id: &str) -> Option<String> {
    match name.to_uppercase().as_str() {
        "SERVER_ID" => Some(server_id.to_string()),
        _ => None,
    }
}

/// Encode a single variable frame: IAC SB MSDP VAR name VAL value IAC SE
pub fn encode_pair(name: &str, value: &str) -> Vec<u8> {
    let mut result = vec![IAC, SB, TelnetOption::MSDP.to_byte()];
    result.push(MSDP_VAR);
    result.extend_from_slice(name.as_bytes());
    result.push(MSDP_VAL);
    result.extend_from_slice(value.as_bytes());
    result.push(IAC);
    result.push(SE);
    result
}

/// Encode a variable whose value is an array of strings
pub fn encode_list(name: &str, items: &[&str]) -> Vec<u8> {
    let mut result = vec![IAC, SB, TelnetOption::MSDP.to_byte()];
    result.push(MSDP_VAR);
    result.extend_from_slice(name.as_bytes());
    result.push(MSDP_VAL);
    result.push(MSDP_ARRAY_OPEN);
    for item in items {
        result.push(MSDP_VAL);
        result.extend_from_slice(item.as_bytes());
    }
    result.push(MSDP_ARRAY_CLOSE);
    result.push(IAC);
    result.push(SE);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_pair() {
        let data = b"\x01X\x02Y";
        let pairs = parse_pairs(data);
        assert_eq!(pairs, vec![("X".to_string(), b"Y".to_vec())]);
    }

    #[test]
    fn test_parse_nested_table_captured_whole() {
        // VAR "ROOM" VAL TABLE_OPEN VAR "NAME" VAL "inn" TABLE_CLOSE
        let mut data = vec![MSDP_VAR];
        data.extend_from_slice(b"ROOM");
        data.push(MSDP_VAL);
        data.push(MSDP_TABLE_OPEN);
        data.push(MSDP_VAR);
        data.extend_from_slice(b"NAME");
        data.push(MSDP_VAL);
        data.extend_from_slice(b"inn");
        data.push(MSDP_TABLE_CLOSE);

        let pairs = parse_pairs(&data);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "ROOM");
        // the whole table, inner markers included
        assert_eq!(pairs[0].1[0], MSDP_TABLE_OPEN);
        assert_eq!(*pairs[0].1.last().unwrap(), MSDP_TABLE_CLOSE);
    }

    #[test]
    fn test_parse_multiple_vals_for_one_var() {
        let data = b"\x01REPORT\x02HEALTH\x02MANA";
        let pairs = parse_pairs(data);
        assert_eq!(
            pairs,
            vec![
                ("REPORT".to_string(), b"HEALTH".to_vec()),
                ("REPORT".to_string(), b"MANA".to_vec()),
            ]
        );
    }

    #[test]
    fn test_parse_unbalanced_stops_silently() {
        let mut data = vec![MSDP_VAR];
        data.extend_from_slice(b"ROOM");
        data.push(MSDP_VAL);
        data.push(MSDP_TABLE_OPEN);
        data.extend_from_slice(b"dangling");
        assert!(parse_pairs(&data).is_empty());
    }

    #[test]
    fn test_parse_garbage_prefix() {
        assert!(parse_pairs(b"\x02oops").is_empty());
        assert!(parse_pairs(b"").is_empty());
    }

    #[test]
    fn test_handle_send_server_id() {
        let mut reporter = MsdpReporter::new();
        let data = b"\x01SEND\x02SERVER_ID";
        let replies = handle_payload(data, &mut reporter, "Mudgate");
        assert_eq!(replies, vec![encode_pair("SERVER_ID", "Mudgate")]);
    }

    #[test]
    fn test_handle_list_commands() {
        let mut reporter = MsdpReporter::new();
        let data = b"\x01LIST\x02COMMANDS";
        let replies = handle_payload(data, &mut reporter, "Mudgate");
        assert_eq!(replies, vec![encode_list("COMMANDS", COMMANDS)]);
    }

    #[test]
    fn test_report_unreport_cycle() {
        let mut reporter = MsdpReporter::new();
        let replies = handle_payload(b"\x01REPORT\x02SERVER_ID", &mut reporter, "Mudgate");
        assert_eq!(replies.len(), 1);
        assert!(reporter.is_reported("SERVER_ID"));

        // unchanged value produces no update
        assert!(reporter.update("SERVER_ID", "Mudgate").is_none());
        // changed value does
        let update = reporter.update("SERVER_ID", "Mudgate2");
        assert_eq!(update, Some(encode_pair("SERVER_ID", "Mudgate2")));

        handle_payload(b"\x01UNREPORT\x02SERVER_ID", &mut reporter, "Mudgate");
        assert!(!reporter.is_reported("SERVER_ID"));
    }

    #[test]
    fn test_reset_clears_table() {
        let mut reporter = MsdpReporter::new();
        reporter.report("SERVER_ID", "Mudgate");
        handle_payload(b"\x01RESET\x02REPORTABLE_VARIABLES", &mut reporter, "Mudgate");
        assert!(!reporter.is_reported("SERVER_ID"));
    }

    #[test]
    fn test_encode_pair_framing() {
        let frame = encode_pair("SERVER_ID", "Mudgate");
        assert_eq!(frame[0], IAC);
        assert_eq!(frame[1], SB);
        assert_eq!(frame[2], 69);
        assert_eq!(frame[3], MSDP_VAR);
        assert_eq!(&frame[4..13], b"SERVER_ID");
        assert_eq!(frame[13], MSDP_VAL);
        assert_eq!(&frame[14..21], b"Mudgate");
        assert_eq!(frame[frame.len() - 2], IAC);
        assert_eq!(frame[frame.len() - 1], SE);
    }
}
