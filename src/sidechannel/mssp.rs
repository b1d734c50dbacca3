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

//! MSSP (MUD Server Status Protocol) block encoding
//!
//! Crawlers send `IAC DO MSSP` and receive one subnegotiation carrying
//! name/value pairs describing the server. MSSP uses telnet option 70.

use crate::telnet::protocol::{IAC, SB, SE, TelnetOption};

/// MSSP payload markers
pub const MSSP_VAR: u8 = 1;
pub const MSSP_VAL: u8 = 2;

/// The status variables advertised to MSSP crawlers
#[derive(Debug, Clone)]
pub struct MsspInfo {
    pub name: String,
    pub players: u32,
    pub uptime_secs: u64,
}

impl MsspInfo {
    pub fn new(name: &str) -> Self {
        MsspInfo {
            name: name.to_string(),
            players: 0,
            uptime_secs: 0,
        }
    }

    /// Encode the full status block: IAC SB MSSP (VAR name VAL value)* IAC SE
    pub fn encode(&self) -> Vec<u8> {
        let pairs: &[(&str, String)] = &[
            ("NAME", self.name.clone()),
            ("PLAYERS", self.players.to_string()),
            ("UPTIME", self.uptime_secs.to_string()),
            ("CODEBASE", String::from("mudgate")),
            ("ANSI", String::from("1")),
            ("XTERM 256 COLORS", String::from("1")),
            ("UTF-8", String::from("1")),
            ("MCCP", String::from("1")),
            ("MSDP", String::from("1")),
            ("MSP", String::from("1")),
            ("MXP", String::from("1")),
        ];

        let mut result = vec![IAC, SB, TelnetOption::MSSP.to_byte()];
        for (name, value) in pairs {
            result.push(MSSP_VAR);
            result.extend_from_slice(name.as_bytes());
            result.push(MSSP_VAL);
            result.extend_from_slice(value.as_bytes());
        }
        result.push(IAC);
        result.push(SE);
        result
    }
}
