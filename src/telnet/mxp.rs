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

//! MXP (MUD eXtension Protocol) secure-line handling
//!
//! MXP-capable clients answer the server's mode switch with a secure line:
//! the escape `ESC [ 1 z` arriving in the plain data stream, followed by
//! pseudo-attributes (`CLIENT=`, `VERSION=`, `SUPPORT=`) up to a newline.
//! This module parses that line and applies what it reveals about the
//! client to the connection capabilities.

use crate::telnet::options::{ColorLevel, TelnetOptions};

/// Escape that opens a secure (server-controlled) MXP span
pub const SECURE_OPEN: &[u8] = b"\x1b[1z";
/// Escape that locks the line back to open mode
pub const LOCK_CLOSE: &[u8] = b"\x1b[7z";

/// Internal markup byte opening an MXP tag span
pub const TAG_OPEN: u8 = 0x16;
/// Internal markup byte closing an MXP tag span
pub const TAG_CLOSE: u8 = 0x04;

/// Pseudo-attributes extracted from a client's MXP secure line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SecureAttributes {
    pub client: String,
    pub version: String,
    pub support: String,
}

/// Extract the `CLIENT=`, `VERSION=` and `SUPPORT=` attributes from a
/// secure line. Values are the alphanumeric/dot run following the key,
/// terminated by any other character.
pub fn parse_secure_line(line: &str) -> SecureAttributes {
    SecureAttributes {
        client: attribute(line, "CLIENT="),
        version: attribute(line, "VERSION="),
        support: attribute(line, "SUPPORT="),
    }
}

fn attribute(line: &str, key: &str) -> String {
    let upper = line.to_ascii_uppercase();
    let Some(start) = upper.find(key).map(|i| i + key.len()) else {
        return String::new();
    };
    line[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}

/// Apply a parsed secure line to the connection capabilities.
///
/// Clients whose 256-color support postdates their MXP support are
/// recognized by name and version here rather than via TTYPE.
pub fn apply_secure_line(line: &str, opts: &mut TelnetOptions) {
    let attrs = parse_secure_line(line);
    opts.mxp_client_secure = true;

    if attrs.client.is_empty() && attrs.version.is_empty() {
        return;
    }
    tracing::info!(client = %attrs.client, version = %attrs.version, "mxp client identified");

    if !attrs.client.is_empty() {
        opts.term.client = attrs.client.clone();
    }
    if !attrs.version.is_empty() {
        opts.term.version = attrs.version.clone();
    }

    let version = parse_version(&attrs.version);
    match attrs.client.to_ascii_lowercase().as_str() {
        "mushclient" if version >= (4, 2) => opts.raise_color(ColorLevel::Xterm256),
        "cmud" if version >= (3, 4) => opts.raise_color(ColorLevel::Xterm256),
        "atlantis" => opts.raise_color(ColorLevel::Xterm256),
        _ => {}
    }
}

/// Lenient `major.minor` parse; anything unparseable compares as 0
pub(crate) fn parse_version(text: &str) -> (u32, u32) {
    let mut parts = text.split('.');
    let major = parts
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    let minor = parts
        .next()
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    (major, minor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secure_line() {
        let attrs = parse_secure_line("<VERSION MXP=1.0 CLIENT=MUSHclient VERSION=4.73 SUPPORT=+send>");
        assert_eq!(attrs.client, "MUSHclient");
        assert_eq!(attrs.version, "4.73");
    }

    #[test]
    fn test_attribute_terminates_on_non_token() {
        let attrs = parse_secure_line("CLIENT=cmud> VERSION=3.22\r");
        assert_eq!(attrs.client, "cmud");
        assert_eq!(attrs.version, "3.22");
    }

    #[test]
    fn test_missing_attributes_are_empty() {
        let attrs = parse_secure_line("nothing useful here");
        assert_eq!(attrs, SecureAttributes::default());
    }

    #[test]
    fn test_version_thresholds() {
        let mut opts = TelnetOptions::new();
        apply_secure_line("CLIENT=MUSHclient VERSION=4.02", &mut opts);
        assert_eq!(opts.color, ColorLevel::Xterm256);
        assert!(opts.mxp_client_secure);

        let mut opts = TelnetOptions::new();
        apply_secure_line("CLIENT=MUSHclient VERSION=4.01", &mut opts);
        assert_eq!(opts.color, ColorLevel::None);

        let mut opts = TelnetOptions::new();
        apply_secure_line("CLIENT=cmud VERSION=3.04", &mut opts);
        assert_eq!(opts.color, ColorLevel::Xterm256);

        // Atlantis gets 256 colors at any version
        let mut opts = TelnetOptions::new();
        apply_secure_line("CLIENT=Atlantis VERSION=0.9", &mut opts);
        assert_eq!(opts.color, ColorLevel::Xterm256);
    }

    #[test]
    fn test_parse_version_lenient() {
        assert_eq!(parse_version("4.73"), (4, 73));
        assert_eq!(parse_version("4"), (4, 0));
        assert_eq!(parse_version(""), (0, 0));
        assert_eq!(parse_version("beta"), (0, 0));
    }
}
