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

//! Telnet protocol constants and wire sequence builders
//!
//! This module defines the telnet command bytes (RFC 854/855), the MUD
//! option set the engine negotiates, and helpers for building the canned
//! negotiation and subnegotiation sequences the engine sends.

use crate::telnet::options::CompressMode;

/// Interpret As Command
pub const IAC: u8 = 255;
/// Don't do option
pub const DONT: u8 = 254;
/// Do option
pub const DO: u8 = 253;
/// Won't do option
pub const WONT: u8 = 252;
/// Will do option
pub const WILL: u8 = 251;
/// Subnegotiation begin
pub const SB: u8 = 250;
/// Go ahead
pub const GA: u8 = 249;
/// Interrupt process
pub const IP: u8 = 244;
/// No operation
pub const NOP: u8 = 241;
/// Subnegotiation end
pub const SE: u8 = 240;
/// End of record (command form, paired with the EOR option)
pub const EOR: u8 = 239;

/// TTYPE subnegotiation qualifier: client reports a terminal type
pub const TELQUAL_IS: u8 = 0;
/// TTYPE subnegotiation qualifier: server requests a terminal type
pub const TELQUAL_SEND: u8 = 1;

/// CHARSET subnegotiation: request a charset list
pub const CHARSET_REQUEST: u8 = 1;
/// CHARSET subnegotiation: client accepted a charset
pub const CHARSET_ACCEPTED: u8 = 2;
/// CHARSET subnegotiation: client rejected the offered charsets
pub const CHARSET_REJECTED: u8 = 3;

/// Telnet option codes the engine negotiates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelnetOption {
    /// Echo
    Echo = 1,
    /// Terminal type
    TerminalType = 24,
    /// End of record
    EndOfRecord = 25,
    /// Negotiate about window size (NAWS)
    NAWS = 31,
    /// Charset negotiation (RFC 2066)
    Charset = 42,
    /// MSDP (MUD Server Data Protocol)
    MSDP = 69,
    /// MSSP (MUD Server Status Protocol)
    MSSP = 70,
    /// MCCP v1 (MUD Client Compression Protocol)
    Compress = 85,
    /// MCCP v2
    Compress2 = 86,
    /// MSP (MUD Sound Protocol)
    MSP = 90,
    /// MXP (MUD eXtension Protocol)
    MXP = 91,
    /// GMCP (Generic MUD Communication Protocol)
    GMCP = 201,
}

impl TelnetOption {
    /// Convert byte to telnet option
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Echo),
            24 => Some(Self::TerminalType),
            25 => Some(Self::EndOfRecord),
            31 => Some(Self::NAWS),
            42 => Some(Self::Charset),
            69 => Some(Self::MSDP),
            70 => Some(Self::MSSP),
            85 => Some(Self::Compress),
            86 => Some(Self::Compress2),
            90 => Some(Self::MSP),
            91 => Some(Self::MXP),
            201 => Some(Self::GMCP),
            _ => None,
        }
    }

    /// Convert option to byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Build a three-byte negotiation sequence (IAC verb option)
pub fn build_negotiation(verb: u8, option: TelnetOption) -> Vec<u8> {
    vec![IAC, verb, option.to_byte()]
}

/// Build a subnegotiation sequence, doubling any IAC bytes in the payload
pub fn build_subnegotiation(option: TelnetOption, data: &[u8]) -> Vec<u8> {
    let mut result = vec![IAC, SB, option.to_byte()];

    for &byte in data {
        result.push(byte);
        if byte == IAC {
            result.push(byte);
        }
    }

    result.push(IAC);
    result.push(SE);

    result
}

/// Query the client for its (next) terminal type
pub fn ttype_query() -> Vec<u8> {
    vec![IAC, SB, TelnetOption::TerminalType.to_byte(), TELQUAL_SEND, IAC, SE]
}

/// Offer the UTF-8 charset after the client announces CHARSET support
pub fn charset_offer() -> Vec<u8> {
    let mut result = vec![IAC, SB, TelnetOption::Charset.to_byte(), CHARSET_REQUEST];
    result.extend_from_slice(b" UTF-8");
    result.push(IAC);
    result.push(SE);
    result
}

/// Subnegotiation that switches the client into MXP mode
pub fn mxp_start() -> Vec<u8> {
    vec![IAC, SB, TelnetOption::MXP.to_byte(), IAC, SE]
}

/// The marker that precedes the compressed stream.
///
/// MCCP v1 predates the corrected framing and closes its start marker with
/// WILL SE rather than IAC SE; v2 uses regular subnegotiation framing.
pub fn compress_marker(mode: CompressMode) -> Vec<u8> {
    match mode {
        CompressMode::V1 => vec![IAC, SB, TelnetOption::Compress.to_byte(), WILL, SE],
        _ => vec![IAC, SB, TelnetOption::Compress2.to_byte(), IAC, SE],
    }
}

/// The single option offered on connect. Everything else waits for the
/// terminal-type response proving the client negotiates at all.
pub fn initial_offer() -> Vec<u8> {
    build_negotiation(DO, TelnetOption::TerminalType)
}

/// The option cascade sent once a client proves it understands negotiation.
///
/// Order matters: compression is offered first so everything after it can
/// ride the compressed stream, v2 ahead of v1 so capable clients pick v2.
pub fn option_cascade() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend(build_negotiation(WILL, TelnetOption::Compress2));
    out.extend(build_negotiation(WILL, TelnetOption::Compress));
    out.extend(build_negotiation(DO, TelnetOption::NAWS));
    out.extend(build_negotiation(WILL, TelnetOption::MSDP));
    out.extend(build_negotiation(WILL, TelnetOption::MSSP));
    out.extend(build_negotiation(WILL, TelnetOption::MSP));
    out.extend(build_negotiation(WILL, TelnetOption::MXP));
    out.extend(build_negotiation(WILL, TelnetOption::EndOfRecord));
    out.extend(build_negotiation(DO, TelnetOption::Charset));
    out
}

/// Prompt terminator when the client negotiated EOR
pub const PROMPT_EOR: [u8; 2] = [IAC, EOR];
/// Prompt terminator for everyone else
pub const PROMPT_GA: [u8; 2] = [IAC, GA];
