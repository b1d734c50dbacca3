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

//! Negotiated connection capabilities
//!
//! `TelnetOptions` is the per-connection record of everything negotiation
//! has established: color support, compression state, protocol flags, and
//! terminal geometry. `TeloptRecord` is the serializable subset that
//! survives a reconnect.

use crate::telnet::protocol::{self, TelnetOption, WILL};
use serde::{Deserialize, Serialize};

/// Color depth the client has demonstrated support for.
///
/// The level only moves upward: detection can upgrade, never downgrade.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColorLevel {
    /// No color sequences at all
    #[default]
    None,
    /// 16-color ANSI
    Ansi,
    /// 256-color xterm palette
    Xterm256,
}

/// Which MCCP generation the connection compresses with
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressMode {
    #[default]
    None,
    V1,
    V2,
}

/// Terminal identity and geometry reported by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermInfo {
    /// Terminal rows, from NAWS
    pub rows: u16,
    /// Terminal columns, from NAWS
    pub cols: u16,
    /// Most recent terminal type from TTYPE polling
    pub term_type: String,
    /// First terminal type seen, the anchor of the polling cycle
    pub first_type: String,
    /// Immediately prior terminal type in the polling cycle
    pub last_type: String,
    /// Client name from the MXP secure handshake
    pub client: String,
    /// Client version from the MXP secure handshake
    pub version: String,
}

impl Default for TermInfo {
    fn default() -> Self {
        TermInfo {
            rows: 40,
            cols: 82,
            term_type: String::from("dumb"),
            first_type: String::new(),
            last_type: String::new(),
            client: String::new(),
            version: String::new(),
        }
    }
}

/// Everything negotiation has established for one connection
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TelnetOptions {
    /// Detected color depth
    pub color: ColorLevel,
    /// Negotiated compression generation
    pub compress_mode: CompressMode,
    /// Whether the compressed stream is currently active
    pub compressing: bool,
    /// Client accepted MXP
    pub mxp: bool,
    /// Client completed the MXP secure handshake
    pub mxp_client_secure: bool,
    /// Client accepted MSDP
    pub msdp: bool,
    /// Client accepted MSP
    pub msp: bool,
    /// Client accepted end-of-record prompt marking
    pub eor: bool,
    /// Client reports window size
    pub naws: bool,
    /// Client supports CHARSET negotiation
    pub charset: bool,
    /// Client accepted the UTF-8 charset offer
    pub utf8: bool,
    /// No negotiation response observed yet; cleared permanently on the first
    pub dumb: bool,
    /// Terminal identity and geometry
    pub term: TermInfo,
}

impl TelnetOptions {
    pub fn new() -> Self {
        TelnetOptions {
            dumb: true,
            ..Default::default()
        }
    }

    /// Raise the color level; lower or equal levels are ignored
    pub fn raise_color(&mut self, level: ColorLevel) {
        if level > self.color {
            tracing::debug!(?level, "color level raised");
            self.color = level;
        }
    }

    /// True once any color sequences may be emitted
    pub fn color_enabled(&self) -> bool {
        self.color != ColorLevel::None
    }

    /// Record that the compressed stream is live
    pub fn begin_compression(&mut self, mode: CompressMode) {
        debug_assert!(mode != CompressMode::None);
        self.compress_mode = mode;
        self.compressing = true;
    }

    /// Record that the compressed stream has ended
    pub fn end_compression(&mut self) {
        self.compressing = false;
        self.compress_mode = CompressMode::None;
    }
}

/// Capability flags persisted across a reconnect.
///
/// Compression and MSDP are recorded but never applied directly: the
/// compressor's DEFLATE state is not serializable, so both are re-offered
/// and renegotiated on the new connection.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeloptRecord {
    pub mccp: bool,
    pub msdp: bool,
    pub mxp: bool,
    pub dumb: bool,
    pub term_type: String,
    pub color: ColorLevel,
    pub rows: u16,
    pub cols: u16,
    pub eor: bool,
    pub charset: bool,
    pub utf8: bool,
}

impl TeloptRecord {
    /// Snapshot the persistable capabilities of a connection
    pub fn capture(opts: &TelnetOptions) -> Self {
        TeloptRecord {
            mccp: opts.compressing,
            msdp: opts.msdp,
            mxp: opts.mxp,
            dumb: opts.dumb,
            term_type: opts.term.term_type.clone(),
            color: opts.color,
            rows: opts.term.rows,
            cols: opts.term.cols,
            eor: opts.eor,
            charset: opts.charset,
            utf8: opts.utf8,
        }
    }

    /// Apply a saved record to a fresh connection.
    ///
    /// Returns the negotiation bytes to send so the client re-establishes
    /// the capabilities that cannot simply be assumed (MCCP, MSDP).
    pub fn apply(&self, opts: &mut TelnetOptions) -> Vec<u8> {
        opts.mxp = self.mxp;
        opts.dumb = self.dumb;
        opts.term.term_type = self.term_type.clone();
        opts.color = self.color;
        opts.term.rows = self.rows;
        opts.term.cols = self.cols;
        opts.eor = self.eor;
        opts.charset = self.charset;
        opts.utf8 = self.utf8;

        let mut reoffer = Vec::new();
        if self.mccp {
            reoffer.extend(protocol::build_negotiation(WILL, TelnetOption::Compress2));
        }
        if self.msdp {
            reoffer.extend(protocol::build_negotiation(WILL, TelnetOption::MSDP));
        }
        reoffer
    }
}
