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

//! Telnet negotiation state machine
//!
//! `Negotiator` consumes the raw bytes of one read, one state transition
//! per byte, and produces the decoded plain-text bytes plus a list of
//! effects for the connection to carry out (replies to send, compression
//! to start or stop, sidechannel payloads to dispatch). Capability flags
//! are updated on the caller-supplied `TelnetOptions` as negotiation
//! progresses. Any unrecognized transition resynchronizes to `Idle`.

use crate::telnet::mxp;
use crate::telnet::options::{ColorLevel, CompressMode, TelnetOptions};
use crate::telnet::protocol::{
    self, CHARSET_ACCEPTED, CHARSET_REJECTED, DO, DONT, IAC, SB, SE, TELQUAL_IS, TelnetOption,
    WILL, WONT,
};

/// Cap on buffered subnegotiation payload; larger frames are dropped and
/// the machine resynchronizes.
pub const MAX_SUBNEG_LEN: usize = 8192;

const ESC: u8 = 0x1b;

/// Side effects a transition asks the connection to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Queue these bytes for the client
    Send(Vec<u8>),
    /// Send the compression marker and begin compressing
    StartCompression(CompressMode),
    /// Finish the compressed stream
    EndCompression,
    /// Completed MSDP subnegotiation payload to dispatch
    MsdpPayload(Vec<u8>),
    /// Client enabled MSDP; announce ourselves
    SendServerId,
    /// Client asked for the server status block
    SendMsspBlock,
}

/// FSM position between bytes
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Plain data
    Idle,
    /// Saw IAC
    Iac,
    /// Saw IAC WILL, expecting an option byte
    Will,
    /// Saw IAC WONT
    Wont,
    /// Saw IAC DO
    Do,
    /// Saw IAC DONT
    Dont,
    /// Saw IAC SB, expecting the option byte
    SubnegOption,
    /// Accumulating subnegotiation payload for `option`
    Subneg { option: u8, iac: bool },
    /// Reading the four NAWS geometry bytes
    Naws { idx: usize, bytes: [u8; 4], iac: bool },
    /// Saw ESC in plain data, watching for the MXP secure escape
    MxpEsc1,
    /// Saw ESC [
    MxpEsc2,
    /// Saw ESC [ 1
    MxpEsc3,
    /// Buffering the raw MXP secure line up to a newline
    MxpConsume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Will,
    Wont,
    Do,
    Dont,
}

/// Per-connection negotiation engine
#[derive(Debug)]
pub struct Negotiator {
    state: State,
    buffer: Vec<u8>,
    /// One-shot watch for a stray SE after a NAWS row value of 255
    watch_stray_se: bool,
    /// The option cascade is sent at most once per connection
    cascade_sent: bool,
    /// TTYPE polling stopped after a repeated value
    ttype_done: bool,
    /// Legacy-client recovery heuristics enabled
    compat_shims: bool,
}

impl Negotiator {
    pub fn new(compat_shims: bool) -> Self {
        Negotiator {
            state: State::Idle,
            buffer: Vec::new(),
            watch_stray_se: false,
            cascade_sent: false,
            ttype_done: false,
            compat_shims,
        }
    }

    /// Process the bytes from one read.
    ///
    /// Returns the decoded plain-text bytes and the effects to apply, in
    /// the order they arose. Always terminates once the input is consumed.
    pub fn feed(
        &mut self,
        input: &[u8],
        opts: &mut TelnetOptions,
    ) -> (Vec<u8>, Vec<Effect>) {
        let mut decoded = Vec::with_capacity(input.len());
        let mut effects = Vec::new();
        for &byte in input {
            self.step(byte, opts, &mut decoded, &mut effects);
        }
        (decoded, effects)
    }

    fn step(
        &mut self,
        byte: u8,
        opts: &mut TelnetOptions,
        decoded: &mut Vec<u8>,
        effects: &mut Vec<Effect>,
    ) {
        if self.watch_stray_se {
            self.watch_stray_se = false;
            if self.state == State::Idle && byte == SE {
                tracing::debug!("swallowed stray SE after NAWS row value of 255");
                return;
            }
        }

        self.state = match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => match byte {
                IAC => State::Iac,
                ESC => State::MxpEsc1,
                _ => {
                    decoded.push(byte);
                    State::Idle
                }
            },
            State::Iac => match byte {
                IAC => {
                    // doubled IAC is one literal data byte
                    decoded.push(IAC);
                    State::Idle
                }
                WILL => State::Will,
                WONT => State::Wont,
                DO => State::Do,
                DONT => State::Dont,
                SB => State::SubnegOption,
                // NOP, GA, IP, stray SE and anything unknown
                _ => State::Idle,
            },
            State::Will => {
                self.respond(Verb::Will, byte, opts, effects);
                State::Idle
            }
            State::Wont => {
                self.respond(Verb::Wont, byte, opts, effects);
                State::Idle
            }
            State::Do => {
                self.respond(Verb::Do, byte, opts, effects);
                State::Idle
            }
            State::Dont => {
                self.respond(Verb::Dont, byte, opts, effects);
                State::Idle
            }
            State::SubnegOption => {
                self.buffer.clear();
                if byte == TelnetOption::NAWS.to_byte() {
                    State::Naws {
                        idx: 0,
                        bytes: [0; 4],
                        iac: false,
                    }
                } else {
                    State::Subneg {
                        option: byte,
                        iac: false,
                    }
                }
            }
            State::Subneg { option, iac } => {
                if iac {
                    match byte {
                        SE => {
                            self.complete_subneg(option, opts, effects);
                            State::Idle
                        }
                        IAC => {
                            self.buffer.push(IAC);
                            State::Subneg { option, iac: false }
                        }
                        _ => {
                            tracing::debug!(option, byte, "malformed subnegotiation framing");
                            self.buffer.clear();
                            State::Idle
                        }
                    }
                } else if byte == IAC {
                    State::Subneg { option, iac: true }
                } else if self.buffer.len() >= MAX_SUBNEG_LEN {
                    tracing::warn!(option, "subnegotiation payload over limit, dropped");
                    self.buffer.clear();
                    State::Idle
                } else {
                    self.buffer.push(byte);
                    State::Subneg { option, iac: false }
                }
            }
            State::Naws { idx, mut bytes, iac } => {
                if iac {
                    if byte == IAC {
                        // properly doubled data IAC
                        bytes[idx] = IAC;
                        self.naws_advance(idx, bytes, opts)
                    } else if byte == SE {
                        tracing::debug!("truncated NAWS subnegotiation");
                        State::Idle
                    } else if self.compat_shims {
                        // the client failed to double an IAC data byte;
                        // take the IAC as data and reprocess this byte
                        tracing::debug!("undoubled IAC inside NAWS payload, recovering");
                        bytes[idx] = IAC;
                        self.state = self.naws_advance(idx, bytes, opts);
                        return self.step(byte, opts, decoded, effects);
                    } else {
                        State::Idle
                    }
                } else if byte == IAC {
                    State::Naws { idx, bytes, iac: true }
                } else {
                    bytes[idx] = byte;
                    self.naws_advance(idx, bytes, opts)
                }
            }
            State::MxpEsc1 => {
                if byte == b'[' {
                    State::MxpEsc2
                } else {
                    decoded.push(ESC);
                    self.state = State::Idle;
                    return self.step(byte, opts, decoded, effects);
                }
            }
            State::MxpEsc2 => {
                if byte == b'1' {
                    State::MxpEsc3
                } else {
                    decoded.extend_from_slice(&[ESC, b'[']);
                    self.state = State::Idle;
                    return self.step(byte, opts, decoded, effects);
                }
            }
            State::MxpEsc3 => {
                if byte == b'z' {
                    self.buffer.clear();
                    State::MxpConsume
                } else {
                    decoded.extend_from_slice(&[ESC, b'[', b'1']);
                    self.state = State::Idle;
                    return self.step(byte, opts, decoded, effects);
                }
            }
            State::MxpConsume => {
                if byte == b'\n' || byte == b'\r' {
                    let line = String::from_utf8_lossy(&self.buffer).into_owned();
                    mxp::apply_secure_line(&line, opts);
                    self.buffer.clear();
                    State::Idle
                } else if self.buffer.len() >= MAX_SUBNEG_LEN {
                    tracing::warn!("MXP secure line over limit, dropped");
                    self.buffer.clear();
                    State::Idle
                } else {
                    self.buffer.push(byte);
                    State::MxpConsume
                }
            }
        };
    }

    /// Store one NAWS geometry byte; on the fourth, apply the geometry.
    fn naws_advance(&mut self, idx: usize, bytes: [u8; 4], opts: &mut TelnetOptions) -> State {
        if idx < 3 {
            return State::Naws {
                idx: idx + 1,
                bytes,
                iac: false,
            };
        }

        let cols = u16::from_be_bytes([bytes[0], bytes[1]]);
        let rows = u16::from_be_bytes([bytes[2], bytes[3]]);
        if cols > 0 {
            opts.term.cols = cols;
        }
        if rows > 0 {
            opts.term.rows = rows;
        }
        tracing::debug!(cols, rows, "window size updated");

        if self.compat_shims && rows == 255 {
            // A row value of 255 was probably an undoubled IAC that ate
            // the terminator's IAC; watch for its orphaned SE.
            self.watch_stray_se = true;
            State::Idle
        } else {
            // consume the trailing IAC SE through the generic path
            State::Subneg {
                option: TelnetOption::NAWS.to_byte(),
                iac: false,
            }
        }
    }

    /// React to a WILL/WONT/DO/DONT for `option`.
    fn respond(&mut self, verb: Verb, option: u8, opts: &mut TelnetOptions, effects: &mut Vec<Effect>) {
        // any response at all proves the client negotiates
        opts.dumb = false;

        match TelnetOption::from_byte(option) {
            Some(TelnetOption::TerminalType) => match verb {
                Verb::Will => {
                    opts.raise_color(ColorLevel::Ansi);
                    effects.push(Effect::Send(protocol::ttype_query()));
                    self.cascade(effects);
                }
                Verb::Wont => {
                    // even a refusal proves the client talks ANSI telnet
                    opts.raise_color(ColorLevel::Ansi);
                    effects.push(Effect::Send(vec![IAC, WONT, option]));
                    self.cascade(effects);
                }
                _ => {}
            },
            Some(TelnetOption::Compress2) => match verb {
                Verb::Do if !opts.compressing => {
                    effects.push(Effect::StartCompression(CompressMode::V2));
                }
                Verb::Dont if opts.compress_mode == CompressMode::V2 => {
                    effects.push(Effect::EndCompression);
                }
                _ => {}
            },
            Some(TelnetOption::Compress) => match verb {
                Verb::Do if !opts.compressing => {
                    effects.push(Effect::StartCompression(CompressMode::V1));
                }
                Verb::Dont if opts.compress_mode == CompressMode::V1 => {
                    effects.push(Effect::EndCompression);
                }
                _ => {}
            },
            Some(TelnetOption::NAWS) => match verb {
                Verb::Will => opts.naws = true,
                Verb::Wont => opts.naws = false,
                _ => {}
            },
            Some(TelnetOption::MSDP) => match verb {
                Verb::Do => {
                    opts.msdp = true;
                    tracing::info!("msdp enabled");
                    effects.push(Effect::SendServerId);
                }
                Verb::Dont | Verb::Wont => opts.msdp = false,
                _ => {}
            },
            Some(TelnetOption::MSSP) => {
                if verb == Verb::Do {
                    effects.push(Effect::SendMsspBlock);
                }
            }
            Some(TelnetOption::MSP) => match verb {
                Verb::Do => opts.msp = true,
                Verb::Dont => opts.msp = false,
                _ => {}
            },
            Some(TelnetOption::MXP) => match verb {
                Verb::Will | Verb::Do => {
                    if !opts.mxp {
                        opts.mxp = true;
                        tracing::info!("mxp enabled");
                        effects.push(Effect::Send(protocol::mxp_start()));
                    }
                }
                Verb::Wont | Verb::Dont => opts.mxp = false,
            },
            Some(TelnetOption::EndOfRecord) => match verb {
                Verb::Do => opts.eor = true,
                Verb::Dont => opts.eor = false,
                _ => {}
            },
            Some(TelnetOption::Charset) => match verb {
                Verb::Will => {
                    opts.charset = true;
                    effects.push(Effect::Send(protocol::charset_offer()));
                }
                Verb::Wont => opts.charset = false,
                _ => {}
            },
            Some(TelnetOption::GMCP) => {
                // negotiated but payloads are discarded at completion
                if verb == Verb::Wont || verb == Verb::Dont {
                    tracing::debug!("gmcp declined");
                }
            }
            Some(TelnetOption::Echo) | None => match verb {
                // protocol-correct refusal, stream continues
                Verb::Will => {
                    effects.push(Effect::Send(vec![IAC, DONT, option]));
                }
                Verb::Do => {
                    effects.push(Effect::Send(vec![IAC, WONT, option]));
                }
                _ => {}
            },
        }
    }

    /// Offer the remaining options, once, after the first TTYPE response.
    fn cascade(&mut self, effects: &mut Vec<Effect>) {
        if !self.cascade_sent {
            self.cascade_sent = true;
            effects.push(Effect::Send(protocol::option_cascade()));
        }
    }

    fn complete_subneg(&mut self, option: u8, opts: &mut TelnetOptions, effects: &mut Vec<Effect>) {
        match TelnetOption::from_byte(option) {
            Some(TelnetOption::TerminalType) => self.handle_ttype(opts, effects),
            Some(TelnetOption::MSDP) => {
                effects.push(Effect::MsdpPayload(std::mem::take(&mut self.buffer)));
            }
            Some(TelnetOption::GMCP) => {
                tracing::debug!(len = self.buffer.len(), "gmcp frame discarded");
            }
            Some(TelnetOption::Charset) => match self.buffer.first() {
                Some(&CHARSET_ACCEPTED) => {
                    opts.utf8 = true;
                    tracing::info!("client accepted UTF-8");
                }
                Some(&CHARSET_REJECTED) => opts.utf8 = false,
                _ => {}
            },
            Some(TelnetOption::NAWS) => {
                // geometry was applied byte-wise; nothing left to do
            }
            _ => {
                tracing::debug!(option, len = self.buffer.len(), "unhandled subnegotiation");
            }
        }
        self.buffer.clear();
    }

    /// One TTYPE response from the polling cycle.
    ///
    /// The client is re-queried until it repeats either the first value or
    /// the immediately prior one, which marks the end of its alias list.
    fn handle_ttype(&mut self, opts: &mut TelnetOptions, effects: &mut Vec<Effect>) {
        let Some((&TELQUAL_IS, name)) = self.buffer.split_first() else {
            return;
        };
        let name = String::from_utf8_lossy(name).trim().to_string();
        if name.is_empty() {
            return;
        }

        tracing::debug!(term = %name, "terminal type reported");
        upgrade_color_for_term(&name, opts);
        opts.term.term_type = name.clone();

        if self.ttype_done {
            return;
        }
        if opts.term.first_type.is_empty() {
            opts.term.first_type = name.clone();
            opts.term.last_type = name;
            effects.push(Effect::Send(protocol::ttype_query()));
        } else if name == opts.term.first_type || name == opts.term.last_type {
            self.ttype_done = true;
        } else {
            opts.term.last_type = name;
            effects.push(Effect::Send(protocol::ttype_query()));
        }
    }
}

/// Terminal types that reveal 256-color support
fn upgrade_color_for_term(name: &str, opts: &mut TelnetOptions) {
    let lower = name.to_ascii_lowercase();
    if lower.contains("-256color") || lower == "emacs-rinzai" || lower.starts_with("decafmud") {
        opts.raise_color(ColorLevel::Xterm256);
    } else if let Some(rest) = lower.strip_prefix("mudlet") {
        // Mudlet reports "Mudlet <version>"; 256 colors arrived after 1.1
        if mxp::parse_version(rest.trim()) > (1, 1) {
            opts.raise_color(ColorLevel::Xterm256);
        }
    }
}
