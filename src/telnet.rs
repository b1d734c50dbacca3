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

//! Telnet protocol support
//!
//! Wire constants and frame builders, per-connection capability state, the
//! inbound negotiation state machine, and MXP markup handling:
//! - Basic telnet option negotiation (RFC 854/855)
//! - MCCP v1/v2 (MUD Client Compression Protocol)
//! - MSDP hand-off to the sidechannel layer
//! - NAWS (Negotiate About Window Size)
//! - TTYPE polling and terminal capability detection
//! - CHARSET, EOR, MSP, and MXP

pub mod mxp;
pub mod negotiation;
pub mod options;
pub mod protocol;
