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

//! Mudgate Protocol Engine Library
//!
//! This library provides the per-connection telnet protocol engine for a
//! MUD-style text game server: option negotiation, MCCP compression, MSDP
//! and MSSP sidechannels, MXP markup, caret color rendering, input line
//! assembly, and output paging.

pub mod compress;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod metrics;
pub mod output;
pub mod pager;
pub mod server;
pub mod sidechannel;
pub mod telnet;
pub mod transport;

// Re-export commonly used types
pub use connection::{Connection, ConnectionSettings, ReadStatus};
pub use dispatch::CommandDispatcher;
pub use error::EngineError;
pub use metrics::ByteCounters;
pub use server::TelnetServer;
pub use sidechannel::msdp;
pub use telnet::options::{ColorLevel, TelnetOptions, TeloptRecord};
pub use transport::{TcpTransport, Transport};
