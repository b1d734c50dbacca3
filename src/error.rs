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

//! Engine error types
//!
//! Malformed protocol input never surfaces here — the state machine
//! resynchronizes instead. Errors are reserved for the conditions that
//! tear a connection down: transport failure and deflate failure.

use thiserror::Error;

/// Fatal per-connection failures
#[derive(Debug, Error)]
pub enum EngineError {
    /// Transport failure other than would-block
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Deflate failure; the stream can no longer be trusted
    #[error("compression error: {0}")]
    Compression(String),
}
