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

//! Byte counters
//!
//! Shared, injected traffic counters. Each counter is incremented exactly
//! once per byte actually read, written, or fed to the compressor — never
//! estimated.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide traffic counters, shared via `Arc`
#[derive(Debug, Default)]
pub struct ByteCounters {
    bytes_in: AtomicU64,
    bytes_out: AtomicU64,
    uncompressed_out: AtomicU64,
}

impl ByteCounters {
    pub fn add_in(&self, n: u64) {
        self.bytes_in.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_out(&self, n: u64) {
        self.bytes_out.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_uncompressed(&self, n: u64) {
        self.uncompressed_out.fetch_add(n, Ordering::Relaxed);
    }

    /// Bytes read from clients
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in.load(Ordering::Relaxed)
    }

    /// Bytes written to clients, post-compression
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out.load(Ordering::Relaxed)
    }

    /// Bytes fed to the compressor, pre-compression
    pub fn uncompressed_out(&self) -> u64 {
        self.uncompressed_out.load(Ordering::Relaxed)
    }
}
