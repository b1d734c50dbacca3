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

//! MCCP compression stream
//!
//! Once MCCP is negotiated every outbound byte runs through a streaming
//! zlib deflate with a fixed staging buffer. Writes are non-blocking: when
//! the transport declines bytes, the exact unwritten remainder stays in
//! the staging buffer and is the first thing written on the next flush.
//! The stream is flushed in sync mode per write so the client can decode
//! what it has, and finished when compression ends.

use crate::error::EngineError;
use crate::metrics::ByteCounters;
use crate::telnet::options::CompressMode;
use crate::transport::Transport;
use flate2::{Compress, Compression, FlushCompress, Status};

/// Size of the compressed-output staging buffer
pub const STAGING_SIZE: usize = 8192;

/// Streaming deflate wrapper for one connection
pub struct CompressionStream {
    compress: Compress,
    /// Compressed bytes awaiting the transport; never exceeds `limit`
    staging: Vec<u8>,
    limit: usize,
    mode: CompressMode,
    /// Input accepted since the last completed sync flush
    dirty: bool,
}

impl std::fmt::Debug for CompressionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionStream")
            .field("mode", &self.mode)
            .field("pending", &self.staging.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl CompressionStream {
    pub fn new(mode: CompressMode) -> Self {
        Self::with_staging_size(mode, STAGING_SIZE)
    }

    /// Staging size is overridable so tests can force would-block retries
    pub fn with_staging_size(mode: CompressMode, limit: usize) -> Self {
        CompressionStream {
            compress: Compress::new(Compression::new(9), true),
            staging: Vec::with_capacity(limit),
            limit,
            mode,
            dirty: false,
        }
    }

    pub fn mode(&self) -> CompressMode {
        self.mode
    }

    /// Compressed bytes still waiting on the transport
    pub fn has_pending(&self) -> bool {
        !self.staging.is_empty()
    }

    /// Feed uncompressed bytes and push compressed output downstream.
    ///
    /// Returns how many input bytes were consumed; the rest could not be
    /// accepted because the staging buffer is full behind a blocked
    /// transport, and must be offered again on the next flush.
    pub fn write(
        &mut self,
        data: &[u8],
        transport: &mut dyn Transport,
        counters: &ByteCounters,
    ) -> Result<usize, EngineError> {
        let mut consumed = 0;
        while consumed < data.len() {
            self.try_drain(transport, counters)?;
            let free = self.limit - self.staging.len();
            if free == 0 {
                // staging full behind a blocked transport
                break;
            }
            let (din, dout, _) = self.compress_step(&data[consumed..], free, FlushCompress::None)?;
            consumed += din;
            if din == 0 && dout == 0 {
                break;
            }
        }
        self.try_drain(transport, counters)?;
        if consumed > 0 {
            self.dirty = true;
        }
        counters.add_uncompressed(consumed as u64);
        Ok(consumed)
    }

    /// Sync-flush pending input so the client can decode everything
    /// written so far, then push staged output downstream.
    ///
    /// Returns true once nothing is left pending. With no input accepted
    /// since the last completed flush this only drains the staging
    /// buffer, emitting nothing new.
    pub fn flush(
        &mut self,
        transport: &mut dyn Transport,
        counters: &ByteCounters,
    ) -> Result<bool, EngineError> {
        while self.dirty {
            self.try_drain(transport, counters)?;
            let free = self.limit - self.staging.len();
            if free == 0 {
                return Ok(false);
            }
            let (_, dout, _) = self.compress_step(&[], free, FlushCompress::Sync)?;
            if dout < free {
                // the deflater emptied its pending output; a repeat call
                // would only emit empty-block padding
                self.dirty = false;
            }
        }
        self.try_drain(transport, counters)?;
        Ok(self.staging.is_empty())
    }

    /// Finish the deflate stream.
    ///
    /// Residual compressed bytes the transport would not take are returned
    /// to the caller to write ahead of any further plain output; the
    /// compressor itself is released when `self` is dropped.
    pub fn finish(
        mut self,
        transport: &mut dyn Transport,
        counters: &ByteCounters,
    ) -> Result<Vec<u8>, EngineError> {
        loop {
            self.try_drain(transport, counters)?;
            let free = self.limit - self.staging.len();
            if free == 0 {
                // blocked downstream; grow past the limit to hold the tail
                self.staging.reserve(STAGING_SIZE);
                self.limit = self.staging.capacity();
                continue;
            }
            let (_, dout, status) = self.compress_step(&[], free, FlushCompress::Finish)?;
            if status == Status::StreamEnd {
                break;
            }
            if dout == 0 {
                break;
            }
        }
        self.try_drain(transport, counters)?;
        Ok(std::mem::take(&mut self.staging))
    }

    /// One call into the deflater, appending output to the staging buffer.
    fn compress_step(
        &mut self,
        input: &[u8],
        free: usize,
        flush: FlushCompress,
    ) -> Result<(usize, usize, Status), EngineError> {
        let before_in = self.compress.total_in();
        let before_out = self.compress.total_out();
        let len = self.staging.len();
        self.staging.resize(len + free, 0);
        let status = self
            .compress
            .compress(input, &mut self.staging[len..], flush)
            .map_err(|e| EngineError::Compression(e.to_string()))?;
        let din = (self.compress.total_in() - before_in) as usize;
        let dout = (self.compress.total_out() - before_out) as usize;
        self.staging.truncate(len + dout);
        Ok((din, dout, status))
    }

    /// Write staged bytes until drained or the transport declines.
    fn try_drain(
        &mut self,
        transport: &mut dyn Transport,
        counters: &ByteCounters,
    ) -> Result<usize, EngineError> {
        let mut total = 0;
        while !self.staging.is_empty() {
            match transport.try_write(&self.staging) {
                Ok(0) => {
                    return Err(EngineError::Transport(std::io::Error::from(
                        std::io::ErrorKind::WriteZero,
                    )));
                }
                Ok(n) => {
                    counters.add_out(n as u64);
                    self.staging.drain(..n);
                    total += n;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }
}
