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

//! Per-connection protocol engine
//!
//! `Connection` owns everything one client needs: the negotiation state
//! machine, capabilities, line assembler, pager, MSDP reporting table,
//! compressor, and outbound queues. The surrounding task awaits socket
//! readiness and then drives it through `receive`, `next_command`, the
//! `queue_*` methods, and `flush` — all non-blocking.

use crate::compress::CompressionStream;
use crate::error::EngineError;
use crate::input::InputLineAssembler;
use crate::metrics::ByteCounters;
use crate::output::encoder;
use crate::pager::Pager;
use crate::sidechannel::{msdp, mssp};
use crate::telnet::negotiation::{Effect, Negotiator};
use crate::telnet::options::{TeloptRecord, TelnetOptions};
use crate::telnet::protocol;
use bytes::{Buf, BytesMut};
use std::sync::Arc;
use std::time::Instant;

use crate::transport::Transport;

/// Per-connection knobs handed down from configuration
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Name announced over MSDP and MSSP
    pub server_id: String,
    /// Legacy-client recovery heuristics
    pub compat_shims: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            server_id: String::from("Mudgate"),
            compat_shims: true,
        }
    }
}

/// Outcome of one non-blocking read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Peer closed the connection
    Closed,
    /// This many raw bytes were consumed
    Read(usize),
    /// Nothing ready
    Blocked,
}

/// One client connection's complete protocol state
pub struct Connection<T: Transport> {
    transport: T,
    opts: TelnetOptions,
    negotiator: Negotiator,
    assembler: InputLineAssembler,
    pager: Pager,
    reporter: msdp::MsdpReporter,
    compressor: Option<CompressionStream>,
    /// Uncompressed wire bytes awaiting the transport (always written
    /// ahead of anything newer)
    raw_pending: BytesMut,
    /// Encoded bytes awaiting the compressor; only populated while
    /// compression is active
    out_queue: BytesMut,
    counters: Arc<ByteCounters>,
    settings: ConnectionSettings,
    last_activity: Instant,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, settings: ConnectionSettings, counters: Arc<ByteCounters>) -> Self {
        Connection {
            transport,
            opts: TelnetOptions::new(),
            negotiator: Negotiator::new(settings.compat_shims),
            assembler: InputLineAssembler::new(),
            pager: Pager::new(),
            reporter: msdp::MsdpReporter::new(),
            compressor: None,
            raw_pending: BytesMut::new(),
            out_queue: BytesMut::new(),
            counters,
            settings,
            last_activity: Instant::now(),
        }
    }

    /// Queue the opening negotiation offers
    pub fn start(&mut self) {
        self.queue_bytes(&protocol::initial_offer());
    }

    /// Restore capabilities saved from a previous connection and queue
    /// the re-offers for what must be renegotiated.
    pub fn restore(&mut self, record: &TeloptRecord) {
        let reoffer = record.apply(&mut self.opts);
        self.queue_bytes(&reoffer);
    }

    /// Snapshot the persistable capabilities
    pub fn capture(&self) -> TeloptRecord {
        TeloptRecord::capture(&self.opts)
    }

    /// One non-blocking read, fed through the negotiation machine.
    pub fn receive(&mut self) -> Result<ReadStatus, EngineError> {
        let mut buf = [0u8; 1024];
        let n = match self.transport.try_read(&mut buf) {
            Ok(0) => return Ok(ReadStatus::Closed),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                return Ok(ReadStatus::Blocked);
            }
            Err(e) => return Err(e.into()),
        };
        self.counters.add_in(n as u64);
        self.last_activity = Instant::now();

        let (decoded, effects) = self.negotiator.feed(&buf[..n], &mut self.opts);
        for effect in effects {
            self.apply_effect(effect)?;
        }
        self.assembler.feed(&decoded);
        Ok(ReadStatus::Read(n))
    }

    fn apply_effect(&mut self, effect: Effect) -> Result<(), EngineError> {
        match effect {
            Effect::Send(bytes) => self.queue_bytes(&bytes),
            Effect::StartCompression(mode) => {
                if self.compressor.is_none() {
                    tracing::info!(?mode, "compression started");
                    // marker goes out plain; everything after it rides
                    // the compressed stream
                    self.raw_pending
                        .extend_from_slice(&protocol::compress_marker(mode));
                    self.compressor = Some(CompressionStream::new(mode));
                    self.opts.begin_compression(mode);
                }
            }
            Effect::EndCompression => self.end_compression()?,
            Effect::MsdpPayload(payload) => {
                let replies =
                    msdp::handle_payload(&payload, &mut self.reporter, &self.settings.server_id);
                for reply in replies {
                    self.queue_bytes(&reply);
                }
            }
            Effect::SendServerId => {
                let frame = msdp::encode_pair("SERVER_ID", &self.settings.server_id);
                self.queue_bytes(&frame);
            }
            Effect::SendMsspBlock => {
                let block = mssp::MsspInfo::new(&self.settings.server_id).encode();
                self.queue_bytes(&block);
            }
        }
        Ok(())
    }

    /// Finish the compressed stream; a no-op when not compressing.
    fn end_compression(&mut self) -> Result<(), EngineError> {
        let Some(mut compressor) = self.compressor.take() else {
            return Ok(());
        };
        tracing::info!("compression ended");
        // everything queued for the compressor goes through it first
        while !self.out_queue.is_empty() {
            let n = compressor.write(&self.out_queue, &mut self.transport, &self.counters)?;
            self.out_queue.advance(n);
            if n == 0 {
                break;
            }
        }
        if !self.out_queue.is_empty() {
            // transport stalled mid-teardown; the unconsumed tail has not
            // entered the compressor, carry it uncompressed
            let tail = self.out_queue.split();
            let residual = compressor.finish(&mut self.transport, &self.counters)?;
            self.raw_pending.extend_from_slice(&residual);
            self.raw_pending.extend_from_slice(&tail);
        } else {
            let residual = compressor.finish(&mut self.transport, &self.counters)?;
            self.raw_pending.extend_from_slice(&residual);
        }
        self.opts.end_compression();
        Ok(())
    }

    /// Next completed command line. Pager continuation keystrokes are
    /// intercepted here and never reach the dispatcher.
    pub fn next_command(&mut self) -> Option<String> {
        loop {
            let line = self.assembler.next_command()?;
            if !self.pager.is_active() {
                return Some(line);
            }
            let rows = self.opts.term.rows;
            let released = self.pager.continuation(rows, line.trim());
            for page_line in &released {
                let text = format!("{}\n", page_line);
                self.queue_output(&text);
            }
            if self.pager.is_active() {
                self.queue_output("^W[MORE]^x ");
            }
        }
    }

    /// Encode marked-up text and queue it for the client
    pub fn queue_output(&mut self, markup: &str) {
        let bytes = encoder::encode(markup, &self.opts);
        self.queue_bytes(&bytes);
    }

    /// Queue a large text through the pager, releasing the first page
    /// immediately.
    pub fn queue_paged(&mut self, markup: &str) {
        self.pager.append(markup);
        let rows = self.opts.term.rows;
        // only the room left on the open page; the rest waits for [MORE]
        let room = Pager::batch_size(rows).saturating_sub(self.pager.released());
        let lines = self.pager.release(room);
        let shown = !lines.is_empty();
        for line in lines {
            let text = format!("{}\n", line);
            self.queue_output(&text);
        }
        if shown && self.pager.is_active() {
            self.queue_output("^W[MORE]^x ");
        }
    }

    /// Queue the prompt terminator if real output precedes it: IAC EOR
    /// when negotiated, IAC GA otherwise.
    pub fn queue_prompt(&mut self) {
        let pending_text =
            encoder::needs_prompt(&self.raw_pending) || encoder::needs_prompt(&self.out_queue);
        if !pending_text {
            return;
        }
        if self.opts.eor {
            self.queue_bytes(&protocol::PROMPT_EOR);
        } else {
            self.queue_bytes(&protocol::PROMPT_GA);
        }
    }

    /// Queue raw wire bytes on the path compression dictates
    fn queue_bytes(&mut self, bytes: &[u8]) {
        if self.compressor.is_some() {
            self.out_queue.extend_from_slice(bytes);
        } else {
            self.raw_pending.extend_from_slice(bytes);
        }
    }

    /// Push queued output to the transport without blocking. Bytes the
    /// transport declines stay queued for the next call.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        // the plain tail always goes first
        while !self.raw_pending.is_empty() {
            match self.transport.try_write(&self.raw_pending) {
                Ok(0) => {
                    return Err(EngineError::Transport(std::io::Error::from(
                        std::io::ErrorKind::WriteZero,
                    )));
                }
                Ok(n) => {
                    self.counters.add_out(n as u64);
                    self.raw_pending.advance(n);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(compressor) = self.compressor.as_mut() {
            if !self.out_queue.is_empty() {
                let n = compressor.write(&self.out_queue, &mut self.transport, &self.counters)?;
                self.out_queue.advance(n);
            }
            compressor.flush(&mut self.transport, &self.counters)?;
        }
        Ok(())
    }

    /// True while any output is queued or staged
    pub fn has_pending_output(&self) -> bool {
        !self.raw_pending.is_empty()
            || !self.out_queue.is_empty()
            || self.compressor.as_ref().is_some_and(|c| c.has_pending())
    }

    pub fn options(&self) -> &TelnetOptions {
        &self.opts
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Instant of the last completed read, for idle policy upstairs
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }
}
