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

//! Telnet server
//!
//! Accept loop and per-connection task. Each task owns a `Connection`
//! engine and drives it off socket readiness; the engine itself never
//! awaits.

use crate::config::{Configuration, ProtocolConfig};
use crate::connection::{Connection, ConnectionSettings, ReadStatus};
use crate::dispatch::{CommandDispatcher, EchoDispatcher};
use crate::error::EngineError;
use crate::metrics::ByteCounters;
use crate::transport::TcpTransport;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::Interest;
use tokio::net::{TcpListener, TcpStream};

const BANNER: &str = "^WMudgate^x\nA telnet gateway is listening here.\n\n";

/// Telnet server
pub struct TelnetServer {
    settings: ConnectionSettings,
    idle_timeout: Option<Duration>,
    counters: Arc<ByteCounters>,
}

impl TelnetServer {
    /// Create a new telnet server
    pub fn new(config: &Configuration) -> Self {
        let ProtocolConfig {
            compat_shims,
            idle_timeout,
        } = config.protocol;

        TelnetServer {
            settings: ConnectionSettings {
                server_id: config.identity.name.to_string(),
                compat_shims,
            },
            idle_timeout: (idle_timeout > 0).then(|| Duration::from_secs(idle_timeout)),
            counters: Arc::new(ByteCounters::default()),
        }
    }

    /// Aggregate traffic counters across all connections
    pub fn counters(&self) -> Arc<ByteCounters> {
        Arc::clone(&self.counters)
    }

    /// Run the telnet server
    pub async fn run(self, listener: TcpListener) -> Result<(), EngineError> {
        tracing::info!("Telnet server accepting connections...");

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    tracing::info!("New telnet connection from {}", addr);

                    let settings = self.settings.clone();
                    let idle_timeout = self.idle_timeout;
                    let counters = Arc::clone(&self.counters);

                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, addr, settings, idle_timeout, counters).await
                        {
                            tracing::error!("Error handling telnet connection from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting telnet connection: {}", e);
                }
            }
        }
    }
}

/// Handle a single telnet connection
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    settings: ConnectionSettings,
    idle_timeout: Option<Duration>,
    counters: Arc<ByteCounters>,
) -> Result<(), EngineError> {
    stream.set_nodelay(true)?;
    let transport = TcpTransport::new(stream);
    let mut conn = Connection::new(transport, settings, counters);
    let mut dispatcher = EchoDispatcher;

    conn.start();
    conn.queue_output(BANNER);
    conn.queue_prompt();
    conn.flush()?;

    loop {
        let interest = if conn.has_pending_output() {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        };

        let ready = match idle_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, conn.transport().ready(interest)).await {
                    Ok(ready) => ready?,
                    Err(_) => {
                        tracing::info!("Telnet connection from {} idle, dropping", addr);
                        return Ok(());
                    }
                }
            }
            None => conn.transport().ready(interest).await?,
        };

        if ready.is_readable() {
            loop {
                match conn.receive()? {
                    ReadStatus::Read(_) => {}
                    ReadStatus::Blocked => break,
                    ReadStatus::Closed => {
                        tracing::info!("Telnet connection from {} closed", addr);
                        return Ok(());
                    }
                }
            }

            let mut replied = false;
            while let Some(command) = conn.next_command() {
                tracing::debug!("Processing command from {}: {}", addr, command);
                for reply in dispatcher.dispatch(&command) {
                    conn.queue_output(&reply);
                    replied = true;
                }
            }
            if replied {
                conn.queue_prompt();
            }
        }

        conn.flush()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;

    #[test]
    fn test_server_settings_from_config() {
        let config = Configuration::default();
        let server = TelnetServer::new(&config);
        assert_eq!(server.settings.server_id, "Mudgate");
        assert!(server.settings.compat_shims);
        assert!(server.idle_timeout.is_none());
    }

    #[test]
    fn test_banner_and_echo_round_trip() {
        tokio_test::block_on(async {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            let server_task = tokio::spawn(async move {
                let (stream, peer) = listener.accept().await.unwrap();
                let _ = handle_connection(
                    stream,
                    peer,
                    ConnectionSettings::default(),
                    None,
                    Arc::new(ByteCounters::default()),
                )
                .await;
            });

            let mut client = TcpStream::connect(addr).await.unwrap();
            client.write_all(b"hello there\r\n").await.unwrap();

            // read until the echo reply shows up
            let mut collected = Vec::new();
            let mut buf = [0u8; 512];
            loop {
                let n = client.read(&mut buf).await.unwrap();
                assert!(n > 0, "server closed early");
                collected.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&collected);
                if text.contains("You say, 'hello there'") {
                    break;
                }
            }

            // banner precedes the echo, color markup is stripped for a
            // client that negotiated nothing
            let text = String::from_utf8_lossy(&collected);
            assert!(text.contains("Mudgate"));
            assert!(!text.contains('^'));

            drop(client);
            server_task.abort();
        });
    }
}
