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

//! End-to-end tests driving a live server over real TCP sockets.

use mudgate::TelnetServer;
use mudgate::config::Configuration;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const IAC: u8 = 255;
const WILL: u8 = 251;
const DO: u8 = 253;
const SB: u8 = 250;
const SE: u8 = 240;
const OPT_TTYPE: u8 = 24;
const OPT_COMPRESS2: u8 = 86;
const TELQUAL_IS: u8 = 0;

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = TelnetServer::new(&Configuration::default());
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    addr
}

/// Read from the client until `needle` appears in the collected bytes.
async fn read_until(client: &mut TcpStream, collected: &mut Vec<u8>, needle: &[u8]) {
    let mut buf = [0u8; 1024];
    loop {
        if collected
            .windows(needle.len())
            .any(|window| window == needle)
        {
            return;
        }
        let n = client.read(&mut buf).await.unwrap();
        assert!(n > 0, "server closed before {:?} arrived", needle);
        collected.extend_from_slice(&buf[..n]);
    }
}

#[tokio::test]
async fn test_initial_offer_and_banner() {
    let addr = spawn_server().await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    let mut collected = Vec::new();
    read_until(&mut client, &mut collected, b"Mudgate").await;

    // the terminal-type offer precedes the banner
    assert!(collected.starts_with(&[IAC, DO, OPT_TTYPE]));
}

#[tokio::test]
async fn test_capable_client_gets_colored_output() {
    let addr = spawn_server().await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    let mut collected = Vec::new();
    read_until(&mut client, &mut collected, b"Mudgate").await;

    // accepting TTYPE triggers the query and the option cascade
    client.write_all(&[IAC, WILL, OPT_TTYPE]).await.unwrap();
    let mut collected = Vec::new();
    read_until(
        &mut client,
        &mut collected,
        &[IAC, SB, OPT_TTYPE, 1, IAC, SE],
    )
    .await;
    // the cascade offers compression
    read_until(&mut client, &mut collected, &[IAC, WILL, OPT_COMPRESS2]).await;

    // answer the terminal type query twice with the same value to end polling
    let mut reply = vec![IAC, SB, OPT_TTYPE, TELQUAL_IS];
    reply.extend_from_slice(b"xterm-256color");
    reply.extend_from_slice(&[IAC, SE]);
    client.write_all(&reply).await.unwrap();
    client.write_all(&reply).await.unwrap();

    // commands now come back with real ANSI color
    client.write_all(b"hail\r\n").await.unwrap();
    let mut collected = Vec::new();
    read_until(&mut client, &mut collected, b"You say, ").await;
    read_until(&mut client, &mut collected, b"\x1b[36mhail\x1b[0m").await;
}

#[tokio::test]
async fn test_compression_end_to_end() {
    let addr = spawn_server().await;
    let mut client = TcpStream::connect(addr).await.unwrap();

    let mut collected = Vec::new();
    read_until(&mut client, &mut collected, b"Mudgate").await;

    // request MCCP2: the marker arrives plain, everything after is deflate
    client.write_all(&[IAC, DO, OPT_COMPRESS2]).await.unwrap();
    let mut collected = Vec::new();
    read_until(
        &mut client,
        &mut collected,
        &[IAC, SB, OPT_COMPRESS2, IAC, SE],
    )
    .await;
    let marker_end = collected
        .windows(5)
        .position(|w| w == [IAC, SB, OPT_COMPRESS2, IAC, SE])
        .unwrap()
        + 5;
    let mut compressed: Vec<u8> = collected[marker_end..].to_vec();

    client.write_all(b"hello\r\n").await.unwrap();

    // collect compressed bytes until the echo inflates out of them; the
    // stream is sync-flushed, not finished, so inflate it manually
    let mut buf = [0u8; 1024];
    loop {
        let mut inflater = flate2::Decompress::new(true);
        let mut inflated = vec![0u8; 65536];
        let _ = inflater.decompress(&compressed, &mut inflated, flate2::FlushDecompress::Sync);
        let n = inflater.total_out() as usize;
        if String::from_utf8_lossy(&inflated[..n]).contains("You say, 'hello'") {
            break;
        }
        let n = client.read(&mut buf).await.unwrap();
        assert!(n > 0, "server closed before compressed echo arrived");
        compressed.extend_from_slice(&buf[..n]);
    }
}
