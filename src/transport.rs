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

//! Non-blocking transport abstraction
//!
//! The engine never blocks: reads and writes go through `Transport`,
//! which surfaces `WouldBlock` instead of suspending. The connection task
//! awaits socket readiness at the edge and then drives the engine with
//! these non-blocking calls.

use std::io;
use tokio::io::Interest;
use tokio::net::TcpStream;

/// Byte-level non-blocking transport
pub trait Transport {
    /// Read available bytes; `WouldBlock` when none are ready
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write bytes, possibly partially; `WouldBlock` when none fit
    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// TCP transport over a tokio stream
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        TcpTransport { stream }
    }

    /// Await stream readiness; the readable/writable flags drive which
    /// engine paths run next.
    pub async fn ready(&self, interest: Interest) -> io::Result<tokio::io::Ready> {
        self.stream.ready(interest).await
    }

    pub fn peer_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.stream.peer_addr()
    }
}

impl Transport for TcpTransport {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.try_read(buf)
    }

    fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.try_write(buf)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Transport;
    use std::collections::VecDeque;
    use std::io;

    /// Scripted transport for engine tests.
    ///
    /// The write pattern cycles: each entry caps how many bytes one
    /// `try_write` accepts, a zero entry means `WouldBlock`. An empty
    /// pattern accepts everything.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        written: Vec<u8>,
        pattern: Vec<usize>,
        calls: usize,
        readable: VecDeque<u8>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_write_pattern(pattern: Vec<usize>) -> Self {
            MockTransport {
                pattern,
                ..Default::default()
            }
        }

        /// Every byte the transport accepted, in order
        pub fn written(&self) -> &[u8] {
            &self.written
        }

        pub fn clear_written(&mut self) {
            self.written.clear();
        }

        /// Queue bytes for the engine to read
        pub fn push_readable(&mut self, bytes: &[u8]) {
            self.readable.extend(bytes);
        }
    }

    impl Transport for MockTransport {
        fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.readable.is_empty() {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let mut n = 0;
            while n < buf.len() {
                match self.readable.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }

        fn try_write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let cap = if self.pattern.is_empty() {
                usize::MAX
            } else {
                let cap = self.pattern[self.calls % self.pattern.len()];
                self.calls += 1;
                cap
            };
            if cap == 0 {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let n = cap.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_tcp_transport_round_trip() {
        tokio_test::block_on(async {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            let mut client = TcpStream::connect(addr).await.unwrap();
            let (server, _) = listener.accept().await.unwrap();
            let mut transport = TcpTransport::new(server);

            client.write_all(b"hello").await.unwrap();
            transport.ready(Interest::READABLE).await.unwrap();
            let mut buf = [0u8; 16];
            let n = transport.try_read(&mut buf).unwrap();
            assert_eq!(&buf[..n], b"hello");

            transport.ready(Interest::WRITABLE).await.unwrap();
            let n = transport.try_write(b"world").unwrap();
            assert!(n > 0);
        });
    }

    #[test]
    fn test_mock_write_pattern() {
        use testing::MockTransport;
        let mut mock = MockTransport::with_write_pattern(vec![2, 0]);
        assert_eq!(mock.try_write(b"abcdef").unwrap(), 2);
        assert_eq!(
            mock.try_write(b"cdef").unwrap_err().kind(),
            std::io::ErrorKind::WouldBlock
        );
        assert_eq!(mock.try_write(b"cdef").unwrap(), 2);
        assert_eq!(mock.written(), b"abcd");
    }
}
