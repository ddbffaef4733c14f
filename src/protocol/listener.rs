// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-connection accept loop.
//!
//! One task owns the listener, the registry and the scheduler. Each loop
//! iteration ticks the devices that are due, then waits for whichever
//! comes first: a connection, the next due tick, or shutdown. A
//! connection is served to completion (read, dispatch, write, close)
//! before the next accept, so device state never needs a lock.

use std::future::Future;
use std::io;
use std::net::{Shutdown, SocketAddr};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::Instant;

use super::{Reply, http};
use crate::error::Result;
use crate::manager::{DeviceRegistry, Scheduler};

/// Default idle time allowed between two reads of one request.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5);

/// Default cap on the size of a request.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 8192;

/// Wake-up period when no device is registered.
const IDLE_WAKE: Duration = Duration::from_secs(1);

const CHUNK_SIZE: usize = 2048;

/// Most bytes dropped after an oversized request before closing anyway.
const DISCARD_LIMIT: usize = 64 * 1024;

/// Transport limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Longest wait for the next chunk of a request.
    pub read_timeout: Duration,
    /// Requests larger than this are rejected with a 400 reply.
    pub max_request_bytes: usize,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

enum Wake {
    Shutdown,
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Tick,
}

/// A bound Alpaca server.
///
/// # Examples
///
/// ```no_run
/// use alpaca_hub::manager::{DeviceRegistry, ServerInfo};
/// use alpaca_hub::protocol::{ListenerOptions, Server};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> alpaca_hub::Result<()> {
///     let registry = DeviceRegistry::new(ServerInfo::default());
///     let server = Server::bind("0.0.0.0:6800", registry, ListenerOptions::default()).await?;
///
///     let registry = server
///         .run_until(async {
///             let _ = tokio::signal::ctrl_c().await;
///         })
///         .await;
///     registry.log_usage();
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    registry: DeviceRegistry,
    scheduler: Scheduler,
    options: ListenerOptions,
}

impl Server {
    /// Binds the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the address cannot be bound.
    pub async fn bind(
        addr: impl ToSocketAddrs,
        registry: DeviceRegistry,
        options: ListenerOptions,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            registry,
            scheduler: Scheduler::new(),
            options,
        })
    }

    /// Address actually bound, useful with port 0.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the socket has no local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The devices being served.
    #[must_use]
    pub const fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Serves requests and ticks devices until `shutdown` completes, then
    /// hands the registry back.
    pub async fn run_until<F>(mut self, shutdown: F) -> DeviceRegistry
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            addr = ?self.listener.local_addr().ok(),
            devices = self.registry.len(),
            "Alpaca server listening"
        );

        loop {
            let now = Instant::now();
            self.scheduler.run_due(&mut self.registry, now);
            let wake_at = self.scheduler.next_due().unwrap_or(now + IDLE_WAKE);

            let wake = tokio::select! {
                () = &mut shutdown => Wake::Shutdown,
                accepted = self.listener.accept() => Wake::Accepted(accepted),
                () = tokio::time::sleep_until(wake_at) => Wake::Tick,
            };

            match wake {
                Wake::Shutdown => break,
                Wake::Accepted(Ok((stream, peer))) => {
                    self.serve(stream, peer).await;
                    self.scheduler.wake_all(Instant::now());
                }
                Wake::Accepted(Err(err)) => tracing::warn!(error = %err, "Accept failed"),
                Wake::Tick => {}
            }
        }

        tracing::info!("Alpaca server stopped");
        self.registry
    }

    async fn serve(&mut self, mut stream: TcpStream, peer: SocketAddr) {
        let reply = match read_request(&mut stream, &self.options).await {
            Ok(Incoming::Request(raw)) => self.registry.handle_raw(&raw, Instant::now()),
            Ok(Incoming::Closed) => {
                tracing::debug!(%peer, "Connection closed without a request");
                return;
            }
            Ok(Incoming::Oversized) => {
                let limit = self.options.max_request_bytes;
                tracing::warn!(%peer, limit, "Request exceeds size limit, rejected");
                discard_pending(&mut stream, &self.options).await;
                Reply::BadRequest(format!("request exceeds {limit} bytes"))
            }
            Err(err) => {
                tracing::warn!(%peer, error = %err, "Read failed, dropping connection");
                return;
            }
        };

        if let Err(err) = stream.write_all(reply.into_http().as_bytes()).await {
            tracing::warn!(%peer, error = %err, "Write failed");
        }
        if let Err(err) = stream.flush().await {
            tracing::debug!(%peer, error = %err, "Flush failed");
        }
        close(stream, peer);
    }
}

/// What the read phase produced.
#[derive(Debug, PartialEq, Eq)]
enum Incoming {
    /// Request bytes, complete or cut by the idle timeout.
    Request(Vec<u8>),
    /// The peer sent nothing.
    Closed,
    /// The request did not fit in the size cap.
    Oversized,
}

/// Reads until the peer stops sending, a full request has arrived or the
/// read timeout elapses. A request that reaches the size cap without
/// being complete is reported as oversized, never handed on cut short.
async fn read_request(stream: &mut TcpStream, options: &ListenerOptions) -> io::Result<Incoming> {
    let mut request = Vec::with_capacity(CHUNK_SIZE);
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let Ok(read) = tokio::time::timeout(options.read_timeout, stream.read(&mut chunk)).await
        else {
            break;
        };
        let n = read?;
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);
        if request.len() > options.max_request_bytes {
            return Ok(Incoming::Oversized);
        }
        if http::is_complete(&request) {
            break;
        }
        if request.len() == options.max_request_bytes {
            return Ok(Incoming::Oversized);
        }
    }

    if request.is_empty() {
        Ok(Incoming::Closed)
    } else {
        Ok(Incoming::Request(request))
    }
}

/// Reads and drops whatever the peer is still sending, so closing the
/// socket does not reset the connection before the reply is read.
async fn discard_pending(stream: &mut TcpStream, options: &ListenerOptions) {
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut budget = DISCARD_LIMIT;
    while budget > 0 {
        match tokio::time::timeout(options.read_timeout, stream.read(&mut chunk)).await {
            Ok(Ok(n)) if n > 0 => budget = budget.saturating_sub(n),
            _ => break,
        }
    }
}

fn close(stream: TcpStream, peer: SocketAddr) {
    match stream.into_std() {
        Ok(stream) => {
            if let Err(err) = stream.shutdown(Shutdown::Both) {
                tracing::debug!(%peer, error = %err, "Shutdown failed");
            }
        }
        Err(err) => tracing::debug!(%peer, error = %err, "Could not detach socket"),
    }
}
