// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Every accepted connection carries exactly one request and gets its own
//! task, so a long `Execute` never blocks a `Cancel` for the same process.

mod query;

use std::sync::Arc;
use std::time::Instant;

use cg_engine::Gateway;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::protocol::{self, ProtocolError, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Shared by every connection task
pub struct ListenCtx {
    pub gateway: Gateway,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: ListenCtx) -> Self {
        Self {
            socket,
            ctx: Arc::new(ctx),
        }
    }

    /// Accept until the runtime shuts down, one task per connection.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
                                    debug!("Client disconnected")
                                }
                                ConnectionError::Protocol(ProtocolError::Timeout) => {
                                    warn!("Connection timeout")
                                }
                                _ => error!("Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let response = match protocol::read_request::<Request, _>(&mut reader, DEFAULT_TIMEOUT).await
    {
        Ok(request) => {
            // Listing requests are polled; everything else is worth an info line
            if matches!(
                request,
                Request::Ping | Request::Status | Request::ListSessions | Request::ListProcesses
            ) {
                debug!(request = ?request, "received request");
            } else {
                tracing::info!(request = ?request, "received request");
            }
            handle_request(request, ctx).await
        }
        // Well-framed but unreadable: tell the client instead of hanging up
        Err(ProtocolError::Json(e)) => {
            warn!(error = %e, "malformed request");
            Response::Error {
                message: format!("malformed request: {e}"),
            }
        }
        Err(e) => return Err(e.into()),
    };

    debug!("Sending response: {:?}", response);
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

/// Handle a single request and return a response.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    let gateway = &ctx.gateway;
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "version mismatch");
            }
            Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            }
        }

        Request::Status => query::status(gateway, ctx.start_time),

        Request::Shutdown { kill } => {
            if kill {
                let cancelled = gateway.cancel_all().await;
                tracing::info!(cancelled, "cancelled tracked executions before shutdown");
            }
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::Execute { request } => Response::Executed {
            report: gateway.execute(request).await,
        },

        Request::Cancel { process_id } => Response::Cancelled {
            report: gateway.cancel(&process_id).await,
        },

        Request::Probe { request } => Response::Probed {
            report: gateway.probe(request).await,
        },

        Request::ListSessions => query::sessions(gateway),

        Request::ListProcesses => query::processes(gateway),
    }
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
