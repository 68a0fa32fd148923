// SPDX-License-Identifier: MIT

//! Identity service endpoint.
//!
//! Request/reply interface exposing ping / get_user / add_user against the
//! identity store, used by provider-adapter callers. Newline-delimited
//! JSON over TCP, one in-flight request per connection. A request that
//! cannot be parsed or handled is closed with no reply; the caller applies
//! its own retry/timeout policy.

pub mod messages;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::AppError;
use crate::AppState;
use messages::{Envelope, Reply, Request, STATUS_OK};

/// Serve identity requests on `listener` until the process exits.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(err) = serve_connection(socket, &state).await {
                        tracing::debug!(peer = %peer, error = %err, "Identity connection ended");
                    }
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "Identity endpoint accept failed");
            }
        }
    }
}

async fn serve_connection(socket: TcpStream, state: &AppState) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                // Malformed envelope: close the request with no reply.
                tracing::warn!(error = %err, "Dropping malformed identity request");
                return Ok(());
            }
        };

        let reply = match handle(state, request).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(error = %err, "Identity request failed");
                return Ok(());
            }
        };

        let mut encoded = serde_json::to_vec(&Envelope::new(reply))?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
    }

    Ok(())
}

/// Dispatch one identity request.
pub async fn handle(state: &AppState, request: Request) -> Result<Reply, AppError> {
    match request {
        Request::Ping => Ok(Reply::Pong { status: STATUS_OK }),
        Request::GetUser { key } => {
            let user_id = state.store.lookup(&key).await?;
            Ok(Reply::GetUserResponse {
                status: STATUS_OK,
                user_id,
            })
        }
        Request::AddUser { identity } => {
            // Routed through the resolver, so a repeated add converges on
            // the existing user id instead of erroring.
            let user_id = state.resolver.resolve(&identity).await?;
            Ok(Reply::AddUserResponse {
                status: STATUS_OK,
                user_id,
            })
        }
    }
}
