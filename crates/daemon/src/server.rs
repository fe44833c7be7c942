// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket connection handling. One request, one response, per connection
//! (spec §4.6); handled inline in the caller's accept loop rather than
//! spawned, so every request runs on the single event loop.

use crate::handlers;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT};
use crate::state::DaemonState;
use agentctl_core::Clock;
use tokio::net::UnixStream;
use tracing::{debug, error};

pub async fn handle_connection<C: Clock>(
    state: &mut DaemonState<C>,
    stream: UnixStream,
) -> Result<(), protocol::ProtocolError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = protocol::buffered(reader);

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(request) => request,
        Err(protocol::ProtocolError::ConnectionClosed) => return Ok(()),
        Err(e) => {
            error!(error = %e, "failed to read request");
            return Err(e);
        }
    };

    debug!(method = %request.method, "dispatching request");
    let response = handle_request(state, request).await;
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await
}

async fn handle_request<C: Clock>(state: &mut DaemonState<C>, request: Request) -> Response {
    let Request { id, method, params } = request;
    match handlers::dispatch(state, &method, params).await {
        Ok(result) => {
            state.metrics.record_rpc(true);
            Response::ok(id, result)
        }
        Err(e) => {
            state.metrics.record_rpc(false);
            Response::err(id, e)
        }
    }
}
