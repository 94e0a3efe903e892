//! HTTP/1.1 requests over the daemon's Unix domain socket.
//!
//! Every request opens its own connection, which lives exactly as long as its
//! response body.

use std::path::Path;

use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper::{header, Request};
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tracing::debug;

use crate::client::Reply;
use crate::error::{OrchestratorError, Result};

/// Send `GET <path_and_query>` to the daemon listening on `socket`.
pub(crate) async fn get(socket: &Path, path_and_query: &str) -> Result<Reply> {
    let stream = UnixStream::connect(socket).await.map_err(|e| {
        OrchestratorError::Transport(format!("connect to {}: {e}", socket.display()))
    })?;

    let (mut sender, connection) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| OrchestratorError::Transport(format!("HTTP handshake: {e}")))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(error = %e, "Docker socket connection closed with error");
        }
    });

    // The daemon requires a Host header but ignores its value.
    let request = Request::get(path_and_query)
        .header(header::HOST, "docker")
        .body(Empty::<Bytes>::new())
        .map_err(|e| {
            OrchestratorError::Config(format!("invalid request {path_and_query}: {e}"))
        })?;

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| OrchestratorError::Transport(format!("GET {path_and_query}: {e}")))?;

    let status = response.status().as_u16();
    let chunks = response
        .into_body()
        .into_data_stream()
        .map(|chunk| chunk.map_err(|e| OrchestratorError::Transport(e.to_string())))
        .boxed();

    Ok(Reply { status, chunks })
}
