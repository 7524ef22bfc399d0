//! WebSocket plumbing shared by the matching and signaling channels.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// `{base}/ws/{name}` with the name percent-encoded.
pub(crate) fn user_socket_url(base: &str, name: &str) -> String {
    format!(
        "{}/ws/{}",
        base.trim_end_matches('/'),
        urlencoding::encode(name)
    )
}

/// Open a WebSocket, giving up after `timeout`.
pub(crate) async fn connect(url: &str, timeout: Duration) -> Result<WsStream, String> {
    match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url)).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(format!("connection failed: {e}")),
        Err(_elapsed) => Err(format!(
            "connection timed out after {}s",
            timeout.as_secs()
        )),
    }
}
