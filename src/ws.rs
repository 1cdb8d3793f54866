/// tokio-tungstenite implementation of the stream transport

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue, Request};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use crate::error::CloseReason;
use crate::signer::AuthHeaders;
use crate::stream::{Frame, StreamConnector, StreamTransport};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to a fixed stream URL
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Handshake request carrying the three auth headers
    pub fn build_request(&self, headers: &AuthHeaders) -> Result<Request<()>, CloseReason> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| CloseReason::ConnectFailed(e.to_string()))?;

        for (name, value) in headers.pairs() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| CloseReason::ConnectFailed(e.to_string()))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| CloseReason::ConnectFailed(e.to_string()))?;
            request.headers_mut().insert(name, value);
        }
        Ok(request)
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, headers: &AuthHeaders) -> Result<WsTransport, CloseReason> {
        let request = self.build_request(headers)?;
        let (ws, response) = connect_async(request)
            .await
            .map_err(|e| CloseReason::ConnectFailed(e.to_string()))?;
        debug!(url = %self.url, status = %response.status(), "WebSocket handshake complete");
        Ok(WsTransport { ws })
    }
}

pub struct WsTransport {
    ws: WsStream,
}

#[async_trait]
impl StreamTransport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), CloseReason> {
        self.ws
            .send(Message::Text(text))
            .await
            .map_err(|e| CloseReason::SendFailed(e.to_string()))
    }

    async fn recv(&mut self, wait: Duration) -> Frame {
        let deadline = Instant::now() + wait;
        loop {
            let msg = match tokio::time::timeout_at(deadline, self.ws.next()).await {
                Err(_) => return Frame::TimedOut,
                Ok(None) => return Frame::Closed(CloseReason::RemoteClosed(None)),
                Ok(Some(Err(e))) => return Frame::Closed(CloseReason::Transport(e.to_string())),
                Ok(Some(Ok(msg))) => msg,
            };

            match msg {
                Message::Text(text) => return Frame::Text(text),
                Message::Binary(bin) => return Frame::Binary(bin),
                Message::Ping(d) => {
                    trace!("Ping");
                    if let Err(e) = self.ws.send(Message::Pong(d)).await {
                        return Frame::Closed(CloseReason::SendFailed(e.to_string()));
                    }
                }
                Message::Close(f) => {
                    // Complete the closing handshake; the peer may already be gone
                    let _ = self.ws.close(None).await;
                    return Frame::Closed(CloseReason::RemoteClosed(f.map(|f| f.to_string())));
                }
                Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }
}
