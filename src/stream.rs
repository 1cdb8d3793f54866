/// One authenticated WebSocket session
///
/// Connecting -> Subscribing -> Listening -> Closed(reason). The session
/// never ends on its own; it returns when the connection fails or closes,
/// or with a [`SigningError`] when the handshake cannot be signed.

use async_trait::async_trait;
use chrono::Local;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{CloseReason, SigningError};
use crate::models::{StreamEvent, SubscribeCmd};
use crate::render::{LivenessCounter, Renderer};
use crate::settings::STREAM_CHANNELS;
use crate::signer::{AuthHeaders, RequestSigner};
use crate::state::StateStore;

/// What the transport produced within one bounded wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    TimedOut,
    Closed(CloseReason),
}

/// An open stream connection
#[async_trait]
pub trait StreamTransport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), CloseReason>;

    /// Wait at most `wait` for the next data frame. Control frames are
    /// handled internally and do not end the wait.
    async fn recv(&mut self, wait: Duration) -> Frame;
}

/// Opens stream connections with the given auth headers
#[async_trait]
pub trait StreamConnector: Send + Sync {
    type Transport: StreamTransport;

    async fn connect(&self, headers: &AuthHeaders) -> Result<Self::Transport, CloseReason>;
}

/// Outcome of one receive attempt, after parsing
#[derive(Debug, Clone, PartialEq)]
pub enum RecvOutcome {
    Data(StreamEvent),
    TimedOut,
    Closed(CloseReason),
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    Subscribing,
    Listening,
    Closed(CloseReason),
}

/// Everything the receive loop mutates, owned by the supervisor
pub struct SessionView<'a, R: Renderer> {
    pub store: &'a mut StateStore,
    pub renderer: &'a mut R,
    pub liveness: &'a mut LivenessCounter,
}

pub struct StreamSession<'a, C, S> {
    connector: &'a C,
    signer: &'a S,
    ws_path: &'a str,
    recv_timeout: Duration,
    phase: SessionPhase,
}

impl<'a, C, S> StreamSession<'a, C, S>
where
    C: StreamConnector,
    S: RequestSigner,
{
    /// `ws_path` is the signed path of the stream endpoint, e.g. `/trade-api/ws/v2`
    pub fn new(connector: &'a C, signer: &'a S, ws_path: &'a str, recv_timeout: Duration) -> Self {
        Self {
            connector,
            signer,
            ws_path,
            recv_timeout,
            phase: SessionPhase::Connecting,
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Run until the connection closes.
    ///
    /// # Errors
    ///
    /// Only a signing failure is an error; every connection problem is
    /// reported as `Ok(reason)`.
    pub async fn run<R: Renderer>(&mut self, view: SessionView<'_, R>) -> Result<CloseReason, SigningError> {
        let contract_id = view.store.contract_id().to_string();

        self.phase = SessionPhase::Connecting;
        let headers = self.signer.sign_request("GET", self.ws_path)?;
        let mut transport = match self.connector.connect(&headers).await {
            Ok(t) => t,
            Err(reason) => return Ok(self.close(reason)),
        };
        info!(contract = %contract_id, "Stream connected");

        self.phase = SessionPhase::Subscribing;
        if let Err(reason) = subscribe(&mut transport, &contract_id).await {
            return Ok(self.close(reason));
        }

        self.phase = SessionPhase::Listening;
        let SessionView { store, renderer, liveness } = view;
        loop {
            match receive(&mut transport, self.recv_timeout).await {
                RecvOutcome::Closed(reason) => return Ok(self.close(reason)),
                RecvOutcome::Malformed => {
                    debug!("Skipping malformed frame");
                    continue;
                }
                RecvOutcome::TimedOut => {}
                RecvOutcome::Data(event) => {
                    if store.apply(&event) {
                        renderer.render(store.state(), liveness.symbol(), Local::now());
                    }
                }
            }

            liveness.advance();
            renderer.tick(liveness.symbol());
        }
    }

    fn close(&mut self, reason: CloseReason) -> CloseReason {
        debug!(%reason, "Session closed");
        self.phase = SessionPhase::Closed(reason.clone());
        reason
    }
}

/// Fire-and-forget subscribe commands, ids starting at 1
pub async fn subscribe<T: StreamTransport + ?Sized>(
    transport: &mut T,
    contract_id: &str,
) -> Result<(), CloseReason> {
    for (idx, channel) in STREAM_CHANNELS.iter().enumerate() {
        let cmd = SubscribeCmd::new(idx as u64 + 1, channel, contract_id);
        let text = serde_json::to_string(&cmd).map_err(|e| CloseReason::SendFailed(e.to_string()))?;
        transport.send_text(text).await?;
        debug!(channel, id = idx + 1, "Subscribe sent");
    }
    Ok(())
}

/// One bounded wait on the transport, parsed into an explicit outcome
pub async fn receive<T: StreamTransport + ?Sized>(transport: &mut T, wait: Duration) -> RecvOutcome {
    let text = match transport.recv(wait).await {
        Frame::TimedOut => return RecvOutcome::TimedOut,
        Frame::Closed(reason) => return RecvOutcome::Closed(reason),
        Frame::Text(text) => text,
        Frame::Binary(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => return RecvOutcome::Malformed,
        },
    };

    match StreamEvent::parse(&text) {
        Ok(event) => RecvOutcome::Data(event),
        Err(_) => RecvOutcome::Malformed,
    }
}
