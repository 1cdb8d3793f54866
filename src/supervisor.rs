/// Reconnect loop around [`StreamSession`]
///
/// Owns the contract state for the life of the process, so a reconnect keeps
/// whatever the reader already knew. Only a signing failure escapes.

use std::convert::Infallible;
use std::time::Duration;
use tracing::warn;

use crate::error::ReaderError;
use crate::render::{LivenessCounter, Renderer};
use crate::settings::{RECONNECT_DELAY, RECV_TIMEOUT};
use crate::signer::{RequestSigner, Signer};
use crate::state::StateStore;
use crate::stream::{SessionView, StreamConnector, StreamSession};

/// Fixed delay between sessions; no growth, no retry cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delay: Duration,
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn next_delay(&self) -> Duration {
        self.delay
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(RECONNECT_DELAY)
    }
}

pub struct ReconnectSupervisor<C, R, S = Signer> {
    connector: C,
    signer: S,
    ws_path: String,
    policy: ReconnectPolicy,
    recv_timeout: Duration,
    store: StateStore,
    renderer: R,
    liveness: LivenessCounter,
    sessions_started: u64,
}

impl<C, R, S> ReconnectSupervisor<C, R, S>
where
    C: StreamConnector,
    R: Renderer,
    S: RequestSigner,
{
    pub fn new(connector: C, signer: S, ws_path: impl Into<String>, store: StateStore, renderer: R) -> Self {
        Self {
            connector,
            signer,
            ws_path: ws_path.into(),
            policy: ReconnectPolicy::default(),
            recv_timeout: RECV_TIMEOUT,
            store,
            renderer,
            liveness: LivenessCounter::new(),
            sessions_started: 0,
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = recv_timeout;
        self
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn liveness(&self) -> LivenessCounter {
        self.liveness
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Run sessions forever.
    ///
    /// # Errors
    ///
    /// Returns only when a handshake cannot be signed.
    pub async fn run(&mut self) -> Result<Infallible, ReaderError> {
        loop {
            self.sessions_started += 1;
            let mut session =
                StreamSession::new(&self.connector, &self.signer, &self.ws_path, self.recv_timeout);
            let view = SessionView {
                store: &mut self.store,
                renderer: &mut self.renderer,
                liveness: &mut self.liveness,
            };

            let reason = session.run(view).await?;
            let delay = self.policy.next_delay();
            warn!(
                %reason,
                session = self.sessions_started,
                "Stream closed. Reconnecting in {} seconds...",
                delay.as_secs()
            );
            tokio::time::sleep(delay).await;
        }
    }
}
