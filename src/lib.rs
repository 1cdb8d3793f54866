//! Kalshi single-contract market data reader
//!
//! Snapshot over REST, live updates over an authenticated WebSocket, merged
//! into one view of the contract and drawn to the terminal.
//!
//! ```
//! use kalshi_reader::{StateStore, StreamEvent};
//!
//! let mut store = StateStore::new("KXTEST-25");
//! let event = StreamEvent::parse(
//!     r#"{"type":"ticker","msg":{"market_ticker":"KXTEST-25","yes_bid":46}}"#,
//! )
//! .unwrap();
//! assert!(store.apply(&event));
//! assert_eq!(store.state().yes_bid, Some(46));
//! ```

pub mod credentials;
pub mod error;
pub mod models;
pub mod render;
pub mod settings;
pub mod signer;
pub mod snapshot;
pub mod state;
pub mod stream;
pub mod supervisor;
pub mod telemetry;
pub mod ws;

pub use credentials::{CredentialProvider, Credentials, FileCredentials};
pub use error::{CloseReason, ReaderError, SigningError};
pub use models::{ContractState, StreamEvent};
pub use render::{LivenessCounter, Renderer, TerminalRenderer};
pub use settings::Config;
pub use signer::{AuthHeaders, RequestSigner, Signer};
pub use snapshot::SnapshotFetcher;
pub use state::StateStore;
pub use supervisor::{ReconnectPolicy, ReconnectSupervisor};
pub use ws::WsConnector;
