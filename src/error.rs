//! Error taxonomy for the reader.
//!
//! Three classes of failure exist: fatal ones that end the process
//! ([`ReaderError`]), reconnect-triggering ones that end a single stream
//! session ([`CloseReason`]), and soft ones that are logged where they
//! happen and never leave their component.

use std::fmt;
use thiserror::Error;

/// Failure to produce a request signature.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("private key is not a valid RSA PEM (tried PKCS#8 and PKCS#1): {0}")]
    InvalidKey(String),

    #[error("RSA-PSS signing failed: {0}")]
    Crypto(#[from] rsa::Error),
}

/// Errors that terminate the process.
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("API key and private key are required")]
    MissingCredentials,

    #[error("error signing request: {0}")]
    Signing(#[from] SigningError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("credentials file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credentials file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a stream session ended. Every variant leads to a reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The handshake or TCP/TLS connect failed.
    ConnectFailed(String),
    /// The venue sent a close frame or the stream ended.
    RemoteClosed(Option<String>),
    /// Sending a command failed.
    SendFailed(String),
    /// Reading from the socket failed.
    Transport(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ConnectFailed(e) => write!(f, "connect failed: {e}"),
            CloseReason::RemoteClosed(Some(frame)) => write!(f, "connection closed: {frame}"),
            CloseReason::RemoteClosed(None) => f.write_str("connection closed"),
            CloseReason::SendFailed(e) => write!(f, "send failed: {e}"),
            CloseReason::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::RemoteClosed(None).to_string(), "connection closed");
        assert_eq!(
            CloseReason::ConnectFailed("dns".into()).to_string(),
            "connect failed: dns"
        );
    }

    #[test]
    fn test_signing_error_converts_to_reader_error() {
        let err: ReaderError = SigningError::InvalidKey("bad pem".into()).into();
        assert!(matches!(err, ReaderError::Signing(_)));
        assert!(err.to_string().contains("bad pem"));
    }
}
