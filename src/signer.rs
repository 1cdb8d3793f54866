/// Request signing for the Kalshi REST and WebSocket endpoints
///
/// The venue authenticates every request with an RSA-PSS signature over
/// `timestamp_ms + METHOD + path`, sent alongside the key id and the
/// timestamp itself. Timestamps are generated per call; nothing is cached.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey};
use sha2::{Digest, Sha256};

use crate::credentials::Credentials;
use crate::error::SigningError;
use crate::settings::{HEADER_ACCESS_KEY, HEADER_ACCESS_SIGNATURE, HEADER_ACCESS_TIMESTAMP};

const SHA256_LEN: usize = 32;

/// The three authentication header values for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub key_id: String,
    pub signature: String,
    pub timestamp_ms: String,
}

impl AuthHeaders {
    /// `(header name, value)` pairs in the order the venue documents them
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            (HEADER_ACCESS_KEY, self.key_id.as_str()),
            (HEADER_ACCESS_SIGNATURE, self.signature.as_str()),
            (HEADER_ACCESS_TIMESTAMP, self.timestamp_ms.as_str()),
        ]
    }
}

/// Holds the parsed private key and the API key id
#[derive(Clone)]
pub struct Signer {
    key_id: String,
    key: RsaPrivateKey,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("key_id", &self.key_id)
            .field("modulus_bits", &self.key.n().bits())
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Parse the PEM held in `creds`.
    pub fn new(creds: &Credentials) -> Result<Self, SigningError> {
        Ok(Self {
            key_id: creds.api_key.clone(),
            key: parse_private_key(&creds.private_key)?,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign `timestamp_ms + method + path` and return it base64-encoded.
    pub fn sign(&self, timestamp_ms: &str, method: &str, path: &str) -> Result<String, SigningError> {
        sign_with_key(&self.key, timestamp_ms, method, path)
    }

    /// Build auth headers for `method path` using the current time.
    pub fn auth_headers(&self, method: &str, path: &str) -> Result<AuthHeaders, SigningError> {
        self.auth_headers_at(&now_millis(), method, path)
    }

    /// Build auth headers for an explicit timestamp.
    pub fn auth_headers_at(
        &self,
        timestamp_ms: &str,
        method: &str,
        path: &str,
    ) -> Result<AuthHeaders, SigningError> {
        Ok(AuthHeaders {
            key_id: self.key_id.clone(),
            signature: self.sign(timestamp_ms, method, path)?,
            timestamp_ms: timestamp_ms.to_string(),
        })
    }
}

/// Produces auth headers for a request; implemented by [`Signer`]
pub trait RequestSigner {
    fn sign_request(&self, method: &str, path: &str) -> Result<AuthHeaders, SigningError>;
}

impl RequestSigner for Signer {
    fn sign_request(&self, method: &str, path: &str) -> Result<AuthHeaders, SigningError> {
        self.auth_headers(method, path)
    }
}

/// One-shot form: parse `private_key_pem` and sign.
pub fn sign(
    private_key_pem: &str,
    timestamp_ms: &str,
    method: &str,
    path: &str,
) -> Result<String, SigningError> {
    let key = parse_private_key(private_key_pem)?;
    sign_with_key(&key, timestamp_ms, method, path)
}

/// Current epoch milliseconds as a decimal string
pub fn now_millis() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// The exact bytes the venue recomputes: no separators
pub fn canonical_message(timestamp_ms: &str, method: &str, path: &str) -> String {
    let mut msg = String::with_capacity(timestamp_ms.len() + method.len() + path.len());
    msg.push_str(timestamp_ms);
    msg.push_str(method);
    msg.push_str(path);
    msg
}

/// Largest PSS salt the key allows: emLen - hLen - 2
pub fn max_salt_len(key: &RsaPrivateKey) -> usize {
    let em_bits = key.n().bits().saturating_sub(1);
    let em_len = em_bits.div_ceil(8);
    em_len.saturating_sub(SHA256_LEN + 2)
}

/// Accepts PKCS#8 (`BEGIN PRIVATE KEY`) and PKCS#1 (`BEGIN RSA PRIVATE KEY`)
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey, SigningError> {
    let pem = pem.trim();
    match RsaPrivateKey::from_pkcs8_pem(pem) {
        Ok(key) => Ok(key),
        Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|pkcs1_err| SigningError::InvalidKey(format!("{pkcs8_err}; {pkcs1_err}"))),
    }
}

fn sign_with_key(
    key: &RsaPrivateKey,
    timestamp_ms: &str,
    method: &str,
    path: &str,
) -> Result<String, SigningError> {
    let digest = Sha256::digest(canonical_message(timestamp_ms, method, path).as_bytes());
    let padding = Pss::new_with_salt::<Sha256>(max_salt_len(key));
    let signature = key.sign_with_rng(&mut rand::thread_rng(), padding, &digest)?;
    Ok(BASE64.encode(signature))
}
