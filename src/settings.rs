/// Settings and configuration management
/// Holds the venue constants and loads the env-driven overrides

use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

// ============================================================================
// Venue Endpoints
// ============================================================================

pub const KALSHI_API_URL: &str = "https://api.elections.kalshi.com/trade-api/v2";
pub const KALSHI_WS_URL: &str = "wss://api.elections.kalshi.com/trade-api/ws/v2";

pub const HEADER_ACCESS_KEY: &str = "KALSHI-ACCESS-KEY";
pub const HEADER_ACCESS_SIGNATURE: &str = "KALSHI-ACCESS-SIGNATURE";
pub const HEADER_ACCESS_TIMESTAMP: &str = "KALSHI-ACCESS-TIMESTAMP";

// Subscribed in this order; request ids are 1-based positions in this list
pub const STREAM_CHANNELS: [&str; 3] = ["ticker", "orderbook_delta", "trade"];

// ============================================================================
// Files
// ============================================================================

pub const CREDENTIALS_FILE_NAME: &str = ".kalshi-cli.json";

// ============================================================================
// Timeouts
// ============================================================================

pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);
pub const RECV_TIMEOUT: Duration = Duration::from_millis(200);
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// Display
// ============================================================================

pub const SPINNER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];
pub const RULE_WIDTH: usize = 60;

// ============================================================================
// Runtime Configuration (loaded from environment)
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub ws_url: Url,
    pub credentials_path: PathBuf,
    pub reconnect_delay: Duration,
    pub recv_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional. Call `dotenvy::dotenv()` first if a `.env`
    /// file should be honoured.
    ///
    /// # Errors
    ///
    /// Fails when no credentials path is given and no home directory can be
    /// determined, or when an endpoint override is not an http(s)/ws(s) URL.
    pub fn from_env() -> Result<Self> {
        let api_url = env_url("KALSHI_API_URL", KALSHI_API_URL, &["http", "https"])?;
        let ws_url = env_url("KALSHI_WS_URL", KALSHI_WS_URL, &["ws", "wss"])?;

        let credentials_path = match env::var("KALSHI_CREDENTIALS_PATH") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
            _ => default_credentials_path()
                .context("cannot locate the home directory; set KALSHI_CREDENTIALS_PATH")?,
        };

        Ok(Self {
            api_url,
            ws_url,
            credentials_path,
            reconnect_delay: Duration::from_secs(env_parse(
                "KALSHI_RECONNECT_DELAY_SECS",
                RECONNECT_DELAY.as_secs(),
            )),
            recv_timeout: Duration::from_millis(env_parse(
                "KALSHI_RECV_TIMEOUT_MS",
                RECV_TIMEOUT.as_millis() as u64,
            )),
        })
    }
}

/// `~/.kalshi-cli.json`, using `HOME` (or `USERPROFILE` on Windows)
pub fn default_credentials_path() -> Result<PathBuf> {
    let home = env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .or_else(|| env::var_os("USERPROFILE").filter(|h| !h.is_empty()))
        .ok_or_else(|| anyhow!("neither HOME nor USERPROFILE is set"))?;
    Ok(PathBuf::from(home).join(CREDENTIALS_FILE_NAME))
}

/// Parse an endpoint URL and check its scheme.
///
/// The signed path of a request is `Url::path()` of the URL actually sent,
/// which is `/` for a bare host.
pub fn parse_endpoint(raw: &str, schemes: &[&str]) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid URL {raw:?}"))?;
    if !schemes.contains(&url.scheme()) {
        anyhow::bail!("URL {url} must use one of {schemes:?}");
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        anyhow::bail!("URL {url} has no host");
    }
    Ok(url)
}

fn env_url(key: &str, default: &str, schemes: &[&str]) -> Result<Url> {
    let raw = env::var(key).ok().filter(|v| !v.trim().is_empty());
    parse_endpoint(raw.as_deref().unwrap_or(default), schemes).with_context(|| format!("bad {key}"))
}

/// Parse env var with default fallback
pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    /// The path we sign must be the path the handshake request carries
    fn assert_signed_path_matches_request(raw: &str) {
        let url = parse_endpoint(raw, &["ws", "wss"]).unwrap();
        let request = url.as_str().into_client_request().unwrap();
        assert_eq!(url.path(), request.uri().path(), "{raw}");
    }

    #[test]
    fn test_default_endpoints_parse() {
        assert_eq!(parse_endpoint(KALSHI_API_URL, &["https"]).unwrap().path(), "/trade-api/v2");
        assert_eq!(parse_endpoint(KALSHI_WS_URL, &["wss"]).unwrap().path(), "/trade-api/ws/v2");
    }

    #[test]
    fn test_signed_path_equals_request_path() {
        for raw in [
            KALSHI_WS_URL,
            "wss://api.example.com",
            "wss://api.example.com?token=a/b",
            "ws://127.0.0.1:8080/ws/v2?x=1",
            "wss://host/a/../trade-api/ws/v2",
        ] {
            assert_signed_path_matches_request(raw);
        }
    }

    #[test]
    fn test_bare_host_signs_root() {
        assert_eq!(parse_endpoint("wss://api.example.com", &["wss"]).unwrap().path(), "/");
    }

    #[test]
    fn test_parse_endpoint_rejects_wrong_scheme() {
        assert!(parse_endpoint("https://api.example.com/ws", &["ws", "wss"]).is_err());
        assert!(parse_endpoint("not a url", &["https"]).is_err());
        assert!(parse_endpoint("mailto:x@example.com", &["mailto"]).is_err());
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        unsafe {
            env::set_var("KALSHI_TEST_ENV_PARSE_GARBAGE", "five");
        }
        assert_eq!(env_parse("KALSHI_TEST_ENV_PARSE_GARBAGE", 5u64), 5);
    }

    #[test]
    fn test_env_parse_reads_value() {
        unsafe {
            env::set_var("KALSHI_TEST_ENV_PARSE_VALUE", " 250 ");
        }
        assert_eq!(env_parse("KALSHI_TEST_ENV_PARSE_VALUE", 200u64), 250);
    }

    #[test]
    fn test_timeout_constants() {
        assert_eq!(RECONNECT_DELAY, Duration::from_secs(5));
        assert_eq!(RECV_TIMEOUT, Duration::from_millis(200));
    }
}
