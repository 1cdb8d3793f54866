// src/models.rs
// Contract state and wire types for the Kalshi REST and WebSocket APIs

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Contract state
// ============================================================================

/// Merged view of one contract. Prices are in cents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractState {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub status: Option<String>,
    pub yes_bid: Option<i64>,
    pub yes_ask: Option<i64>,
    pub no_bid: Option<i64>,
    pub no_ask: Option<i64>,
    pub last_price: Option<i64>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
}

impl ContractState {
    /// True until any field has been observed
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// REST snapshot (GET /markets/{ticker})
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MarketResponse {
    #[serde(default)]
    pub market: Option<MarketSnapshot>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub yes_bid: Option<i64>,
    #[serde(default)]
    pub yes_ask: Option<i64>,
    #[serde(default)]
    pub no_bid: Option<i64>,
    #[serde(default)]
    pub no_ask: Option<i64>,
    #[serde(default)]
    pub last_price: Option<i64>,
    #[serde(default)]
    pub volume: Option<i64>,
    #[serde(default)]
    pub open_interest: Option<i64>,
}

impl From<MarketSnapshot> for ContractState {
    fn from(m: MarketSnapshot) -> Self {
        Self {
            title: m.title,
            subtitle: m.subtitle,
            status: m.status,
            yes_bid: m.yes_bid,
            yes_ask: m.yes_ask,
            no_bid: m.no_bid,
            no_ask: m.no_ask,
            last_price: m.last_price,
            volume: m.volume,
            open_interest: m.open_interest,
        }
    }
}

// ============================================================================
// Outbound commands
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SubscribeCmd {
    pub id: u64,
    pub cmd: &'static str,
    pub params: SubscribeParams,
}

#[derive(Debug, Serialize)]
pub struct SubscribeParams {
    pub channels: Vec<String>,
    pub market_tickers: Vec<String>,
}

impl SubscribeCmd {
    pub fn new(id: u64, channel: &str, market_ticker: &str) -> Self {
        Self {
            id,
            cmd: "subscribe",
            params: SubscribeParams {
                channels: vec![channel.to_string()],
                market_tickers: vec![market_ticker.to_string()],
            },
        }
    }
}

// ============================================================================
// Inbound messages: {"type": "...", "msg": {...}}
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    msg: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TickerMsg {
    pub market_ticker: Option<String>,
    pub yes_bid: Option<i64>,
    pub yes_ask: Option<i64>,
    pub no_bid: Option<i64>,
    pub no_ask: Option<i64>,
    pub last_price: Option<i64>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderbookDeltaMsg {
    pub market_ticker: Option<String>,
    pub price: Option<i64>,
    pub side: Option<String>,
}

/// Each side is a list of `[price, quantity]` levels
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderbookSnapshotMsg {
    pub market_ticker: Option<String>,
    #[serde(default)]
    pub yes: Vec<Vec<i64>>,
    #[serde(default)]
    pub no: Vec<Vec<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TradeMsg {
    pub market_ticker: Option<String>,
    pub yes_price: Option<i64>,
    pub volume: Option<i64>,
}

/// The `market` channel names its id field `ticker`, not `market_ticker`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MarketMsg {
    pub ticker: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub yes_bid: Option<i64>,
    pub yes_ask: Option<i64>,
    pub volume: Option<i64>,
    pub open_interest: Option<i64>,
}

/// A parsed stream message
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Ticker(TickerMsg),
    OrderbookDelta(OrderbookDeltaMsg),
    OrderbookSnapshot(OrderbookSnapshotMsg),
    Trade(TradeMsg),
    Market(MarketMsg),
    /// Unknown type, missing payload, or a payload that does not fit its type
    Other(String),
}

impl StreamEvent {
    /// Parse one text frame.
    ///
    /// Only a frame that is not a JSON object with a string `type` is an
    /// error; everything else maps to a variant (possibly `Other`).
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let env: Envelope = serde_json::from_str(text)?;
        let Some(msg) = env.msg else {
            return Ok(StreamEvent::Other(env.msg_type));
        };

        let event = match env.msg_type.as_str() {
            "ticker" => serde_json::from_value(msg).map(StreamEvent::Ticker),
            "orderbook_delta" => serde_json::from_value(msg).map(StreamEvent::OrderbookDelta),
            "orderbook_snapshot" => serde_json::from_value(msg).map(StreamEvent::OrderbookSnapshot),
            "trade" => serde_json::from_value(msg).map(StreamEvent::Trade),
            "market" => serde_json::from_value(msg).map(StreamEvent::Market),
            _ => return Ok(StreamEvent::Other(env.msg_type)),
        };

        Ok(event.unwrap_or(StreamEvent::Other(env.msg_type)))
    }

    /// Contract identifier the payload refers to
    pub fn contract_id(&self) -> Option<&str> {
        match self {
            StreamEvent::Ticker(m) => m.market_ticker.as_deref(),
            StreamEvent::OrderbookDelta(m) => m.market_ticker.as_deref(),
            StreamEvent::OrderbookSnapshot(m) => m.market_ticker.as_deref(),
            StreamEvent::Trade(m) => m.market_ticker.as_deref(),
            StreamEvent::Market(m) => m.ticker.as_deref(),
            StreamEvent::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ticker() {
        let evt = StreamEvent::parse(
            r#"{"type":"ticker","sid":1,"msg":{"market_ticker":"ABC","yes_bid":46,"volume":120}}"#,
        )
        .unwrap();
        match evt {
            StreamEvent::Ticker(m) => {
                assert_eq!(m.market_ticker.as_deref(), Some("ABC"));
                assert_eq!(m.yes_bid, Some(46));
                assert_eq!(m.volume, Some(120));
                assert_eq!(m.yes_ask, None);
            }
            other => panic!("expected ticker, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_market_uses_ticker_field() {
        let evt = StreamEvent::parse(r#"{"type":"market","msg":{"ticker":"ABC","status":"closed"}}"#)
            .unwrap();
        assert_eq!(evt.contract_id(), Some("ABC"));
    }

    #[test]
    fn test_parse_unknown_type() {
        let evt = StreamEvent::parse(r#"{"type":"fill","msg":{"market_ticker":"ABC"}}"#).unwrap();
        assert_eq!(evt, StreamEvent::Other("fill".to_string()));
        assert_eq!(evt.contract_id(), None);
    }

    #[test]
    fn test_parse_ack_without_msg() {
        let evt = StreamEvent::parse(r#"{"type":"subscribed","id":1}"#).unwrap();
        assert_eq!(evt, StreamEvent::Other("subscribed".to_string()));
    }

    #[test]
    fn test_parse_mistyped_payload_is_other() {
        let evt = StreamEvent::parse(r#"{"type":"ticker","msg":{"market_ticker":"ABC","yes_bid":"46"}}"#)
            .unwrap();
        assert_eq!(evt, StreamEvent::Other("ticker".to_string()));
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(StreamEvent::parse("not json").is_err());
        assert!(StreamEvent::parse(r#"{"msg":{}}"#).is_err());
    }

    #[test]
    fn test_subscribe_cmd_shape() {
        let cmd = SubscribeCmd::new(2, "orderbook_delta", "ABC");
        let v: Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "id": 2,
                "cmd": "subscribe",
                "params": {"channels": ["orderbook_delta"], "market_tickers": ["ABC"]}
            })
        );
    }

    #[test]
    fn test_market_response_partial_fields() {
        let body = r#"{"market":{"title":"Will X happen?","status":"active","yes_bid":45,"yes_ask":48,"rules_primary":"..."}}"#;
        let resp: MarketResponse = serde_json::from_str(body).unwrap();
        let state = ContractState::from(resp.market.unwrap());
        assert_eq!(state.title.as_deref(), Some("Will X happen?"));
        assert_eq!(state.yes_ask, Some(48));
        assert_eq!(state.no_bid, None);
    }

    #[test]
    fn test_empty_state() {
        assert!(ContractState::default().is_empty());
        let s = ContractState { volume: Some(0), ..Default::default() };
        assert!(!s.is_empty());
    }
}
