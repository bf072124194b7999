//! Wire decoding for stream payloads.
//!
//! The upstream encodes numbers as strings and uses single-letter keys
//! on its streams. Trade payloads carry the event time in `E`, price in
//! `p` and quantity in `q`; account payloads are tagged by `e` and are
//! either a position snapshot (`B`: per-asset balances) or an execution
//! report. Unknown event types are ignored; undecodable payloads are
//! malformed and get dropped by the consumer.

use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, Utc};
use dipper_core::{AccountEvent, Balance, FillReport, FillStatus, OrderSide, OrderToken, Price, Size, Tick};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

/// Raw trade message.
#[derive(Debug, Deserialize)]
struct RawTrade {
    #[serde(rename = "E", with = "chrono::serde::ts_milliseconds")]
    time: DateTime<Utc>,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    price: Decimal,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    quantity: Decimal,
}

/// Envelope carrying only the event type tag.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "e")]
    event_type: String,
}

/// Raw per-asset balance inside a position snapshot.
#[derive(Debug, Deserialize)]
struct RawBalance {
    #[serde(rename = "a")]
    asset: String,
    #[serde(rename = "f", with = "rust_decimal::serde::str")]
    free: Decimal,
    #[serde(rename = "l", with = "rust_decimal::serde::str")]
    locked: Decimal,
}

/// Raw position snapshot message.
#[derive(Debug, Deserialize)]
struct RawAccountUpdate {
    #[serde(rename = "B")]
    balances: Vec<RawBalance>,
}

/// Raw execution report message.
#[derive(Debug, Deserialize)]
struct RawExecutionReport {
    #[serde(rename = "c")]
    client_order_id: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "S")]
    side: OrderSide,
    #[serde(rename = "X")]
    order_status: FillStatus,
    #[serde(rename = "q", with = "rust_decimal::serde::str")]
    quantity: Decimal,
    /// Cumulative quote asset transacted quantity.
    #[serde(rename = "Z", with = "rust_decimal::serde::str")]
    quote_quantity: Decimal,
}

/// Decode one trade-stream payload.
pub fn decode_trade(raw: &str) -> FeedResult<Tick> {
    let trade: RawTrade = serde_json::from_str(raw)
        .map_err(|e| FeedError::Malformed(format!("trade: {e}")))?;
    Ok(Tick::new(
        trade.time,
        Price::new(trade.price),
        Size::new(trade.quantity),
    ))
}

/// Decode one account-stream payload into zero or more events.
///
/// A position snapshot fans out into one `BalanceSnapshot` per asset;
/// an execution report becomes a single `Fill`; anything else is an
/// ignored event type and decodes to an empty batch.
pub fn decode_account_event(raw: &str) -> FeedResult<Vec<AccountEvent>> {
    let envelope: RawEnvelope = serde_json::from_str(raw)
        .map_err(|e| FeedError::Malformed(format!("account envelope: {e}")))?;

    match envelope.event_type.as_str() {
        "outboundAccountPosition" => {
            let update: RawAccountUpdate = serde_json::from_str(raw)
                .map_err(|e| FeedError::Malformed(format!("account position: {e}")))?;
            Ok(update
                .balances
                .into_iter()
                .map(|b| {
                    AccountEvent::BalanceSnapshot(Balance::new(b.asset, b.free, b.locked))
                })
                .collect())
        }
        "executionReport" => {
            let report: RawExecutionReport = serde_json::from_str(raw)
                .map_err(|e| FeedError::Malformed(format!("execution report: {e}")))?;
            Ok(vec![AccountEvent::Fill(FillReport {
                order_token: OrderToken::from_string(report.client_order_id),
                symbol: report.symbol,
                side: report.side,
                status: report.order_status,
                quantity: Size::new(report.quantity),
                quote_quantity: report.quote_quantity,
            })])
        }
        other => {
            debug!(event_type = other, "Ignoring account event type");
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_trade() {
        let raw = r#"{"e":"trade","E":1652630400000,"s":"TESTUSDT","p":"2.5","q":"100.0"}"#;
        let tick = decode_trade(raw).unwrap();
        assert_eq!(tick.price.inner(), dec!(2.5));
        assert_eq!(tick.quantity.inner(), dec!(100.0));
        assert_eq!(tick.time.timestamp_millis(), 1_652_630_400_000);
    }

    #[test]
    fn test_decode_trade_malformed() {
        assert!(matches!(
            decode_trade("not json"),
            Err(FeedError::Malformed(_))
        ));
        // numeric price where a string is expected
        assert!(matches!(
            decode_trade(r#"{"E":1,"p":2.5,"q":"1"}"#),
            Err(FeedError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_position_snapshot_fans_out() {
        let raw = r#"{"e":"outboundAccountPosition","E":1,"B":[
            {"a":"USDT","f":"120.5","l":"0"},
            {"a":"TEST","f":"50","l":"1.5"}
        ]}"#;
        let events = decode_account_event(raw).unwrap();
        assert_eq!(events.len(), 2);
        match &events[1] {
            AccountEvent::BalanceSnapshot(balance) => {
                assert_eq!(balance.asset, "TEST");
                assert_eq!(balance.free, dec!(50));
                assert_eq!(balance.locked, dec!(1.5));
            }
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_execution_report() {
        let raw = r#"{"e":"executionReport","x":"TRADE","X":"FILLED",
            "s":"TESTUSDT","S":"BUY","q":"50.0","Z":"100.0","c":"tok123"}"#;
        let events = decode_account_event(raw).unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            AccountEvent::Fill(fill) => {
                assert_eq!(fill.symbol, "TESTUSDT");
                assert_eq!(fill.side, OrderSide::Buy);
                assert!(fill.status.is_filled());
                assert_eq!(fill.quantity.inner(), dec!(50));
                assert_eq!(fill.price().inner(), dec!(2));
                assert_eq!(fill.order_token.as_str(), "tok123");
            }
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_type_is_ignored() {
        let raw = r#"{"e":"balanceUpdate","a":"USDT","d":"10"}"#;
        assert!(decode_account_event(raw).unwrap().is_empty());
    }

    #[test]
    fn test_account_event_malformed() {
        assert!(matches!(
            decode_account_event("{}"),
            Err(FeedError::Malformed(_))
        ));
        // right tag, broken body
        assert!(matches!(
            decode_account_event(r#"{"e":"executionReport"}"#),
            Err(FeedError::Malformed(_))
        ));
    }
}
