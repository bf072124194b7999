//! Order placement seam.
//!
//! The engine never talks to an exchange directly; a transport
//! implementation is injected by the application. Success means the
//! order reached the venue and a fill will eventually arrive on the
//! account stream; failure means it never left, so the gate can safely
//! reopen.

use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use dipper_core::{OrderToken, Size, Symbol};
use rust_decimal::Decimal;

/// Submits buy/sell requests to an exchange.
#[async_trait]
pub trait OrderTransport: Send + Sync {
    /// Submit a market buy for `quote_amount` of the quote asset.
    async fn submit_buy(
        &self,
        symbol: &Symbol,
        quote_amount: Decimal,
        token: &OrderToken,
    ) -> EngineResult<()>;

    /// Submit a market sell for `quantity` of the base asset. The
    /// quantity is already floored to the symbol's lot step.
    async fn submit_sell(
        &self,
        symbol: &Symbol,
        quantity: Size,
        token: &OrderToken,
    ) -> EngineResult<()>;
}

/// Transport that rejects everything.
///
/// Stands in when no live venue is wired up, so a misconfigured live
/// session fails loudly instead of trading into the void.
#[derive(Debug, Default)]
pub struct NullTransport;

#[async_trait]
impl OrderTransport for NullTransport {
    async fn submit_buy(
        &self,
        symbol: &Symbol,
        _quote_amount: Decimal,
        _token: &OrderToken,
    ) -> EngineResult<()> {
        Err(EngineError::Transport(format!(
            "no live order transport configured for {symbol}"
        )))
    }

    async fn submit_sell(
        &self,
        symbol: &Symbol,
        _quantity: Size,
        _token: &OrderToken,
    ) -> EngineResult<()> {
        Err(EngineError::Transport(format!(
            "no live order transport configured for {symbol}"
        )))
    }
}
