//! Venue adapter trait and request/response types.
//!
//! This module defines the uniform contract (`VenueAdapter`) every venue
//! client implements, despite the four venues exposing very different wire
//! formats. Venue-native field names never cross this boundary.
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | Balances | — | `Vec<UnifiedBalance>` |
//! | Tickers | [`TickerScope`] | `Vec<UnifiedTicker>` |
//! | Order history | [`OrderFilter`] | `Vec<UnifiedOrder>` |
//! | Place order | [`OrderRequest`] | [`OrderReceipt`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OrderKind, Side, UnifiedBalance, UnifiedOrder, UnifiedTicker, ValidationError, VenueId};

/// Coarse per-call failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueErrorKind {
    AuthFailure,
    RateLimited,
    Timeout,
    MalformedResponse,
    Unknown,
}

/// Structured venue-scoped error recovered at the aggregator boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueError {
    venue: VenueId,
    kind: VenueErrorKind,
    message: String,
}

impl VenueError {
    pub fn auth_failure(venue: VenueId, message: impl Into<String>) -> Self {
        Self {
            venue,
            kind: VenueErrorKind::AuthFailure,
            message: message.into(),
        }
    }

    pub fn rate_limited(venue: VenueId, message: impl Into<String>) -> Self {
        Self {
            venue,
            kind: VenueErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn timeout(venue: VenueId, message: impl Into<String>) -> Self {
        Self {
            venue,
            kind: VenueErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn malformed_response(venue: VenueId, message: impl Into<String>) -> Self {
        Self {
            venue,
            kind: VenueErrorKind::MalformedResponse,
            message: message.into(),
        }
    }

    pub fn unknown(venue: VenueId, message: impl Into<String>) -> Self {
        Self {
            venue,
            kind: VenueErrorKind::Unknown,
            message: message.into(),
        }
    }

    pub const fn venue(&self) -> VenueId {
        self.venue
    }

    pub const fn kind(&self) -> VenueErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            VenueErrorKind::AuthFailure => "venue.auth_failure",
            VenueErrorKind::RateLimited => "venue.rate_limited",
            VenueErrorKind::Timeout => "venue.timeout",
            VenueErrorKind::MalformedResponse => "venue.malformed_response",
            VenueErrorKind::Unknown => "venue.unknown",
        }
    }
}

impl Display for VenueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({})", self.venue, self.message, self.code())
    }
}

impl std::error::Error for VenueError {}

/// Ticker fetch scope.
///
/// `None` symbols means each venue's default popular-pairs list; an explicit
/// list filters on venue-native symbol spellings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickerScope {
    symbols: Option<Vec<String>>,
}

impl TickerScope {
    pub fn popular() -> Self {
        Self { symbols: None }
    }

    pub fn symbols(symbols: Vec<String>) -> Result<Self, ValidationError> {
        if symbols.is_empty() {
            return Err(ValidationError::EmptySymbolList);
        }
        Ok(Self {
            symbols: Some(symbols),
        })
    }

    pub fn matches(&self, symbol: &str) -> bool {
        match &self.symbols {
            None => true,
            Some(symbols) => symbols.iter().any(|candidate| candidate == symbol),
        }
    }

    pub fn explicit_symbols(&self) -> Option<&[String]> {
        self.symbols.as_deref()
    }
}

/// Order history fetch filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub limit: usize,
}

impl OrderFilter {
    pub fn new(status: Option<String>, limit: usize) -> Result<Self, ValidationError> {
        if limit == 0 {
            return Err(ValidationError::ZeroOrderLimit);
        }
        Ok(Self { status, limit })
    }

    pub fn recent(limit: usize) -> Result<Self, ValidationError> {
        Self::new(None, limit)
    }
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            limit: 20,
        }
    }
}

/// Validated order placement request in unified terms.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    pub kind: OrderKind,
    pub limit_price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
    ) -> Result<Self, ValidationError> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity);
        }
        Ok(Self {
            symbol: symbol.into(),
            side,
            quantity,
            kind: OrderKind::Market,
            limit_price: None,
        })
    }

    pub fn limit(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Result<Self, ValidationError> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity);
        }
        if limit_price <= Decimal::ZERO {
            return Err(ValidationError::InvalidLimitPrice);
        }
        Ok(Self {
            symbol: symbol.into(),
            side,
            quantity,
            kind: OrderKind::Limit,
            limit_price: Some(limit_price),
        })
    }
}

/// Acknowledgement returned by a venue for a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub venue: VenueId,
    pub order_id: String,
    pub symbol: String,
    pub status: String,
}

/// Venue adapter contract.
///
/// Each method performs exactly one authenticated network round trip (or a
/// small bounded number), maps the venue's native JSON shape into unified
/// records, and never retries beyond its own bounded transport policy.
/// Implementations must be `Send + Sync`; the aggregator shares them across
/// concurrent fetches.
pub trait VenueAdapter: Send + Sync {
    /// Returns the venue this adapter integrates.
    fn id(&self) -> VenueId;

    /// Fetches account balances.
    ///
    /// # Errors
    ///
    /// Returns [`VenueError`] on auth failures, rate limiting, timeouts, or
    /// unexpected response shapes. The aggregator recovers these locally.
    fn fetch_balances<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedBalance>, VenueError>> + Send + 'a>>;

    /// Fetches market tickers for the given scope.
    fn fetch_tickers<'a>(
        &'a self,
        scope: TickerScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedTicker>, VenueError>> + Send + 'a>>;

    /// Fetches historical orders.
    fn fetch_order_history<'a>(
        &'a self,
        filter: OrderFilter,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedOrder>, VenueError>> + Send + 'a>>;

    /// Places an order and returns the venue's acknowledgement.
    ///
    /// Unlike the read paths, placement failures are surfaced to the caller;
    /// there is no fallback substitution on the write path.
    fn place_order<'a>(
        &'a self,
        request: OrderRequest,
    ) -> Pin<Box<dyn Future<Output = Result<OrderReceipt, VenueError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn ticker_scope_rejects_empty_symbol_list() {
        let err = TickerScope::symbols(vec![]).expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptySymbolList));
    }

    #[test]
    fn ticker_scope_filters_on_exact_venue_native_spelling() {
        let scope = TickerScope::symbols(vec![String::from("BTC-USDT")]).expect("valid");
        assert!(scope.matches("BTC-USDT"));
        assert!(!scope.matches("BTCUSDT"));
        assert!(TickerScope::popular().matches("BTCUSDT"));
    }

    #[test]
    fn order_filter_rejects_zero_limit() {
        let err = OrderFilter::new(None, 0).expect_err("must fail");
        assert!(matches!(err, ValidationError::ZeroOrderLimit));
    }

    #[test]
    fn limit_order_requires_positive_price() {
        let err = OrderRequest::limit("BTCUSDT", Side::Buy, dec!(1), dec!(0)).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidLimitPrice));

        let order = OrderRequest::limit("BTCUSDT", Side::Buy, dec!(1), dec!(50000)).expect("valid");
        assert_eq!(order.limit_price, Some(dec!(50000)));
    }

    #[test]
    fn market_order_rejects_non_positive_quantity() {
        let err = OrderRequest::market("BTCUSDT", Side::Sell, dec!(0)).expect_err("must fail");
        assert!(matches!(err, ValidationError::NonPositiveQuantity));
    }

    #[test]
    fn venue_error_exposes_stable_codes() {
        let error = VenueError::rate_limited(VenueId::Bybit, "upstream returned status 429");
        assert_eq!(error.code(), "venue.rate_limited");
        assert_eq!(error.venue(), VenueId::Bybit);
        assert_eq!(error.kind(), VenueErrorKind::RateLimited);
    }
}
