//! Core contracts for polywallet.
//!
//! This crate unifies account balances, market tickers, and order history
//! from four independently-shaped trading venues into one data model, and
//! computes transfer-fee routing metadata between them.
//!
//! - **Canonical domain models** for balances, tickers, and orders, with
//!   decimal-exact money fields
//! - **Venue identifiers** and per-venue presentation metadata
//! - **Venue adapter trait** plus the four concrete venue clients
//! - **Signing strategies** for the venues' request-authentication schemes
//! - **Aggregator** with concurrent fan-out and per-venue fault isolation
//! - **Transfer router** over a static 16-pair fee table
//! - **Store** helpers for pure merge/sort/filter and portfolio totals
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use polywallet_core::{Aggregator, AggregatorBuilder, TickerScope};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Reads venue credentials from the environment; venues without keys
//!     // fall back to deterministic offline data.
//!     let aggregator = AggregatorBuilder::new().with_real_clients().build();
//!
//!     let balances = aggregator.aggregate_balances().await;
//!     let tickers = aggregator.aggregate_tickers(TickerScope::popular()).await;
//!
//!     for balance in &balances {
//!         println!("{} {} = {}", balance.venue, balance.asset, balance.quantity);
//!     }
//!     let _ = tickers;
//! }
//! ```
//!
//! # Fault isolation
//!
//! Read-path venue failures never surface to callers: the aggregator
//! substitutes one fixed placeholder record per failed or empty venue and
//! logs the failure with `tracing`. The write paths (order placement,
//! transfer initiation) surface explicit errors instead.

pub mod adapter;
pub mod adapters;
pub mod aggregator;
pub mod circuit_breaker;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod retry;
pub mod signing;
pub mod store;
pub mod transfer;
pub mod venue;

// Re-export commonly used types at crate root for convenience

pub use adapter::{
    OrderFilter, OrderReceipt, OrderRequest, TickerScope, VenueAdapter, VenueError, VenueErrorKind,
};
pub use adapters::{classify_asset, AlpacaAdapter, AssetKind, BinanceAdapter, BybitAdapter, OkxAdapter};
pub use aggregator::{Aggregator, AggregatorBuilder, AggregatorConfig};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use domain::{OrderKind, Side, UnifiedBalance, UnifiedOrder, UnifiedTicker, UtcDateTime};
pub use error::{CoreError, ValidationError};
pub use fallback::{fallback_balance, fallback_order, fallback_ticker};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};
pub use retry::RetryConfig;
pub use signing::{canonical_query, HmacBase64Signer, HmacHexSigner, SigningStrategy, StaticKeySigner};
pub use store::{
    broker_asset_class_totals, dedupe_balances, filter_orders, sort_orders_desc, PortfolioSummary,
};
pub use transfer::{
    compute_transfer, initiate_transfer, resolve_route, FeeKind, TransferQuote, TransferRejection,
    TransferResult, TransferRoute, TransferState,
};
pub use venue::VenueId;
