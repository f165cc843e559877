//! Multi-venue fan-out, normalization, and fault isolation.
//!
//! The aggregator launches one fetch per enabled venue concurrently, waits for
//! all of them (no fail-fast), and substitutes a deterministic placeholder for
//! any venue whose call failed or returned nothing. It never raises an
//! aggregate-level error: one venue's outage can never empty another venue's
//! rows or abort the merged view.

use std::collections::{HashMap, HashSet};
use std::env;
use std::sync::{Arc, RwLock};

use futures::future;
use tracing::warn;

use crate::adapter::{OrderFilter, OrderReceipt, OrderRequest, TickerScope, VenueAdapter, VenueError};
use crate::adapters::{AlpacaAdapter, BinanceAdapter, BybitAdapter, OkxAdapter};
use crate::fallback::{fallback_balance, fallback_order, fallback_ticker};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::store::{dedupe_balances, sort_orders_desc, PortfolioSummary};
use crate::{UnifiedBalance, UnifiedOrder, UnifiedTicker, VenueId};

/// Runtime-mutable enabled-venue set.
///
/// Toggles take effect on the next aggregation call. Readers snapshot the set
/// under a read lock; a snapshot taken just before or after a concurrent
/// toggle is an acceptable, non-corrupting race.
#[derive(Debug)]
pub struct AggregatorConfig {
    enabled: RwLock<HashSet<VenueId>>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl AggregatorConfig {
    pub fn all_enabled() -> Self {
        Self::new(VenueId::ALL)
    }

    pub fn new(venues: impl IntoIterator<Item = VenueId>) -> Self {
        Self {
            enabled: RwLock::new(venues.into_iter().collect()),
        }
    }

    pub fn enable_venue(&self, venue: VenueId) {
        self.enabled
            .write()
            .expect("enabled-venue lock is not poisoned")
            .insert(venue);
    }

    pub fn disable_venue(&self, venue: VenueId) {
        self.enabled
            .write()
            .expect("enabled-venue lock is not poisoned")
            .remove(&venue);
    }

    pub fn is_enabled(&self, venue: VenueId) -> bool {
        self.enabled
            .read()
            .expect("enabled-venue lock is not poisoned")
            .contains(&venue)
    }

    /// Stable-ordered snapshot used for one aggregation pass.
    pub fn snapshot(&self) -> Vec<VenueId> {
        let enabled = self
            .enabled
            .read()
            .expect("enabled-venue lock is not poisoned");
        VenueId::ALL
            .into_iter()
            .filter(|venue| enabled.contains(venue))
            .collect()
    }
}

/// Adapter registry and fan-out engine.
pub struct Aggregator {
    config: Arc<AggregatorConfig>,
    adapters: HashMap<VenueId, Arc<dyn VenueAdapter>>,
}

type FetchFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<T>, VenueError>> + Send + 'a>>;

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(
            Arc::new(AggregatorConfig::all_enabled()),
            vec![
                Arc::new(BybitAdapter::default()),
                Arc::new(OkxAdapter::default()),
                Arc::new(BinanceAdapter::default()),
                Arc::new(AlpacaAdapter::default()),
            ],
        )
    }
}

impl Aggregator {
    pub fn new(config: Arc<AggregatorConfig>, adapters: Vec<Arc<dyn VenueAdapter>>) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Self { config, adapters }
    }

    pub fn config(&self) -> &Arc<AggregatorConfig> {
        &self.config
    }

    /// Balances across all enabled venues; at least one row per enabled venue.
    pub async fn aggregate_balances(&self) -> Vec<UnifiedBalance> {
        let merged = self
            .fan_out(|adapter| adapter.fetch_balances(), fallback_balance)
            .await;
        dedupe_balances(merged)
    }

    /// Tickers across all enabled venues; at least one row per enabled venue.
    pub async fn aggregate_tickers(&self, scope: TickerScope) -> Vec<UnifiedTicker> {
        self.fan_out(
            move |adapter| adapter.fetch_tickers(scope.clone()),
            fallback_ticker,
        )
        .await
    }

    /// Order history across all enabled venues, newest first.
    pub async fn aggregate_orders(&self, filter: OrderFilter) -> Vec<UnifiedOrder> {
        let mut merged = self
            .fan_out(
                move |adapter| adapter.fetch_order_history(filter.clone()),
                fallback_order,
            )
            .await;
        sort_orders_desc(&mut merged);
        merged
    }

    /// Portfolio totals over a fresh balance aggregation.
    pub async fn total_portfolio_value(&self) -> PortfolioSummary {
        PortfolioSummary::from_balances(&self.aggregate_balances().await)
    }

    /// Routes an order to one venue's adapter.
    ///
    /// The write path has no fallback: venue errors surface to the caller.
    pub async fn place_order(
        &self,
        venue: VenueId,
        request: OrderRequest,
    ) -> Result<OrderReceipt, VenueError> {
        let adapter = self.adapters.get(&venue).ok_or_else(|| {
            VenueError::unknown(venue, "venue adapter is not registered")
        })?;
        adapter.place_order(request).await
    }

    /// Fan-out with per-branch fallback: the single combinator behind all
    /// three read operations. Every enabled venue's fetch runs concurrently
    /// and resolves independently to either its live records or exactly one
    /// placeholder.
    async fn fan_out<T, FetchFn>(&self, fetch: FetchFn, fallback: fn(VenueId) -> T) -> Vec<T>
    where
        FetchFn: for<'a> Fn(&'a dyn VenueAdapter) -> FetchFuture<'a, T>,
    {
        let venues = self.config.snapshot();
        let fetch = &fetch;

        let branches = venues.into_iter().map(|venue| {
            let adapter = self.adapters.get(&venue).cloned();
            async move {
                let Some(adapter) = adapter else {
                    warn!(venue = %venue, "venue adapter is not registered; substituting placeholder");
                    return vec![fallback(venue)];
                };

                match fetch(adapter.as_ref()).await {
                    Ok(records) if !records.is_empty() => records,
                    Ok(_) => {
                        warn!(venue = %venue, "venue returned no records; substituting placeholder");
                        vec![fallback(venue)]
                    }
                    Err(error) => {
                        warn!(
                            venue = %venue,
                            code = error.code(),
                            message = error.message(),
                            "venue fetch failed; substituting placeholder"
                        );
                        vec![fallback(venue)]
                    }
                }
            }
        });

        future::join_all(branches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Builder wiring adapters with real HTTP clients from environment-variable
/// credentials, or deterministic offline clients when keys are absent.
#[derive(Debug, Default)]
pub struct AggregatorBuilder {
    use_real_clients: bool,
    bybit_keys: Option<(String, String)>,
    okx_keys: Option<(String, String, String)>,
    alpaca_keys: Option<(String, String)>,
    disabled: Vec<VenueId>,
}

impl AggregatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read credentials from the environment and use reqwest transports.
    /// Venues without credentials stay on the offline client and therefore
    /// resolve to their placeholders.
    pub fn with_real_clients(mut self) -> Self {
        self.use_real_clients = true;
        self.bybit_keys = read_env_pair("POLYWALLET_BYBIT_API_KEY", "POLYWALLET_BYBIT_API_SECRET");
        self.okx_keys = match (
            env::var("POLYWALLET_OKX_API_KEY"),
            env::var("POLYWALLET_OKX_API_SECRET"),
            env::var("POLYWALLET_OKX_PASSPHRASE"),
        ) {
            (Ok(key), Ok(secret), Ok(passphrase)) => Some((key, secret, passphrase)),
            _ => None,
        };
        self.alpaca_keys =
            read_env_pair("POLYWALLET_ALPACA_API_KEY", "POLYWALLET_ALPACA_SECRET_KEY");
        self
    }

    pub fn with_bybit_keys(mut self, api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.bybit_keys = Some((api_key.into(), secret.into()));
        self
    }

    pub fn with_okx_keys(
        mut self,
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.okx_keys = Some((api_key.into(), secret.into(), passphrase.into()));
        self
    }

    pub fn with_alpaca_keys(
        mut self,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.alpaca_keys = Some((api_key.into(), secret_key.into()));
        self
    }

    pub fn with_venue_disabled(mut self, venue: VenueId) -> Self {
        self.disabled.push(venue);
        self
    }

    pub fn build(self) -> Aggregator {
        let config = AggregatorConfig::all_enabled();
        for venue in &self.disabled {
            config.disable_venue(*venue);
        }

        if !self.use_real_clients {
            return Aggregator::new(
                Arc::new(config),
                vec![
                    Arc::new(BybitAdapter::default()),
                    Arc::new(OkxAdapter::default()),
                    Arc::new(BinanceAdapter::default()),
                    Arc::new(AlpacaAdapter::default()),
                ],
            );
        }

        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

        let bybit: Arc<dyn VenueAdapter> = match &self.bybit_keys {
            Some((key, secret)) => {
                Arc::new(BybitAdapter::with_http_client(http.clone(), key, secret))
            }
            None => Arc::new(BybitAdapter::default()),
        };
        let okx: Arc<dyn VenueAdapter> = match &self.okx_keys {
            Some((key, secret, passphrase)) => Arc::new(OkxAdapter::with_http_client(
                http.clone(),
                key,
                secret,
                passphrase,
            )),
            None => Arc::new(OkxAdapter::default()),
        };
        let binance: Arc<dyn VenueAdapter> =
            Arc::new(BinanceAdapter::with_http_client(http.clone()));
        let alpaca: Arc<dyn VenueAdapter> = match &self.alpaca_keys {
            Some((key, secret)) => {
                Arc::new(AlpacaAdapter::with_http_client(http, key, secret))
            }
            None => Arc::new(AlpacaAdapter::default()),
        };

        Aggregator::new(Arc::new(config), vec![bybit, okx, binance, alpaca])
    }
}

fn read_env_pair(first: &str, second: &str) -> Option<(String, String)> {
    match (env::var(first), env::var(second)) {
        (Ok(a), Ok(b)) => Some((a, b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn offline_aggregation_yields_one_placeholder_per_enabled_venue() {
        // Default adapters use the offline transport, so every venue resolves
        // to its fallback record.
        let aggregator = Aggregator::default();

        let balances = block_on(aggregator.aggregate_balances());
        assert_eq!(balances.len(), VenueId::ALL.len());
        for venue in VenueId::ALL {
            assert_eq!(balances.iter().filter(|b| b.venue == venue).count(), 1);
        }
    }

    #[test]
    fn disabling_a_venue_removes_only_its_rows() {
        let aggregator = Aggregator::default();
        aggregator.config().disable_venue(VenueId::Okx);

        let balances = block_on(aggregator.aggregate_balances());
        assert_eq!(balances.len(), 3);
        assert!(balances.iter().all(|b| b.venue != VenueId::Okx));

        aggregator.config().enable_venue(VenueId::Okx);
        let balances = block_on(aggregator.aggregate_balances());
        assert_eq!(balances.len(), 4);
    }

    #[test]
    fn snapshot_is_stably_ordered() {
        let config = AggregatorConfig::all_enabled();
        config.disable_venue(VenueId::Bybit);
        assert_eq!(
            config.snapshot(),
            vec![VenueId::Okx, VenueId::Binance, VenueId::Alpaca]
        );
    }

    #[test]
    fn placing_at_an_unregistered_venue_surfaces_an_error() {
        let aggregator = Aggregator::new(Arc::new(AggregatorConfig::all_enabled()), vec![]);
        let request = OrderRequest::market("BTCUSDT", crate::Side::Buy, rust_decimal_macros::dec!(1))
            .expect("valid request");

        let error = block_on(aggregator.place_order(VenueId::Bybit, request)).expect_err("must fail");
        assert_eq!(error.venue(), VenueId::Bybit);
    }
}
