//! Binance market-data client over the public v3 REST API.
//!
//! Only the public ticker surface is live. The account-balance endpoint and
//! order placement are stubbed simulations with no upstream call, so the
//! aggregator's fallback substitution covers this venue's account view.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::adapter::{OrderFilter, OrderReceipt, OrderRequest, TickerScope, VenueAdapter, VenueError};
use crate::adapters::{decode_json, parse_decimal, symbol_allowed, VenueTransport};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::{UnifiedBalance, UnifiedOrder, UnifiedTicker, UtcDateTime, VenueId};

const BASE_URL: &str = "https://data-api.binance.vision";
const POPULAR_PAIRS: [&str; 8] = [
    "BTCUSDT", "ETHUSDT", "SOLUSDT", "ADAUSDT", "DOTUSDT", "BNBUSDT", "XRPUSDT", "LTCUSDT",
];

pub struct BinanceAdapter {
    transport: VenueTransport,
    base_url: String,
}

impl Default for BinanceAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(NoopHttpClient))
    }
}

impl BinanceAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            transport: VenueTransport::new(VenueId::Binance, http_client),
            base_url: String::from(BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl VenueAdapter for BinanceAdapter {
    fn id(&self) -> VenueId {
        VenueId::Binance
    }

    // Account endpoint is not wired up; the aggregator substitutes its
    // placeholder for the empty result.
    fn fetch_balances<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedBalance>, VenueError>> + Send + 'a>> {
        Box::pin(async move { Ok(Vec::new()) })
    }

    fn fetch_tickers<'a>(
        &'a self,
        scope: TickerScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedTicker>, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let request = HttpRequest::get(format!("{}/api/v3/ticker/24hr", self.base_url));
            let response = self.transport.send(request).await?;
            let tickers: Vec<BinanceTickerEntry> = decode_json(VenueId::Binance, &response.body)?;

            let mut unified = Vec::new();
            for ticker in tickers {
                if !symbol_allowed(&scope, &POPULAR_PAIRS, &ticker.symbol) {
                    continue;
                }
                let change =
                    parse_decimal(VenueId::Binance, "priceChangePercent", &ticker.price_change_percent)?;
                unified.push(UnifiedTicker::new(
                    VenueId::Binance,
                    ticker.symbol,
                    parse_decimal(VenueId::Binance, "lastPrice", &ticker.last_price)?,
                    change,
                    change,
                    parse_decimal(VenueId::Binance, "volume", &ticker.volume)?,
                ));
            }
            Ok(unified)
        })
    }

    // History is stubbed; no authenticated surface is wired up for this venue.
    fn fetch_order_history<'a>(
        &'a self,
        filter: OrderFilter,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedOrder>, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let _ = filter;
            Ok(Vec::new())
        })
    }

    /// Simulated placement: acknowledges immediately without an upstream call.
    fn place_order<'a>(
        &'a self,
        request: OrderRequest,
    ) -> Pin<Box<dyn Future<Output = Result<OrderReceipt, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            Ok(OrderReceipt {
                venue: VenueId::Binance,
                order_id: UtcDateTime::now().unix_millis().to_string(),
                symbol: request.symbol,
                status: String::from("FILLED"),
            })
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTickerEntry {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    volume: String,
}
