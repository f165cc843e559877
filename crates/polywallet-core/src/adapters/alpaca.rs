//! Alpaca multi-asset broker client (equities, forex, cash).
//!
//! Auth is a fixed key/secret header pair on every request; there is no
//! per-request signature. The trading API serves account/positions/orders,
//! the data API serves forex rates.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::adapter::{OrderFilter, OrderReceipt, OrderRequest, TickerScope, VenueAdapter, VenueError};
use crate::adapters::{decode_json, symbol_allowed, VenueTransport};
use crate::http_client::{HttpClient, HttpMethod, HttpRequest, NoopHttpClient};
use crate::signing::{SigningStrategy, StaticKeySigner};
use crate::{OrderKind, Side, UnifiedBalance, UnifiedOrder, UnifiedTicker, UtcDateTime, VenueId};

const TRADING_URL: &str = "https://paper-api.alpaca.markets";
const DATA_URL: &str = "https://data.alpaca.markets";
const MAJOR_PAIRS: [&str; 7] = [
    "EUR/USD", "GBP/USD", "USD/JPY", "USD/CHF", "AUD/USD", "USD/CAD", "NZD/USD",
];
const CASH_SYMBOL: &str = "USD";

/// Broker-side asset classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Forex,
    Cash,
    Equity,
}

/// Syntactic classification convention downstream display code relies on:
/// a `/` in the symbol denotes forex, exact match to the cash symbol denotes
/// cash, anything else is an equity.
pub fn classify_asset(symbol: &str) -> AssetKind {
    if symbol.contains('/') {
        AssetKind::Forex
    } else if symbol == CASH_SYMBOL {
        AssetKind::Cash
    } else {
        AssetKind::Equity
    }
}

pub struct AlpacaAdapter {
    transport: VenueTransport,
    signer: StaticKeySigner,
    trading_url: String,
    data_url: String,
}

impl Default for AlpacaAdapter {
    fn default() -> Self {
        let api_key =
            std::env::var("POLYWALLET_ALPACA_API_KEY").unwrap_or_else(|_| String::from("demo"));
        let secret_key =
            std::env::var("POLYWALLET_ALPACA_SECRET_KEY").unwrap_or_else(|_| String::from("demo"));
        Self::with_http_client(Arc::new(NoopHttpClient), api_key, secret_key)
    }
}

impl AlpacaAdapter {
    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            transport: VenueTransport::new(VenueId::Alpaca, http_client),
            signer: StaticKeySigner::new(vec![
                (String::from("APCA-API-KEY-ID"), api_key.into()),
                (String::from("APCA-API-SECRET-KEY"), secret_key.into()),
            ]),
            trading_url: String::from(TRADING_URL),
            data_url: String::from(DATA_URL),
        }
    }

    pub fn with_urls(mut self, trading_url: impl Into<String>, data_url: impl Into<String>) -> Self {
        self.trading_url = trading_url.into();
        self.data_url = data_url.into();
        self
    }

    fn authed_get(&self, base: &str, path_with_query: &str) -> HttpRequest {
        let headers = self.signer.sign("", HttpMethod::Get, path_with_query, "");
        HttpRequest::get(format!("{base}{path_with_query}")).with_headers(headers)
    }

    fn authed_post(&self, path: &str, body: String) -> HttpRequest {
        let headers = self.signer.sign("", HttpMethod::Post, path, &body);
        HttpRequest::post(format!("{}{path}", self.trading_url))
            .with_headers(headers)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }
}

impl VenueAdapter for AlpacaAdapter {
    fn id(&self) -> VenueId {
        VenueId::Alpaca
    }

    fn fetch_balances<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedBalance>, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let account_response = self
                .transport
                .send(self.authed_get(&self.trading_url, "/v2/account"))
                .await?;
            let account: AlpacaAccount = decode_json(VenueId::Alpaca, &account_response.body)?;

            let mut balances = vec![UnifiedBalance::new(
                VenueId::Alpaca,
                CASH_SYMBOL,
                account.cash,
                account.cash,
            )];

            let positions_response = self
                .transport
                .send(self.authed_get(&self.trading_url, "/v2/positions"))
                .await?;
            let positions: Vec<AlpacaPosition> =
                decode_json(VenueId::Alpaca, &positions_response.body)?;

            for position in positions {
                balances.push(UnifiedBalance::new(
                    VenueId::Alpaca,
                    position.symbol,
                    position.qty,
                    position.market_value,
                ));
            }
            Ok(balances)
        })
    }

    fn fetch_tickers<'a>(
        &'a self,
        scope: TickerScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedTicker>, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let pairs: Vec<String> = match scope.explicit_symbols() {
                Some(symbols) => symbols.to_vec(),
                None => MAJOR_PAIRS.iter().map(|pair| String::from(*pair)).collect(),
            };

            let path = format!(
                "/v1beta1/forex/latest/rates?currency_pairs={}",
                pairs.join(",")
            );
            let response = self.transport.send(self.authed_get(&self.data_url, &path)).await?;
            let rates: AlpacaForexRates = decode_json(VenueId::Alpaca, &response.body)?;

            let mut unified = Vec::new();
            for pair in pairs {
                if !symbol_allowed(&scope, &MAJOR_PAIRS, &pair) {
                    continue;
                }
                let rate = rates.rates.get(&pair.replace('/', ""));
                let ask = rate.map(|rate| rate.ask).unwrap_or(Decimal::ZERO);
                unified.push(UnifiedTicker::new(
                    VenueId::Alpaca,
                    pair,
                    ask,
                    Decimal::ZERO,
                    Decimal::ZERO,
                    Decimal::ZERO,
                ));
            }
            Ok(unified)
        })
    }

    fn fetch_order_history<'a>(
        &'a self,
        filter: OrderFilter,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedOrder>, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let mut path = format!("/v2/orders?limit={}", filter.limit);
            if let Some(status) = &filter.status {
                path.push_str(&format!("&status={status}"));
            }

            let response = self
                .transport
                .send(self.authed_get(&self.trading_url, &path))
                .await?;
            let orders: Vec<AlpacaOrder> = decode_json(VenueId::Alpaca, &response.body)?;

            orders
                .into_iter()
                .map(|order| {
                    let submitted_at = UtcDateTime::parse(&order.submitted_at).map_err(|error| {
                        VenueError::malformed_response(VenueId::Alpaca, error.to_string())
                    })?;
                    Ok(UnifiedOrder::new(
                        VenueId::Alpaca,
                        order.id,
                        order.symbol,
                        Side::parse(&order.side).map_err(|error| {
                            VenueError::malformed_response(VenueId::Alpaca, error.to_string())
                        })?,
                        order.order_type,
                        order.qty,
                        order.limit_price.unwrap_or(Decimal::ZERO),
                        order.status,
                        submitted_at,
                    ))
                })
                .collect()
        })
    }

    fn place_order<'a>(
        &'a self,
        request: OrderRequest,
    ) -> Pin<Box<dyn Future<Output = Result<OrderReceipt, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let order_type = match request.kind {
                OrderKind::Market => "market",
                OrderKind::Limit => "limit",
            };

            let mut body = json!({
                "symbol": request.symbol,
                "qty": request.quantity.to_string(),
                "side": request.side.as_str(),
                "type": order_type,
                "time_in_force": "gtc",
            });
            if let Some(price) = request.limit_price {
                body["limit_price"] = json!(price.to_string());
            }

            let http = self.authed_post("/v2/orders", body.to_string());
            let response = self.transport.send(http).await?;
            let created: AlpacaOrderAck = decode_json(VenueId::Alpaca, &response.body)?;

            Ok(OrderReceipt {
                venue: VenueId::Alpaca,
                order_id: created.id,
                symbol: request.symbol,
                status: created.status,
            })
        })
    }
}

#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    cash: Decimal,
}

#[derive(Debug, Deserialize)]
struct AlpacaPosition {
    symbol: String,
    qty: Decimal,
    market_value: Decimal,
}

#[derive(Debug, Deserialize)]
struct AlpacaForexRates {
    #[serde(default)]
    rates: BTreeMap<String, AlpacaForexRate>,
}

#[derive(Debug, Deserialize)]
struct AlpacaForexRate {
    ask: Decimal,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    id: String,
    symbol: String,
    side: String,
    order_type: String,
    qty: Decimal,
    limit_price: Option<Decimal>,
    status: String,
    submitted_at: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrderAck {
    id: String,
    status: String,
}
