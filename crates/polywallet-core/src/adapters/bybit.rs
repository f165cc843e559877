//! Bybit spot client over the v5 REST API.
//!
//! Private endpoints sign with the hex HMAC scheme; market tickers are public.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::adapter::{OrderFilter, OrderReceipt, OrderRequest, TickerScope, VenueAdapter, VenueError};
use crate::adapters::{
    decode_json, parse_decimal, parse_decimal_or_zero, parse_epoch_millis, symbol_allowed,
    VenueTransport,
};
use crate::http_client::{HttpClient, HttpMethod, HttpRequest, NoopHttpClient};
use crate::signing::{HmacHexSigner, SigningStrategy};
use crate::{OrderKind, Side, UnifiedBalance, UnifiedOrder, UnifiedTicker, UtcDateTime, VenueId};

const BASE_URL: &str = "https://api.bybit.com";
const POPULAR_PAIRS: [&str; 5] = ["BTCUSDT", "ETHUSDT", "SOLUSDT", "ADAUSDT", "DOTUSDT"];

pub struct BybitAdapter {
    transport: VenueTransport,
    signer: HmacHexSigner,
    base_url: String,
}

impl Default for BybitAdapter {
    fn default() -> Self {
        let api_key =
            std::env::var("POLYWALLET_BYBIT_API_KEY").unwrap_or_else(|_| String::from("demo"));
        let secret =
            std::env::var("POLYWALLET_BYBIT_API_SECRET").unwrap_or_else(|_| String::from("demo"));
        Self::with_http_client(Arc::new(NoopHttpClient), api_key, secret)
    }
}

impl BybitAdapter {
    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            transport: VenueTransport::new(VenueId::Bybit, http_client),
            signer: HmacHexSigner::new(api_key, secret),
            base_url: String::from(BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn signed_get(&self, path_with_query: &str) -> HttpRequest {
        let timestamp = UtcDateTime::now().unix_millis().to_string();
        let headers = self
            .signer
            .sign(&timestamp, HttpMethod::Get, path_with_query, "");
        HttpRequest::get(format!("{}{path_with_query}", self.base_url)).with_headers(headers)
    }

    fn signed_post(&self, path: &str, body: String) -> HttpRequest {
        let timestamp = UtcDateTime::now().unix_millis().to_string();
        let headers = self.signer.sign(&timestamp, HttpMethod::Post, path, &body);
        HttpRequest::post(format!("{}{path}", self.base_url))
            .with_headers(headers)
            .with_body(body)
    }

    fn check_ret_code(&self, code: i64, message: &str) -> Result<(), VenueError> {
        match code {
            0 => Ok(()),
            10003 | 10004 => Err(VenueError::auth_failure(
                VenueId::Bybit,
                format!("ret code {code}: {message}"),
            )),
            10006 => Err(VenueError::rate_limited(
                VenueId::Bybit,
                format!("ret code {code}: {message}"),
            )),
            other => Err(VenueError::unknown(
                VenueId::Bybit,
                format!("ret code {other}: {message}"),
            )),
        }
    }
}

impl VenueAdapter for BybitAdapter {
    fn id(&self) -> VenueId {
        VenueId::Bybit
    }

    fn fetch_balances<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedBalance>, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let request = self.signed_get("/v5/account/wallet-balance?accountType=SPOT");
            let response = self.transport.send(request).await?;
            let envelope: BybitEnvelope<BybitBalanceResult> =
                decode_json(VenueId::Bybit, &response.body)?;
            self.check_ret_code(envelope.ret_code, &envelope.ret_msg)?;

            let accounts = envelope.result.map(|result| result.list).unwrap_or_default();
            let mut balances = Vec::new();
            for account in accounts {
                for coin in account.coin {
                    let quantity = parse_decimal(VenueId::Bybit, "walletBalance", &coin.wallet_balance)?;
                    balances.push(UnifiedBalance::new(
                        VenueId::Bybit,
                        coin.coin,
                        quantity,
                        Decimal::ZERO,
                    ));
                }
            }
            Ok(balances)
        })
    }

    fn fetch_tickers<'a>(
        &'a self,
        scope: TickerScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedTicker>, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let request = HttpRequest::get(format!("{}/v5/market/tickers?category=spot", self.base_url));
            let response = self.transport.send(request).await?;
            let envelope: BybitEnvelope<BybitTickerResult> =
                decode_json(VenueId::Bybit, &response.body)?;
            self.check_ret_code(envelope.ret_code, &envelope.ret_msg)?;

            let tickers = envelope.result.map(|result| result.list).unwrap_or_default();
            let mut unified = Vec::new();
            for ticker in tickers {
                if !symbol_allowed(&scope, &POPULAR_PAIRS, &ticker.symbol) {
                    continue;
                }
                let change = parse_decimal(VenueId::Bybit, "priceChangePercent", &ticker.price_change_percent)?;
                unified.push(UnifiedTicker::new(
                    VenueId::Bybit,
                    ticker.symbol,
                    parse_decimal(VenueId::Bybit, "lastPrice", &ticker.last_price)?,
                    change,
                    change,
                    parse_decimal(VenueId::Bybit, "volume24h", &ticker.volume_24h)?,
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
            let request = self.signed_get(&format!(
                "/v5/order/history?category=spot&limit={}",
                filter.limit
            ));
            let response = self.transport.send(request).await?;
            let envelope: BybitEnvelope<BybitOrderResult> =
                decode_json(VenueId::Bybit, &response.body)?;
            self.check_ret_code(envelope.ret_code, &envelope.ret_msg)?;

            let orders = envelope.result.map(|result| result.list).unwrap_or_default();
            orders
                .into_iter()
                .map(|order| {
                    Ok(UnifiedOrder::new(
                        VenueId::Bybit,
                        order.order_id,
                        order.symbol,
                        Side::parse(&order.side).map_err(|error| {
                            VenueError::malformed_response(VenueId::Bybit, error.to_string())
                        })?,
                        order.order_type,
                        parse_decimal(VenueId::Bybit, "qty", &order.qty)?,
                        parse_decimal_or_zero(&order.price),
                        order.order_status,
                        parse_epoch_millis(VenueId::Bybit, "createTime", &order.create_time)?,
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
            let side = match request.side {
                Side::Buy => "Buy",
                Side::Sell => "Sell",
            };
            let order_type = match request.kind {
                OrderKind::Market => "Market",
                OrderKind::Limit => "Limit",
            };

            let mut body = json!({
                "category": "spot",
                "symbol": request.symbol,
                "side": side,
                "orderType": order_type,
                "qty": request.quantity.to_string(),
            });
            if let Some(price) = request.limit_price {
                body["price"] = json!(price.to_string());
            }

            let http = self.signed_post("/v5/order/create", body.to_string());
            let response = self.transport.send(http).await?;
            let envelope: BybitEnvelope<BybitCreateResult> =
                decode_json(VenueId::Bybit, &response.body)?;
            self.check_ret_code(envelope.ret_code, &envelope.ret_msg)?;

            let created = envelope.result.ok_or_else(|| {
                VenueError::malformed_response(VenueId::Bybit, "order create response missing result")
            })?;

            Ok(OrderReceipt {
                venue: VenueId::Bybit,
                order_id: created.order_id,
                symbol: request.symbol,
                status: String::from("Created"),
            })
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitEnvelope<T> {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BybitBalanceResult {
    #[serde(default)]
    list: Vec<BybitBalanceAccount>,
}

#[derive(Debug, Deserialize)]
struct BybitBalanceAccount {
    #[serde(default)]
    coin: Vec<BybitCoinBalance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitCoinBalance {
    coin: String,
    wallet_balance: String,
}

#[derive(Debug, Deserialize)]
struct BybitTickerResult {
    #[serde(default)]
    list: Vec<BybitTickerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitTickerEntry {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    #[serde(rename = "volume24h")]
    volume_24h: String,
}

#[derive(Debug, Deserialize)]
struct BybitOrderResult {
    #[serde(default)]
    list: Vec<BybitOrderEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitOrderEntry {
    order_id: String,
    symbol: String,
    side: String,
    order_type: String,
    qty: String,
    price: String,
    order_status: String,
    create_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitCreateResult {
    order_id: String,
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::adapter::VenueErrorKind;
    use crate::adapters::testkit::RecordingHttpClient;

    const BALANCE_FIXTURE: &str = r#"{
        "retCode": 0,
        "retMsg": "OK",
        "result": {
            "list": [
                {
                    "accountType": "SPOT",
                    "coin": [
                        {"coin": "BTC", "walletBalance": "0.5"},
                        {"coin": "USDT", "walletBalance": "1200.25"}
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn balance_request_carries_hex_hmac_headers() {
        let client = Arc::new(RecordingHttpClient::respond_json(BALANCE_FIXTURE));
        let adapter = BybitAdapter::with_http_client(client.clone(), "key", "secret");

        let balances = block_on(adapter.fetch_balances()).expect("balances should parse");
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].asset, "BTC");
        assert_eq!(balances[0].quantity.to_string(), "0.5");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.ends_with("/v5/account/wallet-balance?accountType=SPOT"));
        for header in ["x-bapi-api-key", "x-bapi-sign", "x-bapi-timestamp", "x-bapi-recv-window"] {
            assert!(requests[0].headers.contains_key(header), "missing {header}");
        }
    }

    #[test]
    fn auth_ret_code_maps_to_auth_failure() {
        let client = Arc::new(RecordingHttpClient::respond_json(
            r#"{"retCode": 10003, "retMsg": "invalid api key"}"#,
        ));
        let adapter = BybitAdapter::with_http_client(client, "key", "secret");

        let error = block_on(adapter.fetch_balances()).expect_err("must fail");
        assert_eq!(error.kind(), VenueErrorKind::AuthFailure);
    }

    #[test]
    fn tickers_default_to_popular_pairs() {
        let client = Arc::new(RecordingHttpClient::respond_json(
            r#"{
                "retCode": 0,
                "retMsg": "OK",
                "result": {
                    "list": [
                        {"symbol": "BTCUSDT", "lastPrice": "103603.7", "priceChangePercent": "-0.99", "volume24h": "45623789"},
                        {"symbol": "SHIBUSDT", "lastPrice": "0.00001", "priceChangePercent": "4.2", "volume24h": "1"}
                    ]
                }
            }"#,
        ));
        let adapter = BybitAdapter::with_http_client(client, "key", "secret");

        let tickers = block_on(adapter.fetch_tickers(TickerScope::popular())).expect("tickers parse");
        assert_eq!(tickers.len(), 1);
        assert_eq!(tickers[0].symbol, "BTCUSDT");
        assert_eq!(tickers[0].change_pct.to_string(), "-0.99");
    }

    #[test]
    fn market_order_body_omits_price() {
        let client = Arc::new(RecordingHttpClient::respond_json(
            r#"{"retCode": 0, "retMsg": "OK", "result": {"orderId": "1321003749386327552"}}"#,
        ));
        let adapter = BybitAdapter::with_http_client(client.clone(), "key", "secret");
        let order = OrderRequest::market("BTCUSDT", Side::Buy, rust_decimal_macros::dec!(0.1))
            .expect("valid request");

        let receipt = block_on(adapter.place_order(order)).expect("order placed");
        assert_eq!(receipt.order_id, "1321003749386327552");
        assert_eq!(receipt.status, "Created");

        let requests = client.recorded_requests();
        let body = requests[0].body.as_deref().expect("body present");
        assert!(body.contains("\"orderType\":\"Market\""));
        assert!(!body.contains("price"));
    }
}
