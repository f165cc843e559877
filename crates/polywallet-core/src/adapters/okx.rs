//! OKX spot client over the v5 REST API.
//!
//! Private endpoints sign with the base64 HMAC scheme (ISO timestamp, method,
//! path and raw body); market tickers are public.

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
use crate::signing::{HmacBase64Signer, SigningStrategy};
use crate::{OrderKind, Side, UnifiedBalance, UnifiedOrder, UnifiedTicker, UtcDateTime, VenueId};

const BASE_URL: &str = "https://www.okx.com";
const POPULAR_PAIRS: [&str; 5] = ["BTC-USDT", "ETH-USDT", "SOL-USDT", "ADA-USDT", "DOT-USDT"];

pub struct OkxAdapter {
    transport: VenueTransport,
    signer: HmacBase64Signer,
    base_url: String,
}

impl Default for OkxAdapter {
    fn default() -> Self {
        let api_key =
            std::env::var("POLYWALLET_OKX_API_KEY").unwrap_or_else(|_| String::from("demo"));
        let secret =
            std::env::var("POLYWALLET_OKX_API_SECRET").unwrap_or_else(|_| String::from("demo"));
        let passphrase =
            std::env::var("POLYWALLET_OKX_PASSPHRASE").unwrap_or_else(|_| String::from("demo"));
        Self::with_http_client(Arc::new(NoopHttpClient), api_key, secret, passphrase)
    }
}

impl OkxAdapter {
    pub fn with_http_client(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            transport: VenueTransport::new(VenueId::Okx, http_client),
            signer: HmacBase64Signer::new(api_key, secret, passphrase),
            base_url: String::from(BASE_URL),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn signed_get(&self, path_with_query: &str) -> HttpRequest {
        let timestamp = UtcDateTime::now().format_iso_millis();
        let headers = self
            .signer
            .sign(&timestamp, HttpMethod::Get, path_with_query, "");
        HttpRequest::get(format!("{}{path_with_query}", self.base_url)).with_headers(headers)
    }

    fn signed_post(&self, path: &str, body: String) -> HttpRequest {
        let timestamp = UtcDateTime::now().format_iso_millis();
        let headers = self.signer.sign(&timestamp, HttpMethod::Post, path, &body);
        HttpRequest::post(format!("{}{path}", self.base_url))
            .with_headers(headers)
            .with_body(body)
    }

    fn check_code(&self, code: &str, message: &str) -> Result<(), VenueError> {
        match code {
            "0" => Ok(()),
            "50111" | "50113" => Err(VenueError::auth_failure(
                VenueId::Okx,
                format!("code {code}: {message}"),
            )),
            "50011" => Err(VenueError::rate_limited(
                VenueId::Okx,
                format!("code {code}: {message}"),
            )),
            other => Err(VenueError::unknown(
                VenueId::Okx,
                format!("code {other}: {message}"),
            )),
        }
    }
}

impl VenueAdapter for OkxAdapter {
    fn id(&self) -> VenueId {
        VenueId::Okx
    }

    fn fetch_balances<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<UnifiedBalance>, VenueError>> + Send + 'a>> {
        Box::pin(async move {
            let request = self.signed_get("/api/v5/account/balance");
            let response = self.transport.send(request).await?;
            let envelope: OkxEnvelope<OkxBalanceEntry> = decode_json(VenueId::Okx, &response.body)?;
            self.check_code(&envelope.code, &envelope.msg)?;

            let mut balances = Vec::new();
            for entry in envelope.data {
                for detail in entry.details {
                    let quantity = parse_decimal(VenueId::Okx, "availBal", &detail.avail_bal)?;
                    balances.push(UnifiedBalance::new(
                        VenueId::Okx,
                        detail.ccy,
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
            let request =
                HttpRequest::get(format!("{}/api/v5/market/tickers?instType=SPOT", self.base_url));
            let response = self.transport.send(request).await?;
            let envelope: OkxEnvelope<OkxTickerEntry> = decode_json(VenueId::Okx, &response.body)?;
            self.check_code(&envelope.code, &envelope.msg)?;

            let mut unified = Vec::new();
            for ticker in envelope.data {
                if !symbol_allowed(&scope, &POPULAR_PAIRS, &ticker.inst_id) {
                    continue;
                }
                let last = parse_decimal(VenueId::Okx, "last", &ticker.last)?;
                let open = parse_decimal(VenueId::Okx, "open24h", &ticker.open_24h)?;
                let change_pct = if open.is_zero() {
                    Decimal::ZERO
                } else {
                    ((last - open) / open * Decimal::ONE_HUNDRED).round_dp(2)
                };
                unified.push(UnifiedTicker::new(
                    VenueId::Okx,
                    ticker.inst_id,
                    last,
                    change_pct,
                    change_pct,
                    parse_decimal(VenueId::Okx, "vol24h", &ticker.vol_24h)?,
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
            let mut path = format!("/api/v5/trade/orders-history?instType=SPOT&limit={}", filter.limit);
            if let Some(state) = &filter.status {
                path.push_str(&format!("&state={state}"));
            }

            let request = self.signed_get(&path);
            let response = self.transport.send(request).await?;
            let envelope: OkxEnvelope<OkxOrderEntry> = decode_json(VenueId::Okx, &response.body)?;
            self.check_code(&envelope.code, &envelope.msg)?;

            envelope
                .data
                .into_iter()
                .map(|order| {
                    Ok(UnifiedOrder::new(
                        VenueId::Okx,
                        order.ord_id,
                        order.inst_id,
                        Side::parse(&order.side).map_err(|error| {
                            VenueError::malformed_response(VenueId::Okx, error.to_string())
                        })?,
                        order.ord_type,
                        parse_decimal(VenueId::Okx, "sz", &order.sz)?,
                        parse_decimal_or_zero(&order.px),
                        order.state,
                        parse_epoch_millis(VenueId::Okx, "cTime", &order.c_time)?,
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
            let ord_type = match request.kind {
                OrderKind::Market => "market",
                OrderKind::Limit => "limit",
            };

            let mut body = json!({
                "instId": request.symbol,
                "tdMode": "cash",
                "side": request.side.as_str(),
                "ordType": ord_type,
                "sz": request.quantity.to_string(),
            });
            if let Some(price) = request.limit_price {
                body["px"] = json!(price.to_string());
            }

            let http = self.signed_post("/api/v5/trade/order", body.to_string());
            let response = self.transport.send(http).await?;
            let envelope: OkxEnvelope<OkxCreateEntry> = decode_json(VenueId::Okx, &response.body)?;
            self.check_code(&envelope.code, &envelope.msg)?;

            let created = envelope.data.into_iter().next().ok_or_else(|| {
                VenueError::malformed_response(VenueId::Okx, "order create response missing data")
            })?;

            Ok(OrderReceipt {
                venue: VenueId::Okx,
                order_id: created.ord_id,
                symbol: request.symbol,
                status: String::from("live"),
            })
        })
    }
}

#[derive(Debug, Deserialize)]
struct OkxEnvelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct OkxBalanceEntry {
    #[serde(default)]
    details: Vec<OkxBalanceDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxBalanceDetail {
    ccy: String,
    avail_bal: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxTickerEntry {
    inst_id: String,
    last: String,
    #[serde(rename = "open24h")]
    open_24h: String,
    #[serde(rename = "vol24h")]
    vol_24h: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxOrderEntry {
    ord_id: String,
    inst_id: String,
    side: String,
    ord_type: String,
    sz: String,
    px: String,
    state: String,
    c_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OkxCreateEntry {
    ord_id: String,
}
