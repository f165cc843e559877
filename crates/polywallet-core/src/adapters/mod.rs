//! Venue adapters (Bybit, OKX, Binance, Alpaca).

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::adapter::VenueError;
use crate::circuit_breaker::CircuitBreaker;
use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest, HttpResponse};
use crate::retry::RetryConfig;
use crate::{UtcDateTime, VenueId};

mod alpaca;
mod binance;
mod bybit;
mod okx;

pub use alpaca::{classify_asset, AlpacaAdapter, AssetKind};
pub use binance::BinanceAdapter;
pub use bybit::BybitAdapter;
pub use okx::OkxAdapter;

/// Shared transport wrapper: circuit breaker, bounded retry, and uniform
/// status-to-error mapping for one venue.
pub(crate) struct VenueTransport {
    venue: VenueId,
    client: Arc<dyn HttpClient>,
    breaker: CircuitBreaker,
    retry: RetryConfig,
}

impl VenueTransport {
    pub(crate) fn new(venue: VenueId, client: Arc<dyn HttpClient>) -> Self {
        Self {
            venue,
            client,
            breaker: CircuitBreaker::default(),
            retry: RetryConfig::default(),
        }
    }

    pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse, VenueError> {
        if !self.breaker.allow_request() {
            return Err(VenueError::unknown(
                self.venue,
                "circuit breaker open; skipping upstream call",
            ));
        }

        let mut attempt: u32 = 0;
        loop {
            match self.client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    self.breaker.record_success();
                    return Ok(response);
                }
                Ok(response) => {
                    self.breaker.record_failure();
                    if self.retry.should_retry_status(response.status)
                        && attempt < self.retry.max_retries
                    {
                        attempt += 1;
                        tokio::time::sleep(self.retry.delay).await;
                        continue;
                    }
                    return Err(self.status_error(response.status));
                }
                Err(error) => {
                    self.breaker.record_failure();
                    if self.retry.enabled && error.retryable() && attempt < self.retry.max_retries {
                        attempt += 1;
                        tokio::time::sleep(self.retry.delay).await;
                        continue;
                    }
                    return Err(match error.kind() {
                        HttpErrorKind::Timeout => VenueError::timeout(self.venue, error.message()),
                        _ => VenueError::unknown(self.venue, error.message()),
                    });
                }
            }
        }
    }

    fn status_error(&self, status: u16) -> VenueError {
        match status {
            401 | 403 => VenueError::auth_failure(
                self.venue,
                format!("upstream returned status {status}"),
            ),
            429 => VenueError::rate_limited(self.venue, "upstream returned status 429"),
            status => VenueError::unknown(self.venue, format!("upstream returned status {status}")),
        }
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(venue: VenueId, body: &str) -> Result<T, VenueError> {
    serde_json::from_str(body)
        .map_err(|error| VenueError::malformed_response(venue, format!("failed to decode payload: {error}")))
}

pub(crate) fn parse_decimal(venue: VenueId, field: &'static str, raw: &str) -> Result<Decimal, VenueError> {
    Decimal::from_str(raw.trim()).map_err(|_| {
        VenueError::malformed_response(venue, format!("field '{field}' is not a decimal: '{raw}'"))
    })
}

/// Lenient decimal parse for fields venues leave empty on market orders.
pub(crate) fn parse_decimal_or_zero(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or(Decimal::ZERO)
}

pub(crate) fn parse_epoch_millis(venue: VenueId, field: &'static str, raw: &str) -> Result<UtcDateTime, VenueError> {
    let millis = raw.trim().parse::<i64>().map_err(|_| {
        VenueError::malformed_response(venue, format!("field '{field}' is not epoch millis: '{raw}'"))
    })?;
    UtcDateTime::from_unix_millis(millis).map_err(|error| {
        VenueError::malformed_response(venue, format!("field '{field}': {error}"))
    })
}

/// Scope filter with a per-venue default popular-pairs list.
pub(crate) fn symbol_allowed(scope: &crate::adapter::TickerScope, defaults: &[&str], symbol: &str) -> bool {
    match scope.explicit_symbols() {
        Some(symbols) => symbols.iter().any(|candidate| candidate == symbol),
        None => defaults.contains(&symbol),
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

    /// Test transport that records every request and replays a fixed response.
    pub(crate) struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        pub(crate) fn respond_json(body: impl Into<String>) -> Self {
            Self {
                response: Ok(HttpResponse::ok_json(body)),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn lenient_parse_maps_empty_price_to_zero() {
        assert_eq!(parse_decimal_or_zero(""), Decimal::ZERO);
        assert_eq!(parse_decimal_or_zero("1.25"), dec!(1.25));
    }

    #[test]
    fn strict_parse_reports_the_offending_field() {
        let err = parse_decimal(VenueId::Okx, "last", "n/a").expect_err("must fail");
        assert!(err.message().contains("last"));
    }

    #[test]
    fn epoch_millis_parse_round_trips() {
        let ts = parse_epoch_millis(VenueId::Bybit, "createTime", "1700000000123").expect("valid");
        assert_eq!(ts.unix_millis(), 1_700_000_000_123);
    }
}
