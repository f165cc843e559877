//! Per-venue request-authentication schemes.
//!
//! Every scheme is a pure function of `(secret, timestamp, method, path, body)`
//! producing the auth header map, so each one is unit-testable against pinned
//! digests with a fixed timestamp and no transport involved.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::http_client::HttpMethod;

type HmacSha256 = Hmac<Sha256>;

/// Interchangeable request-signing scheme.
///
/// `request_path` is the venue-relative path including any query string
/// (`/v5/order/history?category=spot&limit=20`). `body` is the raw JSON body
/// for POST requests and empty for GET.
pub trait SigningStrategy: Send + Sync {
    fn sign(
        &self,
        timestamp: &str,
        method: HttpMethod,
        request_path: &str,
        body: &str,
    ) -> BTreeMap<String, String>;
}

/// Canonical query string for POST bodies: the lexicographically-sorted
/// `key=value` join of the body's top-level JSON fields, not URL-encoded.
pub fn canonical_query(body: &str) -> String {
    let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(body)
    else {
        return String::new();
    };

    let sorted: BTreeMap<&String, &serde_json::Value> = fields.iter().collect();
    sorted
        .into_iter()
        .map(|(key, value)| {
            let rendered = match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            format!("{key}={rendered}")
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(secret: &str, payload: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("SHA-256 HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Scheme 1: hex-encoded HMAC-SHA256 over
/// `timestamp + api_key + recv_window + canonical_query`.
///
/// For GET requests the canonical query is the request's own query string; for
/// POST requests it is [`canonical_query`] over the JSON body.
#[derive(Debug, Clone)]
pub struct HmacHexSigner {
    api_key: String,
    secret: String,
    recv_window: String,
}

impl HmacHexSigner {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            recv_window: String::from("5000"),
        }
    }

    pub fn with_recv_window(mut self, recv_window: impl Into<String>) -> Self {
        self.recv_window = recv_window.into();
        self
    }

    fn digest(&self, timestamp: &str, canonical: &str) -> String {
        let payload = format!("{timestamp}{}{}{canonical}", self.api_key, self.recv_window);
        hex::encode(hmac_sha256(&self.secret, &payload))
    }
}

impl SigningStrategy for HmacHexSigner {
    fn sign(
        &self,
        timestamp: &str,
        method: HttpMethod,
        request_path: &str,
        body: &str,
    ) -> BTreeMap<String, String> {
        let canonical = match method {
            HttpMethod::Get => request_path
                .split_once('?')
                .map(|(_, query)| query.to_owned())
                .unwrap_or_default(),
            HttpMethod::Post => canonical_query(body),
        };

        let mut headers = BTreeMap::new();
        headers.insert(String::from("X-BAPI-API-KEY"), self.api_key.clone());
        headers.insert(String::from("X-BAPI-SIGN"), self.digest(timestamp, &canonical));
        headers.insert(String::from("X-BAPI-SIGN-TYPE"), String::from("2"));
        headers.insert(String::from("X-BAPI-TIMESTAMP"), timestamp.to_owned());
        headers.insert(String::from("X-BAPI-RECV-WINDOW"), self.recv_window.clone());
        headers.insert(String::from("Content-Type"), String::from("application/json"));
        headers
    }
}

/// Scheme 2: base64-encoded HMAC-SHA256 over
/// `iso_timestamp + METHOD + request_path(+query) + body_or_empty`, with the
/// account passphrase sent as its own header.
#[derive(Debug, Clone)]
pub struct HmacBase64Signer {
    api_key: String,
    secret: String,
    passphrase: String,
}

impl HmacBase64Signer {
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            passphrase: passphrase.into(),
        }
    }

    fn digest(&self, timestamp: &str, method: HttpMethod, request_path: &str, body: &str) -> String {
        let payload = format!("{timestamp}{}{request_path}{body}", method.as_str());
        BASE64_STANDARD.encode(hmac_sha256(&self.secret, &payload))
    }
}

impl SigningStrategy for HmacBase64Signer {
    fn sign(
        &self,
        timestamp: &str,
        method: HttpMethod,
        request_path: &str,
        body: &str,
    ) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(String::from("OK-ACCESS-KEY"), self.api_key.clone());
        headers.insert(
            String::from("OK-ACCESS-SIGN"),
            self.digest(timestamp, method, request_path, body),
        );
        headers.insert(String::from("OK-ACCESS-TIMESTAMP"), timestamp.to_owned());
        headers.insert(String::from("OK-ACCESS-PASSPHRASE"), self.passphrase.clone());
        headers.insert(String::from("Content-Type"), String::from("application/json"));
        headers
    }
}

/// Scheme 3: no per-request signature; fixed header pairs sent verbatim.
#[derive(Debug, Clone, Default)]
pub struct StaticKeySigner {
    headers: Vec<(String, String)>,
}

impl StaticKeySigner {
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self { headers }
    }

    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            headers: vec![(name.into(), value.into())],
        }
    }
}

impl SigningStrategy for StaticKeySigner {
    fn sign(
        &self,
        _timestamp: &str,
        _method: HttpMethod,
        _request_path: &str,
        _body: &str,
    ) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_query_sorts_fields_lexicographically() {
        let body = r#"{"symbol":"BTCUSDT","category":"spot","qty":"0.1","side":"Buy"}"#;
        assert_eq!(
            canonical_query(body),
            "category=spot&qty=0.1&side=Buy&symbol=BTCUSDT"
        );
    }

    #[test]
    fn canonical_query_renders_numbers_without_quotes() {
        let body = r#"{"qty":1,"side":"Buy"}"#;
        assert_eq!(canonical_query(body), "qty=1&side=Buy");
    }

    #[test]
    fn hex_scheme_produces_pinned_digest() {
        let signer = HmacHexSigner::new("k", "s");
        let headers = signer.sign("1000", HttpMethod::Post, "/v5/order/create", r#"{"qty":1,"side":"Buy"}"#);

        assert_eq!(
            headers.get("X-BAPI-SIGN").map(String::as_str),
            Some("4e36f8533be1915023f943ed06509da2b7f8415535c46adf6b0a9fc0dced7e00")
        );
        assert_eq!(headers.get("X-BAPI-TIMESTAMP").map(String::as_str), Some("1000"));
        assert_eq!(headers.get("X-BAPI-RECV-WINDOW").map(String::as_str), Some("5000"));
    }

    #[test]
    fn hex_scheme_signs_the_query_string_on_get() {
        let signer = HmacHexSigner::new("k", "s");
        let from_query = signer.sign("1000", HttpMethod::Get, "/v5/order/history?qty=1&side=Buy", "");
        let from_body = signer.sign("1000", HttpMethod::Post, "/v5/order/create", r#"{"qty":1,"side":"Buy"}"#);

        assert_eq!(from_query.get("X-BAPI-SIGN"), from_body.get("X-BAPI-SIGN"));
    }

    #[test]
    fn base64_scheme_produces_pinned_digests() {
        let signer = HmacBase64Signer::new("key", "secret", "phrase");

        let post = signer.sign(
            "2024-01-01T00:00:00.000Z",
            HttpMethod::Post,
            "/api/v5/trade/order",
            r#"{"instId":"BTC-USDT","sz":"1"}"#,
        );
        assert_eq!(
            post.get("OK-ACCESS-SIGN").map(String::as_str),
            Some("H517kgncNmSGHXZgKJpLkuPNU4aJQX2GqiEtiLFUGr8=")
        );

        let get = signer.sign(
            "2024-01-01T00:00:00.000Z",
            HttpMethod::Get,
            "/api/v5/account/balance",
            "",
        );
        assert_eq!(
            get.get("OK-ACCESS-SIGN").map(String::as_str),
            Some("dfI+ViVVBgfRPWcGyH3gM3bM/DTyiqUqZys/Y9UbsFQ=")
        );
        assert_eq!(get.get("OK-ACCESS-PASSPHRASE").map(String::as_str), Some("phrase"));
    }

    #[test]
    fn static_scheme_returns_fixed_headers_verbatim() {
        let signer = StaticKeySigner::new(vec![
            (String::from("APCA-API-KEY-ID"), String::from("key-id")),
            (String::from("APCA-API-SECRET-KEY"), String::from("secret")),
        ]);

        let headers = signer.sign("ignored", HttpMethod::Get, "/v2/account", "");
        assert_eq!(headers.get("APCA-API-KEY-ID").map(String::as_str), Some("key-id"));
        assert_eq!(headers.get("APCA-API-SECRET-KEY").map(String::as_str), Some("secret"));
    }
}
