//! Currency conversion adapter and amount parsing.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ConversionError;
use crate::http_client::HttpClient;

/// Converts an amount between two ISO 4217 currencies.
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, ConversionError>;
}

/// Parse a display amount such as `1 000,50`, `1.000,50` or `1,000.50`.
///
/// Everything but digits and separators is dropped. When both `,` and `.`
/// occur, the later one is the decimal separator; a lone `,` is decimal.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalised = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if dot < comma => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    normalised.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A three-letter ISO 4217 code, upper-cased.
pub fn normalise_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        None
    }
}

/// Round to cents for export.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Rate lookup against an exchangerate-api style `/v4/latest/{base}` endpoint.
pub struct ExchangeRateApi {
    http: HttpClient,
    base_url: String,
}

impl ExchangeRateApi {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Current rate from `from` to `to`.
    pub async fn rate(&self, from: &str, to: &str) -> Result<f64, ConversionError> {
        let url = format!("{}/v4/latest/{from}", self.base_url);
        let resp = self.http.get(&url, &[]).await?;

        match resp.status {
            404 => return Err(ConversionError::UnsupportedCurrency(from.to_string())),
            s if !resp.is_success() => return Err(ConversionError::Service(s)),
            _ => {}
        }

        let latest: LatestRates = resp
            .json()
            .map_err(|e| ConversionError::Decode(e.to_string()))?;
        latest
            .rates
            .get(to)
            .copied()
            .ok_or_else(|| ConversionError::UnsupportedCurrency(to.to_string()))
    }
}

#[async_trait]
impl CurrencyConverter for ExchangeRateApi {
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, ConversionError> {
        if !amount.is_finite() {
            return Err(ConversionError::InvalidAmount(amount.to_string()));
        }
        let from = normalise_code(from)
            .ok_or_else(|| ConversionError::UnsupportedCurrency(from.to_string()))?;
        let to =
            normalise_code(to).ok_or_else(|| ConversionError::UnsupportedCurrency(to.to_string()))?;

        if from == to {
            return Ok(amount);
        }

        let rate = self.rate(&from, &to).await?;
        tracing::debug!(%from, %to, rate, "exchange rate");
        Ok(amount * rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> ExchangeRateApi {
        ExchangeRateApi::new(
            HttpClient::new(Duration::from_secs(5), "test-agent"),
            server.uri(),
        )
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("1 000,50"), Some(1000.5));
        assert_eq!(parse_amount("1.000.000,25 EUR"), Some(1_000_000.25));
        assert_eq!(parse_amount("1,000,000.25"), Some(1_000_000.25));
        assert_eq!(parse_amount("2500"), Some(2500.0));
        assert_eq!(parse_amount("€ 12.5"), Some(12.5));
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_normalise_code() {
        assert_eq!(normalise_code(" eur "), Some("EUR".to_string()));
        assert_eq!(normalise_code("EURO"), None);
        assert_eq!(normalise_code("E1R"), None);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(1234.5678), 1234.57);
        assert_eq!(round_cents(90.0), 90.0);
    }

    #[tokio::test]
    async fn test_convert_uses_rate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "base": "EUR",
                "rates": { "EUR": 1.0, "INR": 90.5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let converted = api(&server).convert(1000.0, "eur", "INR").await.unwrap();
        assert_eq!(converted, 90_500.0);
    }

    #[tokio::test]
    async fn test_same_currency_needs_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let converted = api(&server).convert(42.0, "INR", "INR").await.unwrap();
        assert_eq!(converted, 42.0);
    }

    #[tokio::test]
    async fn test_unknown_target_is_unsupported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/EUR"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "rates": { "USD": 1.1 } })),
            )
            .mount(&server)
            .await;

        let err = api(&server).convert(1.0, "EUR", "XYZ").await.unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedCurrency(c) if c == "XYZ"));
    }

    #[tokio::test]
    async fn test_unknown_base_is_unsupported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/ABC"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = api(&server).convert(1.0, "ABC", "INR").await.unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedCurrency(c) if c == "ABC"));
    }

    #[tokio::test]
    async fn test_malformed_code_never_reaches_service() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = api(&server).convert(1.0, "../x", "INR").await.unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedCurrency(_)));
    }

    #[tokio::test]
    async fn test_service_error_and_bad_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/GBP"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v4/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let converter = api(&server);
        let err = converter.convert(1.0, "GBP", "INR").await.unwrap_err();
        assert!(matches!(err, ConversionError::Service(502)));
        let err = converter.convert(1.0, "USD", "INR").await.unwrap_err();
        assert!(matches!(err, ConversionError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let converter = ExchangeRateApi::new(
            HttpClient::new(Duration::from_millis(500), "test-agent"),
            "http://127.0.0.1:9",
        );
        let err = converter.convert(1.0, "EUR", "INR").await.unwrap_err();
        assert!(matches!(err, ConversionError::Http(_)));
    }
}
