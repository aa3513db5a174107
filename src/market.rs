use anyhow::{anyhow, Context, Result};
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue},
    StatusCode,
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// One entry of the coin reference list.
#[derive(Debug, Clone, Deserialize)]
pub struct Coin {
    pub id: String,
    pub name: String,
}

/// Coin reference list in the order returned by the API.
///
/// Lookup by id is case-sensitive; ids are opaque API keys.
#[derive(Debug, Default)]
pub struct AssetCatalog(Vec<Coin>);

impl AssetCatalog {
    /// Display name for a coin id, if the id is known.
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|coin| coin.id == id)
            .map(|coin| coin.name.as_str())
    }

    /// Iterate over coins in API order.
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }
}

impl From<Vec<Coin>> for AssetCatalog {
    fn from(coins: Vec<Coin>) -> Self {
        Self(coins)
    }
}

/// Single `[timestamp in ms, price]` pair of a market chart.
#[derive(Debug, Clone, Deserialize)]
pub struct PricePoint(i64, Decimal);

impl PricePoint {
    pub fn new(timestamp_millis: i64, price: Decimal) -> Self {
        Self(timestamp_millis, price)
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0
    }

    pub fn price(&self) -> Decimal {
        self.1
    }
}

/// Market chart response body.
// Example response:
// {
//   "prices": [[1700000000000, 35000.5], [1700003600000, 35100.2]],
//   "market_caps": [...],
//   "total_volumes": [...]
// }
//
// See https://docs.coingecko.com/reference/coins-id-market-chart
#[derive(Debug, Deserialize)]
pub struct MarketChart {
    pub prices: Vec<PricePoint>,
}

/// CoinGecko Public API client.
pub struct MarketClient {
    client: Client,
}

impl MarketClient {
    /// Create new instance.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Request the full coin reference list.
    pub fn coin_list(&self) -> Result<AssetCatalog> {
        let url = format!("{BASE_URL}/coins/list");
        let coins: Vec<Coin> = self.get_json(&url)?;
        Ok(coins.into())
    }

    /// Request the list of supported quote currency codes.
    pub fn supported_currencies(&self) -> Result<Vec<String>> {
        let url = format!("{BASE_URL}/simple/supported_vs_currencies");
        self.get_json(&url)
    }

    /// Request the price series for a coin, quoted in `vs_currency`,
    /// covering the last `days` days. The API chooses the bucketing
    /// granularity on its own based on `days`.
    pub fn market_chart(&self, id: &str, vs_currency: &str, days: u32) -> Result<Vec<PricePoint>> {
        let url =
            format!("{BASE_URL}/coins/{id}/market_chart?vs_currency={vs_currency}&days={days}");
        let chart: MarketChart = self.get_json(&url)?;
        Ok(chart.prices)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let res = self.client.get(url).send()?;

        let status = res.status();
        let headers = res.headers().clone();
        let body = match res.text() {
            Ok(body) => body,
            Err(e) => return Err(e).context(request_context_no_body(url, status, &headers)),
        };

        if status.is_success() {
            serde_json::from_str(&body)
                .with_context(|| request_context(url, status, &headers, &body))
        } else {
            Err(anyhow!(request_context(url, status, &headers, &body)))
        }
    }
}

impl Default for MarketClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Format detailed information about response for error reporting.
fn request_context(
    url: &str,
    status: StatusCode,
    headers: &HeaderMap<HeaderValue>,
    body: &str,
) -> String {
    format!(
        "request to '{url}' failed.\n\
         Status: {}\n\
         Headers:\n{:#?}\n\
         Body:\n{}",
        status, headers, body,
    )
}

/// Format detailed information about response for error reporting in case no body is available.
fn request_context_no_body(
    url: &str,
    status: StatusCode,
    headers: &HeaderMap<HeaderValue>,
) -> String {
    format!(
        "request to '{url}' failed:\n\
         Status: {}\n\
         Headers:\n{:#?}",
        status, headers,
    )
}
