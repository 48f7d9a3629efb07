use crate::core::conversion::{
    ConversionClient, ConversionError, ConversionRequest, ConversionResult,
};
use crate::core::currency::{CatalogLoadError, CatalogProvider, CurrencyCatalog};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Serves both the currency list and conversions
pub struct FrankfurterProvider {
    base_url: String,
    client: reqwest::Client,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent("fxconv/0.1");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_text(&self, url: Url) -> Result<String, String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| format!("Request error: {e} URL: {url}"))?;

        debug!(status = %response.status(), "Received Frankfurter response");
        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {e}"))
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    rates: HashMap<String, Decimal>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[async_trait]
impl ConversionClient for FrankfurterProvider {
    #[instrument(name = "FrankfurterConvert", skip(self), fields(request = %request))]
    async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        let amount = request.amount.normalize().to_string();
        let url = Url::parse_with_params(
            &format!("{}/latest", self.base_url),
            &[
                ("amount", amount.as_str()),
                ("from", request.source.as_str()),
                ("to", request.target.as_str()),
            ],
        )
        .map_err(|e| ConversionError::Network(format!("Invalid URL: {e}")))?;
        debug!("Requesting conversion from {}", url);

        let text = self.get_text(url).await.map_err(ConversionError::Network)?;

        let data: LatestResponse = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) => {
                error!(error = ?e, response = %text, "Failed to parse conversion response");
                return Err(ConversionError::BadResponse(format!(
                    "Failed to parse JSON response for {}: {}",
                    request, e
                )));
            }
        };

        let converted = data
            .rates
            .get(&request.target)
            .copied()
            .ok_or_else(|| ConversionError::MissingRateForTarget(request.target.clone()))?;

        Ok(ConversionResult::new(request, converted).with_date(data.date))
    }
}

#[async_trait]
impl CatalogProvider for FrankfurterProvider {
    #[instrument(name = "FrankfurterCurrencies", skip(self))]
    async fn fetch_currencies(&self) -> Result<CurrencyCatalog, CatalogLoadError> {
        let url = Url::parse(&format!("{}/currencies", self.base_url))
            .map_err(|e| CatalogLoadError::Network(format!("Invalid URL: {e}")))?;
        debug!("Requesting currency list from {}", url);

        let text = self.get_text(url).await.map_err(CatalogLoadError::Network)?;

        let data: Map<String, Value> = serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse currency list");
            CatalogLoadError::BadResponse(format!("Failed to parse JSON response: {e}"))
        })?;

        let catalog = data
            .into_iter()
            .map(|(code, name)| match name {
                Value::String(name) => Ok((code, name)),
                other => Err(CatalogLoadError::BadResponse(format!(
                    "Currency name for {code} is not a string: {other}"
                ))),
            })
            .collect::<Result<CurrencyCatalog, _>>()?;

        if catalog.is_empty() {
            return Err(CatalogLoadError::Empty);
        }
        Ok(catalog)
    }
}
