//! Conversion request/result types and the rate client abstraction

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt::Display;

/// A single amount + currency pair to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub amount: Decimal,
    pub source: String,
    pub target: String,
}

impl ConversionRequest {
    pub fn new(amount: Decimal, source: &str, target: &str) -> Self {
        Self {
            amount,
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

impl Display for ConversionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} -> {}", self.amount, self.source, self.target)
    }
}

/// Outcome of a fulfilled conversion. Always tagged with the request that
/// produced it, never with the current input values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub amount: Decimal,
    pub source: String,
    pub target: String,
    pub converted: Decimal,
    pub date: Option<NaiveDate>,
}

impl ConversionResult {
    pub fn new(request: &ConversionRequest, converted: Decimal) -> Self {
        Self {
            amount: request.amount,
            source: request.source.clone(),
            target: request.target.clone(),
            converted,
            date: None,
        }
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn request(&self) -> ConversionRequest {
        ConversionRequest {
            amount: self.amount,
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }
}

/// Classified conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("Problem getting currency conversion: {0}")]
    Network(String),
    #[error("Unexpected conversion response: {0}")]
    BadResponse(String),
    #[error("No conversion rate available for {0}")]
    MissingRateForTarget(String),
}

impl ConversionError {
    /// Transport failures may succeed on a later attempt; the others will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConversionError::Network(_))
    }
}

#[async_trait]
pub trait ConversionClient: Send + Sync {
    async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConversionError>;
}
