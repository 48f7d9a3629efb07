//! Supported-currency catalog and its loader

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub code: String,
    pub name: String,
}

/// Ordered (code, name) pairs in the provider's key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyCatalog {
    entries: Vec<Currency>,
}

impl CurrencyCatalog {
    pub fn new(entries: Vec<Currency>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Currency> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.find(code).map(|c| c.name.as_str())
    }

    /// Case-insensitive lookup returning the catalog's own spelling.
    pub fn find(&self, code: &str) -> Option<&Currency> {
        self.entries.iter().find(|c| c.code.eq_ignore_ascii_case(code))
    }
}

impl FromIterator<(String, String)> for CurrencyCatalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(code, name)| Currency { code, name })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("Problem getting currency list: {0}")]
    Network(String),
    #[error("Unexpected currency list response: {0}")]
    BadResponse(String),
    #[error("No available currencies to convert")]
    Empty,
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_currencies(&self) -> Result<CurrencyCatalog, CatalogLoadError>;
}

/// Fetches the catalog once and hands out shared read-only copies.
pub struct CatalogLoader {
    provider: Arc<dyn CatalogProvider>,
    catalog: OnceCell<Arc<CurrencyCatalog>>,
}

impl CatalogLoader {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            provider,
            catalog: OnceCell::new(),
        }
    }

    /// Returns the loaded catalog, fetching it on first use. A failed load
    /// leaves the loader empty so a later call can try again.
    pub async fn load(&self) -> Result<Arc<CurrencyCatalog>, CatalogLoadError> {
        self.catalog
            .get_or_try_init(|| async {
                debug!("Fetching currency catalog");
                let catalog = self.provider.fetch_currencies().await.inspect_err(|e| {
                    warn!(error = %e, "Currency catalog load failed");
                })?;
                if catalog.is_empty() {
                    return Err(CatalogLoadError::Empty);
                }
                debug!(count = catalog.len(), "Currency catalog loaded");
                Ok(Arc::new(catalog))
            })
            .await
            .cloned()
    }
}
