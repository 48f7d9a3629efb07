//! Core conversion abstractions and the trigger coordinator

pub mod config;
pub mod conversion;
pub mod coordinator;
pub mod currency;
pub mod input;
pub mod log;

// Re-export main types for cleaner imports
pub use conversion::{ConversionClient, ConversionError, ConversionRequest, ConversionResult};
pub use coordinator::{ConversionState, Coordinator, spawn_session};
pub use currency::{CatalogLoadError, CatalogLoader, CatalogProvider, Currency, CurrencyCatalog};
pub use input::{InputSnapshot, InputState};
