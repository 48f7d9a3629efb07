pub mod cli;
pub mod core;
pub mod providers;

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{CatalogLoader, config::AppConfig};
use crate::providers::FrankfurterProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Currencies,
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    Interactive,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency converter starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = Arc::new(FrankfurterProvider::new(
        config.base_url(),
        config.request_timeout(),
    )?);
    let loader = CatalogLoader::new(provider.clone());

    match command {
        AppCommand::Currencies => cli::currencies::run(&loader).await,
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(provider, config.debounce(), &amount, &from, &to).await
        }
        AppCommand::Interactive => {
            cli::interactive::run(&loader, provider, config.debounce()).await
        }
    }
}
