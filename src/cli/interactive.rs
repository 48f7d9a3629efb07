use super::{render, ui};
use crate::core::{
    CatalogLoader, ConversionClient, ConversionState, CurrencyCatalog, InputState, spawn_session,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::debug;

const HELP: &str = "\
Commands:
  amount <value>   set the amount to convert
  from <code>      set the currency to convert from
  to <code>        set the currency to convert into
  list             show available currencies
  help             show this message
  quit             leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Amount(String),
    From(String),
    To(String),
    List,
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, arg) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, a)| (w, a.trim()));

        let command = match word.to_lowercase().as_str() {
            "amount" | "a" => SessionCommand::Amount(arg.to_string()),
            "from" | "f" => SessionCommand::From(arg.to_string()),
            "to" | "t" => SessionCommand::To(arg.to_string()),
            "list" | "ls" => SessionCommand::List,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" | "q" => SessionCommand::Quit,
            other => return Err(format!("Unknown command: {other}")),
        };
        Ok(Some(command))
    }
}

enum Side {
    Source,
    Target,
}

/// Validates a currency choice against the catalog, loading it if needed.
/// Selection stays blocked until the catalog is available.
async fn select_currency(
    loader: &CatalogLoader,
    input: &mut InputState,
    side: Side,
    code: &str,
) -> Result<(), String> {
    let code = if code.is_empty() {
        String::new()
    } else {
        let catalog = loader.load().await.map_err(|e| e.to_string())?;
        canonical_code(&catalog, code)?
    };
    match side {
        Side::Source => input.set_source(&code),
        Side::Target => input.set_target(&code),
    }
    Ok(())
}

fn canonical_code(catalog: &CurrencyCatalog, code: &str) -> Result<String, String> {
    catalog
        .find(code)
        .map(|c| c.code.clone())
        .ok_or_else(|| format!("Unknown currency: {code}"))
}

async fn render_changes(mut state: watch::Receiver<ConversionState>) {
    let mut title = render::DEFAULT_TITLE.to_string();
    while state.changed().await.is_ok() {
        let current = state.borrow_and_update().clone();
        let next_title = render::title(&current);
        if next_title != title {
            println!("{}", ui::style_text(&next_title, ui::StyleType::Title));
            title = next_title;
        }
        println!("{}", render::styled_status(&current));
    }
    debug!("State renderer stopped");
}

pub async fn run(
    loader: &CatalogLoader,
    client: Arc<dyn ConversionClient>,
    debounce: Duration,
) -> Result<()> {
    println!("{}", ui::style_text(render::DEFAULT_TITLE, ui::StyleType::Title));
    println!("{HELP}");

    let pb = ui::new_spinner("Loading...");
    let catalog = loader.load().await;
    pb.finish_and_clear();
    if let Err(e) = catalog {
        println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
    }

    let (mut input, state, coordinator) = spawn_session(client, debounce);
    let renderer = tokio::spawn(render_changes(state));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        let command = match SessionCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", ui::style_text(&e, ui::StyleType::Error));
                continue;
            }
        };

        let outcome = match command {
            SessionCommand::Amount(raw) => {
                input.set_amount(&raw);
                Ok(())
            }
            SessionCommand::From(code) => {
                select_currency(loader, &mut input, Side::Source, &code).await
            }
            SessionCommand::To(code) => {
                select_currency(loader, &mut input, Side::Target, &code).await
            }
            SessionCommand::List => match loader.load().await {
                Ok(catalog) => {
                    println!("{}", catalog.display_as_table());
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            },
            SessionCommand::Help => {
                println!("{HELP}");
                Ok(())
            }
            SessionCommand::Quit => break,
        };
        if let Err(e) = outcome {
            println!("{}", ui::style_text(&e, ui::StyleType::Error));
        }
    }

    drop(input);
    coordinator.await.context("Coordinator task failed")?;
    renderer.await.context("Renderer task failed")?;
    Ok(())
}
