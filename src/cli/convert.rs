use super::{render, ui};
use crate::core::coordinator::{self, ConversionState, spawn_session};
use crate::core::ConversionClient;
use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Feeds one triple through a fresh coordinator and waits for its outcome.
pub async fn convert_once(
    client: Arc<dyn ConversionClient>,
    debounce: Duration,
    amount: &str,
    from: &str,
    to: &str,
) -> Result<ConversionState> {
    let (mut input, mut state, handle) = spawn_session(client, debounce);
    input.set_amount(amount);
    input.set_source(from);
    input.set_target(to);

    let expected = coordinator::evaluate(input.snapshot());
    let outcome = if expected.is_pending() {
        let pb = ui::new_spinner("Getting rates...");
        let outcome = state
            .wait_for(|s| {
                matches!(
                    s,
                    ConversionState::Succeeded(_) | ConversionState::Failed { .. }
                )
            })
            .await
            .map(|s| (*s).clone())
            .context("Conversion stopped before completing");
        pb.finish_and_clear();
        outcome?
    } else {
        debug!(state = ?expected, "No conversion needed");
        expected
    };

    drop(input);
    handle.await.context("Coordinator task failed")?;
    Ok(outcome)
}

pub async fn run(
    client: Arc<dyn ConversionClient>,
    debounce: Duration,
    amount: &str,
    from: &str,
    to: &str,
) -> Result<()> {
    let outcome = convert_once(client, debounce, amount, from, to).await?;

    println!("{}", ui::style_text(&render::title(&outcome), ui::StyleType::Title));
    println!("{}", render::styled_status(&outcome));

    match outcome {
        ConversionState::Failed { request, error } => {
            Err(anyhow!(error).context(format!("Failed to convert {request}")))
        }
        _ => Ok(()),
    }
}
