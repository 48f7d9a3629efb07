//! Text rendering of the published conversion state.

use super::ui::{self, StyleType};
use crate::core::ConversionState;

pub const DEFAULT_TITLE: &str = "Currency Converter";
pub const RETRY_HINT: &str = "Change any input to try again.";

/// One-line, unstyled description of the state.
pub fn status_line(state: &ConversionState) -> String {
    match state {
        ConversionState::Idle => "Currencies or value not selected.".to_string(),
        ConversionState::SameCurrencyBlocked => "Cannot convert the same currency.".to_string(),
        ConversionState::AwaitingDebounce { .. } | ConversionState::InFlight { .. } => {
            "Getting rates...".to_string()
        }
        ConversionState::Succeeded(result) => format!(
            "You will receive {} {} from {} {}.",
            result.converted, result.target, result.amount, result.source
        ),
        ConversionState::Failed { error, .. } => error.to_string(),
    }
}

/// Window title for the state.
pub fn title(state: &ConversionState) -> String {
    match state {
        ConversionState::Succeeded(result) => format!(
            "{} {} is {} {}.",
            result.amount, result.source, result.converted, result.target
        ),
        ConversionState::SameCurrencyBlocked => "Cannot convert same currency.".to_string(),
        _ => DEFAULT_TITLE.to_string(),
    }
}

/// Styled status for terminal output.
pub fn styled_status(state: &ConversionState) -> String {
    let line = status_line(state);
    match state {
        ConversionState::Succeeded(result) => {
            let mut out = format!(
                "Converting from {} into {}.\n{}",
                ui::style_text(&result.source, StyleType::Highlight),
                ui::style_text(&result.target, StyleType::Highlight),
                ui::style_text(&line, StyleType::Value),
            );
            if let Some(date) = result.date {
                out.push_str(&ui::style_text(
                    &format!("\nRates as of {date}."),
                    StyleType::Subtle,
                ));
            }
            out
        }
        ConversionState::Failed { error, .. } if error.is_transient() => format!(
            "{}\n{}",
            ui::style_text(&line, StyleType::Error),
            ui::style_text(RETRY_HINT, StyleType::Subtle),
        ),
        ConversionState::Failed { .. } | ConversionState::SameCurrencyBlocked => {
            ui::style_text(&line, StyleType::Error)
        }
        _ => ui::style_text(&line, StyleType::Subtle),
    }
}
