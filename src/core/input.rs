//! Last-write-wins holder for the three conversion inputs

use rust_decimal::Decimal;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::debug;

/// Full set of current input values, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub amount: Decimal,
    pub source: Option<String>,
    pub target: Option<String>,
}

pub struct InputState {
    current: InputSnapshot,
    notify: mpsc::UnboundedSender<InputSnapshot>,
}

impl InputState {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<InputSnapshot>) {
        let (notify, changes) = mpsc::unbounded_channel();
        let state = Self {
            current: InputSnapshot::default(),
            notify,
        };
        (state, changes)
    }

    pub fn snapshot(&self) -> &InputSnapshot {
        &self.current
    }

    /// Stores raw user text as the amount. Empty, unparseable or negative
    /// input becomes zero.
    pub fn set_amount(&mut self, raw: &str) {
        self.set_amount_value(coerce_amount(raw));
    }

    pub fn set_amount_value(&mut self, amount: Decimal) {
        self.current.amount = amount.max(Decimal::ZERO);
        self.publish();
    }

    pub fn set_source(&mut self, code: &str) {
        self.current.source = coerce_code(code);
        self.publish();
    }

    pub fn set_target(&mut self, code: &str) {
        self.current.target = coerce_code(code);
        self.publish();
    }

    fn publish(&self) {
        if self.notify.send(self.current.clone()).is_err() {
            debug!("Input change dropped, no coordinator listening");
        }
    }
}

fn coerce_amount(raw: &str) -> Decimal {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}

/// Codes are stored upper-case, the spelling rate providers key on.
fn coerce_code(code: &str) -> Option<String> {
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_ascii_uppercase())
}
