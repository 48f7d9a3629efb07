//! Conversion trigger coordinator.
//!
//! Turns the stream of input snapshots into at most one active conversion
//! attempt. Guards are evaluated on every change, valid triples are
//! debounced, and responses from superseded requests are discarded by
//! sequence number. The coordinator is the only writer of the published
//! [`ConversionState`].

use crate::core::conversion::{
    ConversionClient, ConversionError, ConversionRequest, ConversionResult,
};
use crate::core::input::{InputSnapshot, InputState};
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversionState {
    #[default]
    Idle,
    SameCurrencyBlocked,
    AwaitingDebounce {
        request: ConversionRequest,
    },
    InFlight {
        request: ConversionRequest,
        seq: u64,
    },
    Succeeded(ConversionResult),
    Failed {
        request: ConversionRequest,
        error: ConversionError,
    },
}

impl ConversionState {
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ConversionState::AwaitingDebounce { .. } | ConversionState::InFlight { .. }
        )
    }

    /// The request this state refers to, if any.
    pub fn request(&self) -> Option<ConversionRequest> {
        match self {
            ConversionState::Idle | ConversionState::SameCurrencyBlocked => None,
            ConversionState::AwaitingDebounce { request }
            | ConversionState::InFlight { request, .. }
            | ConversionState::Failed { request, .. } => Some(request.clone()),
            ConversionState::Succeeded(result) => Some(result.request()),
        }
    }
}

/// Applies the input guards in order: missing values, then same currency.
/// Returns `AwaitingDebounce` for a convertible triple.
pub fn evaluate(snapshot: &InputSnapshot) -> ConversionState {
    let (Some(source), Some(target)) = (&snapshot.source, &snapshot.target) else {
        return ConversionState::Idle;
    };
    if snapshot.amount.is_zero() {
        return ConversionState::Idle;
    }
    if source.eq_ignore_ascii_case(target) {
        return ConversionState::SameCurrencyBlocked;
    }
    ConversionState::AwaitingDebounce {
        request: ConversionRequest::new(snapshot.amount, source, target),
    }
}

type Outcome = (
    u64,
    ConversionRequest,
    Result<ConversionResult, ConversionError>,
);

/// The single debounce timer. Re-arming replaces the previous deadline.
#[derive(Default)]
struct DebounceTimer {
    sleep: Option<Pin<Box<Sleep>>>,
    request: Option<ConversionRequest>,
}

impl DebounceTimer {
    fn arm(&mut self, window: Duration, request: ConversionRequest) {
        let deadline = Instant::now() + window;
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().reset(deadline),
            None => self.sleep = Some(Box::pin(tokio::time::sleep_until(deadline))),
        }
        self.request = Some(request);
    }

    fn cancel(&mut self) {
        self.sleep = None;
        self.request = None;
    }

    fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves with the armed request once the window passes.
    async fn elapsed(&mut self) -> Option<ConversionRequest> {
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().await,
            None => std::future::pending::<()>().await,
        }
        self.sleep = None;
        self.request.take()
    }
}

pub struct Coordinator {
    client: Arc<dyn ConversionClient>,
    debounce: Duration,
    inputs: mpsc::UnboundedReceiver<InputSnapshot>,
    state: watch::Sender<ConversionState>,
    last_input: Option<InputSnapshot>,
    last_seq: u64,
    awaiting: Option<u64>,
}

impl Coordinator {
    pub fn new(
        client: Arc<dyn ConversionClient>,
        debounce: Duration,
        inputs: mpsc::UnboundedReceiver<InputSnapshot>,
    ) -> (Self, watch::Receiver<ConversionState>) {
        let (state, published) = watch::channel(ConversionState::Idle);
        let coordinator = Self {
            client,
            debounce,
            inputs,
            state,
            last_input: None,
            last_seq: 0,
            awaiting: None,
        };
        (coordinator, published)
    }

    /// Processes events until the input side is dropped.
    pub async fn run(mut self) {
        let mut timer = DebounceTimer::default();
        let mut in_flight: FuturesUnordered<BoxFuture<'static, Outcome>> =
            FuturesUnordered::new();

        loop {
            tokio::select! {
                biased;

                snapshot = self.inputs.recv() => match snapshot {
                    Some(snapshot) => self.on_input(snapshot, &mut timer),
                    None => break,
                },
                Some((seq, request, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                    self.on_response(seq, request, outcome);
                }
                Some(request) = timer.elapsed(), if timer.is_armed() => {
                    in_flight.push(self.dispatch(request));
                }
            }
        }

        timer.cancel();
        if !in_flight.is_empty() {
            debug!(pending = in_flight.len(), "Dropping in-flight conversions");
        }
        debug!("Coordinator stopped");
    }

    fn on_input(&mut self, snapshot: InputSnapshot, timer: &mut DebounceTimer) {
        if self.last_input.as_ref() == Some(&snapshot) {
            debug!("Input unchanged, ignoring");
            return;
        }
        self.last_input = Some(snapshot.clone());
        self.awaiting = None;

        let next = evaluate(&snapshot);
        match &next {
            ConversionState::AwaitingDebounce { request } => {
                debug!(%request, "Arming debounce timer");
                timer.arm(self.debounce, request.clone());
            }
            _ => timer.cancel(),
        }
        self.publish(next);
    }

    #[instrument(name = "ConversionDispatch", skip_all, fields(request = %request))]
    fn dispatch(&mut self, request: ConversionRequest) -> BoxFuture<'static, Outcome> {
        self.last_seq += 1;
        let seq = self.last_seq;
        self.awaiting = Some(seq);
        debug!(seq, "Dispatching conversion request");
        self.publish(ConversionState::InFlight {
            request: request.clone(),
            seq,
        });

        let client = Arc::clone(&self.client);
        Box::pin(async move {
            let outcome = client.convert(&request).await;
            (seq, request, outcome)
        })
    }

    fn on_response(
        &mut self,
        seq: u64,
        request: ConversionRequest,
        outcome: Result<ConversionResult, ConversionError>,
    ) {
        if self.awaiting != Some(seq) {
            debug!(seq, latest = self.last_seq, "Discarding superseded response");
            return;
        }
        self.awaiting = None;

        let next = match outcome {
            Ok(result) => {
                info!(seq, converted = %result.converted, "Conversion succeeded");
                ConversionState::Succeeded(result)
            }
            Err(error) => {
                warn!(seq, %error, "Conversion failed");
                ConversionState::Failed { request, error }
            }
        };
        self.publish(next);
    }

    fn publish(&self, next: ConversionState) {
        self.state.send_replace(next);
    }
}

/// Starts a coordinator task and returns the input holder that feeds it and
/// a receiver for the published state.
pub fn spawn_session(
    client: Arc<dyn ConversionClient>,
    debounce: Duration,
) -> (InputState, watch::Receiver<ConversionState>, JoinHandle<()>) {
    let (input, changes) = InputState::new();
    let (coordinator, published) = Coordinator::new(client, debounce, changes);
    let handle = tokio::spawn(coordinator.run());
    (input, published, handle)
}
