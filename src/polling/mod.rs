//! Polling a remote simulation job until it produces a final result.
//!
//! A [`PollSession`] walks `NotStarted → AwaitingStart → Polling` and ends in
//! exactly one of `Finished`, `Failed` or `Cancelled`. Each poll asks for the
//! result first; only while the job is still pending does it ask for status,
//! and a failed status call never ends the session.
//!
//! [`SessionSlot`] keeps at most one live session: beginning a new one
//! cancels whatever was running before.

mod backoff;
mod sink;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::JobClient;
use crate::error::{Error, Result};
use crate::models::{JobResult, JobStatus, StartAck, StartParams};
use crate::state::{Phase, PollState};

pub use backoff::Backoff;
pub use sink::{LogSink, ReportSink};

use backoff::Delays;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Progress line used when the status endpoint cannot be reached.
pub const RUNNING_MESSAGE: &str = "simulation running...";

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollPolicy {
    pub interval_ms: u64,
    /// Give up after this many result requests. Unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_attempts: None,
            backoff: Backoff::Fixed,
        }
    }
}

impl PollPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::InvalidPollInterval(self.interval_ms));
        }
        if let Backoff::Exponential { factor, .. } = self.backoff {
            if !(factor >= 1.0) {
                return Err(Error::InvalidBackoffFactor(factor));
            }
        }
        Ok(())
    }

    fn delays(&self) -> Delays {
        Delays::new(Duration::from_millis(self.interval_ms), self.backoff.clone())
    }
}

pub fn progress_message(status: &JobStatus) -> String {
    let mut message = format!(
        "simulation running (queue: {}, events: {})",
        status.queue_size, status.event_count
    );
    if status.paused {
        message.push_str(" [paused]");
    }
    message
}

pub struct PollSession {
    id: u64,
    client: Arc<dyn JobClient>,
    policy: PollPolicy,
    state: PollState,
    cancel: CancellationToken,
}

impl PollSession {
    pub fn new(client: Arc<dyn JobClient>, policy: PollPolicy) -> Self {
        Self::with_id(0, client, policy)
    }

    fn with_id(id: u64, client: Arc<dyn JobClient>, policy: PollPolicy) -> Self {
        Self {
            id,
            client,
            policy,
            state: PollState::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn into_state(self) -> PollState {
        self.state
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Requests a job start and moves to `Polling` once the service
    /// acknowledges it.
    ///
    /// Invalid parameters are returned as an error before anything is sent
    /// and leave the session untouched. A rejected start or a transport
    /// failure fails the session and is reported to the sink.
    pub async fn start(&mut self, params: &StartParams, sink: &mut dyn ReportSink) -> Result<Phase> {
        params.validate()?;
        if self.state.phase != Phase::NotStarted {
            return Ok(self.state.phase);
        }
        self.state.phase = Phase::AwaitingStart;
        info!(
            session = self.id,
            service_defaults = params.is_empty(),
            "starting simulation job"
        );

        let cancel = self.cancel.clone();
        let client = Arc::clone(&self.client);
        let ack = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.cancelled()),
            ack = client.start(params) => ack,
        };

        match ack {
            Ok(StartAck::Started { run_id }) => {
                info!(session = self.id, run_id = ?run_id, "simulation started");
                self.state.run_id = run_id;
                self.state.phase = Phase::Polling;
            }
            Ok(StartAck::AlreadyRunning) => {
                info!(session = self.id, "simulation already running, observing it");
                self.state.phase = Phase::Polling;
            }
            Ok(StartAck::Rejected(reason)) => {
                return Ok(self.fail(sink, format!("start rejected: {}", reason)));
            }
            Err(err) => {
                return Ok(self.fail(sink, format!("start request failed: {}", err)));
            }
        }
        Ok(self.state.phase)
    }

    pub async fn start_and_wait(
        &mut self,
        params: &StartParams,
        sink: &mut dyn ReportSink,
    ) -> Result<Phase> {
        let phase = self.start(params, sink).await?;
        if phase.is_terminal() {
            return Ok(phase);
        }
        Ok(self.wait(sink).await)
    }

    /// Polls until the job finishes, fails, or the session is cancelled.
    ///
    /// A session that was never started attaches to whatever job the
    /// service is currently running. Terminal sessions return immediately.
    pub async fn wait(&mut self, sink: &mut dyn ReportSink) -> Phase {
        match self.state.phase {
            Phase::NotStarted | Phase::AwaitingStart => self.state.phase = Phase::Polling,
            Phase::Polling => {}
            terminal => return terminal,
        }

        let cancel = self.cancel.clone();
        let client = Arc::clone(&self.client);
        let mut delays = self.policy.delays();

        loop {
            if let Some(max_attempts) = self.policy.max_attempts {
                if self.state.attempts >= max_attempts {
                    let message = format!("no result after {} polls", self.state.attempts);
                    return self.fail(sink, message);
                }
            }
            self.state.attempts += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(),
                result = client.result() => result,
            };
            match result {
                Ok(JobResult::Pending) => {}
                Ok(JobResult::Ready(payload)) => {
                    info!(
                        session = self.id,
                        attempts = self.state.attempts,
                        history = payload.history.len(),
                        "simulation finished"
                    );
                    sink.finished(&payload);
                    self.state.result = Some(payload);
                    self.state.phase = Phase::Finished;
                    return Phase::Finished;
                }
                Ok(JobResult::Error(message)) => return self.fail(sink, message),
                Err(err) => {
                    return self.fail(sink, format!("failed to fetch result: {}", err));
                }
            }

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(),
                status = client.status() => status,
            };
            match status {
                Ok(status) => {
                    sink.progress(&progress_message(&status));
                    self.state.last_status = Some(status);
                }
                Err(err) => {
                    debug!(session = self.id, error = %err, "status unavailable, still polling");
                    sink.progress(RUNNING_MESSAGE);
                }
            }

            let delay = delays.next_delay();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(),
                _ = sleep(delay) => {}
            }
        }
    }

    fn fail(&mut self, sink: &mut dyn ReportSink, message: String) -> Phase {
        warn!(session = self.id, %message, "simulation polling failed");
        sink.failed(&message);
        self.state.error = Some(message);
        self.state.phase = Phase::Failed;
        Phase::Failed
    }

    fn cancelled(&mut self) -> Phase {
        info!(session = self.id, "polling session cancelled");
        self.state.phase = Phase::Cancelled;
        Phase::Cancelled
    }
}

/// Owner of the single active polling session.
pub struct SessionSlot {
    client: Arc<dyn JobClient>,
    policy: PollPolicy,
    current: Option<CancellationToken>,
    next_id: u64,
}

impl SessionSlot {
    pub fn new(client: Arc<dyn JobClient>, policy: PollPolicy) -> Self {
        Self {
            client,
            policy,
            current: None,
            next_id: 1,
        }
    }

    /// Creates a fresh session, cancelling the previous one if any.
    pub fn begin(&mut self) -> PollSession {
        self.cancel_current();
        let session = PollSession::with_id(self.next_id, Arc::clone(&self.client), self.policy.clone());
        self.next_id += 1;
        self.current = Some(session.cancel_token());
        session
    }

    pub fn cancel_current(&mut self) {
        if let Some(previous) = self.current.take() {
            if !previous.is_cancelled() {
                debug!("superseding previous polling session");
                previous.cancel();
            }
        }
    }
}
