use serde::Serialize;

use crate::models::{JobStatus, ResultPayload};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    NotStarted,
    AwaitingStart,
    Polling,
    Finished,
    Failed,
    Cancelled,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Finished | Phase::Failed | Phase::Cancelled)
    }
}

/// Everything one polling session has observed so far.
#[derive(Clone, Debug, Default)]
pub struct PollState {
    pub phase: Phase,
    pub run_id: Option<String>,
    pub last_status: Option<JobStatus>,
    pub result: Option<ResultPayload>,
    pub error: Option<String>,
    /// Result requests issued.
    pub attempts: u32,
}
