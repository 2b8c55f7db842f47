//! Access to a remote simulation job.

mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{JobResult, JobStatus, StartAck, StartParams};

pub use http::{Control, HttpJobClient};

/// The operations the polling controller needs from a simulation job.
///
/// An `Err` means the request itself failed (transport, HTTP status or
/// decoding). Job-level outcomes such as a rejected start or a failed run are
/// reported through the `Ok` values.
#[async_trait]
pub trait JobClient: Send + Sync {
    async fn start(&self, params: &StartParams) -> Result<StartAck>;

    async fn status(&self) -> Result<JobStatus>;

    async fn result(&self) -> Result<JobResult>;
}
