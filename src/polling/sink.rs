use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use crate::events::PollEvent;
use crate::models::ResultPayload;

/// Receives what a polling session has to say.
///
/// `finished` and `failed` are called at most once per session, and never
/// both.
pub trait ReportSink: Send {
    fn progress(&mut self, message: &str);
    fn finished(&mut self, payload: &ResultPayload);
    fn failed(&mut self, message: &str);
}

impl ReportSink for UnboundedSender<PollEvent> {
    fn progress(&mut self, message: &str) {
        forward(self, PollEvent::Progress(message.to_string()));
    }

    fn finished(&mut self, payload: &ResultPayload) {
        forward(self, PollEvent::Finished(payload.clone()));
    }

    fn failed(&mut self, message: &str) {
        forward(self, PollEvent::Failed(message.to_string()));
    }
}

/// Writes progress and outcomes to the log.
#[derive(Debug, Default)]
pub struct LogSink {
    last_progress: Option<String>,
}

impl ReportSink for LogSink {
    fn progress(&mut self, message: &str) {
        // Identical consecutive lines are noise at the default interval.
        if self.last_progress.as_deref() == Some(message) {
            debug!(progress = message);
            return;
        }
        info!("{}", message);
        self.last_progress = Some(message.to_string());
    }

    fn finished(&mut self, payload: &ResultPayload) {
        info!(history = payload.history.len(), "simulation result received");
    }

    fn failed(&mut self, message: &str) {
        error!("{}", message);
    }
}

fn forward(sender: &UnboundedSender<PollEvent>, event: PollEvent) {
    if sender.send(event).is_err() {
        debug!("poll event receiver dropped");
    }
}
