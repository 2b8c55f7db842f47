use crate::models::ResultPayload;

/// Notifications a polling session hands to its reporting sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollEvent {
    Progress(String),
    Finished(ResultPayload),
    Failed(String),
}

impl PollEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollEvent::Progress(_))
    }
}
