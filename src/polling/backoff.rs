use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential { factor: f64, max_interval_ms: u64 },
}

/// Sleep durations between consecutive polls.
#[derive(Clone, Debug)]
pub(crate) struct Delays {
    next: Duration,
    backoff: Backoff,
}

impl Delays {
    pub(crate) fn new(interval: Duration, backoff: Backoff) -> Self {
        Self {
            next: interval,
            backoff,
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let current = self.next;
        if let Backoff::Exponential {
            factor,
            max_interval_ms,
        } = self.backoff
        {
            let cap = Duration::from_millis(max_interval_ms).max(current);
            let grown = (current.as_millis() as f64 * factor.max(1.0)).round();
            self.next = Duration::from_millis(grown as u64).min(cap);
        }
        current
    }
}
