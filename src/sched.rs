//! Focus-aware refresh scheduling
//!
//! Level-triggered: the loop asks once per iteration whether a fetch
//! is due. A focused terminal refreshes often; an unattended one
//! backs off to spare the API. Manual refresh bypasses this entirely.

use crate::fetch::FetchState;
use std::time::{Duration, Instant};

/// Refresh cadence knobs
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    pub focused: Duration,
    pub unfocused: Duration,
    /// Backoff between retries before the first success
    pub initial_retry: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            focused: Duration::from_secs(30),
            unfocused: Duration::from_secs(600),
            initial_retry: Duration::from_secs(10),
        }
    }
}

/// Whether a fetch should happen now.
///
/// After a success the clock runs from `last_success` at the
/// focus-dependent interval. Before any success, a failed attempt is
/// retried on the fixed backoff; a never-attempted state is
/// immediately due.
pub fn refresh_due(state: &FetchState, focused: bool, now: Instant, policy: &RefreshPolicy) -> bool {
    if let Some(last_success) = state.last_success {
        let interval = if focused {
            policy.focused
        } else {
            policy.unfocused
        };
        return now.duration_since(last_success) >= interval;
    }
    match (&state.error, state.last_attempt) {
        (Some(_), Some(last_attempt)) => {
            now.duration_since(last_attempt) >= policy.initial_retry
        }
        (_, None) => true,
        _ => false,
    }
}
