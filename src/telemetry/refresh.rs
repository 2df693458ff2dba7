use jiff::Timestamp;
use tracing::{Level, event};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Success,
    /// The refresh endpoint answered with a non-2xx status.
    Rejected,
    /// The refresh endpoint answered 2xx but without a usable credential.
    Malformed,
    /// The exchange never got an answer.
    Transport,
}

/// Structured events for one refresh cycle, correlated by `attempt_id`.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    context: String,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn emit_start(&self, at: Timestamp) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            timestamp = %at,
            "refresh.start"
        );
    }

    pub fn emit_success(&self, token_len: usize, at: Timestamp) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            timestamp = %at,
            outcome = ?RefreshOutcome::Success,
            token_len,
            "refresh.success"
        );
    }

    pub fn emit_failure(&self, outcome: RefreshOutcome, reason: &str, at: Timestamp) {
        event!(
            Level::ERROR,
            attempt_id = %self.attempt_id,
            context = %self.context,
            timestamp = %at,
            outcome = ?outcome,
            reason,
            "refresh.failure"
        );
    }
}
