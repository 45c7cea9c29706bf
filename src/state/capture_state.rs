/// Capture state definitions
///
/// Every crawl URL moves through `pending -> capturing -> {success, error}`.
/// Only the two terminal states ever reach a ledger.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a page capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    // ===== Active States =====
    /// Assigned to a worker, not yet started
    Pending,

    /// The worker is running the capture steps
    Capturing,

    // ===== Terminal States =====
    /// Every capture step completed and all artifacts were written
    Success,

    /// A step failed; the record carries the error
    Error,
}

impl CaptureState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if the move to `next` is a legal transition
    ///
    /// Terminal states never change again; a capture cannot skip straight
    /// from `pending` to `success`. A pending page may fail outright when its
    /// worker never gets a session.
    pub fn can_transition_to(&self, next: CaptureState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Capturing)
                | (Self::Pending, Self::Error)
                | (Self::Capturing, Self::Success)
                | (Self::Capturing, Self::Error)
        )
    }

    /// Moves to `next`, or reports the illegal transition
    pub fn transition(&mut self, next: CaptureState) -> Result<(), InvalidTransition> {
        if !self.can_transition_to(next) {
            return Err(InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Capturing => "capturing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempted move between two states that are not connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid capture state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: CaptureState,
    pub to: CaptureState,
}
