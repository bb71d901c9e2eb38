//! Purchase attempt state machine.

use serde::{Deserialize, Serialize};

/// The state of a single purchase attempt.
///
/// State transitions:
/// ```text
/// Validating ──► CheckingAvailability ──► Reserving ──► DecrementingStock ──┬──► Committed
///                                                                           └──► Compensating ──► Failed
/// ```
///
/// Each attempt is one pass through the machine; there is no retry loop, the
/// caller must re-submit to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PurchaseState {
    /// Checking the request fields before any remote call.
    #[default]
    Validating,

    /// Fetching the availability snapshot from the catalogue.
    CheckingAvailability,

    /// Persisting the pending payment record (the durable write).
    Reserving,

    /// Applying the remote stock decrement.
    DecrementingStock,

    /// Payment persisted and stock decremented (terminal state).
    Committed,

    /// The decrement failed; the pending record is being deleted.
    Compensating,

    /// Attempt failed after compensation (terminal state).
    Failed,
}

impl PurchaseState {
    /// Returns true once the durable payment write has happened.
    pub fn has_durable_write(&self) -> bool {
        matches!(
            self,
            PurchaseState::Reserving
                | PurchaseState::DecrementingStock
                | PurchaseState::Committed
                | PurchaseState::Compensating
                | PurchaseState::Failed
        )
    }

    /// Returns true if compensation can begin from this state.
    pub fn can_compensate(&self) -> bool {
        matches!(self, PurchaseState::DecrementingStock)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseState::Committed | PurchaseState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseState::Validating => "Validating",
            PurchaseState::CheckingAvailability => "CheckingAvailability",
            PurchaseState::Reserving => "Reserving",
            PurchaseState::DecrementingStock => "DecrementingStock",
            PurchaseState::Committed => "Committed",
            PurchaseState::Compensating => "Compensating",
            PurchaseState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PurchaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_validating() {
        assert_eq!(PurchaseState::default(), PurchaseState::Validating);
    }

    #[test]
    fn durable_write_boundary() {
        assert!(!PurchaseState::Validating.has_durable_write());
        assert!(!PurchaseState::CheckingAvailability.has_durable_write());
        assert!(PurchaseState::Reserving.has_durable_write());
        assert!(PurchaseState::DecrementingStock.has_durable_write());
        assert!(PurchaseState::Failed.has_durable_write());
    }

    #[test]
    fn only_decrementing_can_compensate() {
        assert!(PurchaseState::DecrementingStock.can_compensate());
        assert!(!PurchaseState::Validating.can_compensate());
        assert!(!PurchaseState::Committed.can_compensate());
        assert!(!PurchaseState::Compensating.can_compensate());
    }

    #[test]
    fn terminal_states() {
        assert!(PurchaseState::Committed.is_terminal());
        assert!(PurchaseState::Failed.is_terminal());
        assert!(!PurchaseState::Compensating.is_terminal());
        assert!(!PurchaseState::Reserving.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(
            PurchaseState::CheckingAvailability.to_string(),
            "CheckingAvailability"
        );
        assert_eq!(PurchaseState::Committed.to_string(), "Committed");
    }
}
