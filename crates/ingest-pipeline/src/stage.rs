//! Linear stage machine for a single run.

use std::fmt::{self, Display, Formatter};

use ingest_core::PipelineStatus;

/// Stage a run is in. Runs only ever move forward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Created, nothing attempted yet.
    Idle,
    /// Exchanging credentials for a session.
    Authenticating,
    /// Listing the incoming container.
    Listing,
    /// Invocations are in flight.
    Dispatching,
    /// Folding invocation outcomes into a result.
    Aggregating,
    /// Finished with the given status.
    Done(PipelineStatus),
}

impl Stage {
    /// Stable lowercase label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::Listing => "listing",
            Self::Dispatching => "dispatching",
            Self::Aggregating => "aggregating",
            Self::Done(PipelineStatus::Success) => "done_success",
            Self::Done(PipelineStatus::Failure) => "done_failure",
        }
    }

    /// Whether the run has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done(_))
    }

    const fn ordinal(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Authenticating => 1,
            Self::Listing => 2,
            Self::Dispatching => 3,
            Self::Aggregating => 4,
            Self::Done(_) => 5,
        }
    }

    /// Whether moving from `self` to `next` keeps the run moving forward.
    ///
    /// Any non-terminal stage may jump straight to `Done`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.is_terminal() || next.ordinal() == self.ordinal() + 1
    }
}

impl Display for Stage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_allowed() {
        let path = [
            Stage::Idle,
            Stage::Authenticating,
            Stage::Listing,
            Stage::Dispatching,
            Stage::Aggregating,
            Stage::Done(PipelineStatus::Success),
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn skipping_and_rewinding_are_rejected() {
        assert!(!Stage::Idle.can_advance_to(Stage::Listing));
        assert!(!Stage::Dispatching.can_advance_to(Stage::Authenticating));
        assert!(!Stage::Done(PipelineStatus::Failure).can_advance_to(Stage::Idle));
        assert!(Stage::Authenticating.can_advance_to(Stage::Done(PipelineStatus::Failure)));
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(Stage::Dispatching.to_string(), "dispatching");
        assert_eq!(Stage::Done(PipelineStatus::Failure).as_str(), "done_failure");
        assert!(Stage::Done(PipelineStatus::Success).is_terminal());
        assert!(!Stage::Aggregating.is_terminal());
    }
}
