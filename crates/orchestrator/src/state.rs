use core_types::{Period, SnapshotPair};
use std::sync::Arc;

/// The dashboard's visible state. Exactly one variant holds at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    /// No cycle has been started yet.
    #[default]
    Idle,
    /// A cycle for `period` is in flight. Any previous snapshot is no longer shown.
    Loading { period: Period },
    /// The latest cycle succeeded.
    Ready(Arc<SnapshotPair>),
    /// The latest cycle failed. A retry is always possible.
    Failed { period: Period, reason: String },
}

impl FetchState {
    /// The period this state refers to, if any.
    pub fn period(&self) -> Option<Period> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading { period } | FetchState::Failed { period, .. } => Some(*period),
            FetchState::Ready(pair) => Some(pair.period),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading { .. })
    }

    /// True once a cycle has produced its result.
    pub fn is_settled(&self) -> bool {
        matches!(self, FetchState::Ready(_) | FetchState::Failed { .. })
    }

    pub fn snapshot(&self) -> Option<&Arc<SnapshotPair>> {
        match self {
            FetchState::Ready(pair) => Some(pair),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            FetchState::Idle => "idle",
            FetchState::Loading { .. } => "loading",
            FetchState::Ready(_) => "ready",
            FetchState::Failed { .. } => "failed",
        }
    }
}

/// A cycle that has been issued a generation but not fetched yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket {
    pub generation: u64,
    pub period: Period,
}

/// What happened to the result of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The cycle was still the latest one and its result is now the visible state.
    Applied(FetchState),
    /// A newer cycle started while this one was in flight; its result was discarded.
    Superseded { generation: u64, latest: u64 },
}

impl CycleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CycleOutcome::Applied(_))
    }

    /// The state this cycle published, if it was not superseded.
    pub fn state(&self) -> Option<&FetchState> {
        match self {
            CycleOutcome::Applied(state) => Some(state),
            CycleOutcome::Superseded { .. } => None,
        }
    }
}
