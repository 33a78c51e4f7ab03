//! Load status of an externally hosted resource.
//!
//! Every consumer of the [`LoadCoordinator`](crate::resources::coordinator::LoadCoordinator)
//! sees one of these values. `Ready` and `Error` are terminal: once a handle
//! reports one of them it never changes again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The loaded state of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    /// No load was requested (no identifier, or loading was prevented).
    #[default]
    Idle,
    /// A handle exists and has not reported completion yet.
    Loading,
    /// The handle reported success.
    Ready,
    /// The handle reported failure.
    Error,
}

impl LoadStatus {
    /// `true` for [`LoadStatus::Ready`] and [`LoadStatus::Error`].
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadStatus::Ready | LoadStatus::Error)
    }

    /// Lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStatus::Idle => "idle",
            LoadStatus::Loading => "loading",
            LoadStatus::Ready => "ready",
            LoadStatus::Error => "error",
        }
    }

    /// Whether moving from `self` to `next` respects per-handle monotonicity.
    ///
    /// Allowed: staying put, leaving `Idle`, and `Loading -> terminal`.
    pub fn can_advance_to(self, next: LoadStatus) -> bool {
        match (self, next) {
            (a, b) if a == b => true,
            (LoadStatus::Idle, _) => true,
            (LoadStatus::Loading, n) => n.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported by the host when a handle finishes loading.
///
/// There is a single failure kind; the cause is not inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

impl LoadOutcome {
    /// Terminal status corresponding to this outcome.
    pub fn status(self) -> LoadStatus {
        match self {
            LoadOutcome::Loaded => LoadStatus::Ready,
            LoadOutcome::Failed => LoadStatus::Error,
        }
    }
}
