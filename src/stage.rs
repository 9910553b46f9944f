//! Tagged stage results.

use crate::domain::Provenance;
use crate::error::FailureKind;

/// What a stage produced and which path produced it.
#[derive(Clone, Debug)]
pub enum StageOutcome<T> {
  Remote(T),
  Fallback { value: T, reason: FailureKind },
}

impl<T> StageOutcome<T> {
  pub fn provenance(&self) -> Provenance {
    match self {
      StageOutcome::Remote(_) => Provenance::Remote,
      StageOutcome::Fallback { .. } => Provenance::Heuristic,
    }
  }

  pub fn reason(&self) -> Option<FailureKind> {
    match self {
      StageOutcome::Remote(_) => None,
      StageOutcome::Fallback { reason, .. } => Some(*reason),
    }
  }

  pub fn into_value(self) -> T {
    match self {
      StageOutcome::Remote(v) => v,
      StageOutcome::Fallback { value, .. } => value,
    }
  }
}
