//! Save state machine
//!
//! ```text
//! Reconciling ─┬─> Creating ───┬─> Persisting ──> Committed
//!              └─> Validating ─┘
//! any non-terminal state ──> RolledBack
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// States of one save request, once its checkpoint is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveState {
    /// Matching the candidate against its lineage
    Reconciling,
    /// Taking the create path
    Creating,
    /// Checking an update against the stored descriptor
    Validating,
    /// Written; verifying the persisted descriptor
    Persisting,
    /// Checkpoint closed
    Committed,
    /// Checkpoint rolled back
    RolledBack,
}

impl SaveState {
    /// Every state
    pub const ALL: [SaveState; 6] = [
        Self::Reconciling,
        Self::Creating,
        Self::Validating,
        Self::Persisting,
        Self::Committed,
        Self::RolledBack,
    ];

    /// Check if no transition leaves this state
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

impl Display for SaveState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Reconciling => "reconciling",
            Self::Creating => "creating",
            Self::Validating => "validating",
            Self::Persisting => "persisting",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(label)
    }
}

/// Illegal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal save transition {from} -> {to}")]
pub struct TransitionError {
    /// Source state
    pub from: SaveState,
    /// Rejected target state
    pub to: SaveState,
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: SaveState) -> Vec<SaveState> {
    use SaveState::*;
    match from {
        Reconciling => vec![Creating, Validating, RolledBack],
        Creating | Validating => vec![Persisting, RolledBack],
        Persisting => vec![Committed, RolledBack],
        Committed | RolledBack => vec![],
    }
}

/// Validate a transition
///
/// # Errors
/// Returns [`TransitionError`] when `to` is not reachable from `from`.
pub fn validate_transition(from: SaveState, to: SaveState) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

/// Trace of the states one save went through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTrace {
    model: String,
    states: Vec<SaveState>,
}

impl SaveTrace {
    /// Start a trace in [`SaveState::Reconciling`]
    #[must_use]
    pub fn start(model: impl Into<String>) -> Self {
        let model = model.into();
        tracing::debug!(model = %model, state = %SaveState::Reconciling, "save started");
        Self {
            model,
            states: vec![SaveState::Reconciling],
        }
    }

    /// Current state
    #[must_use]
    pub fn current(&self) -> SaveState {
        self.states
            .last()
            .copied()
            .unwrap_or(SaveState::Reconciling)
    }

    /// Move to the next state
    ///
    /// # Errors
    /// Returns [`TransitionError`] on an illegal transition; the trace is
    /// left unchanged.
    pub fn advance(&mut self, to: SaveState) -> Result<(), TransitionError> {
        validate_transition(self.current(), to)?;
        tracing::debug!(model = %self.model, state = %to, "save state");
        self.states.push(to);
        Ok(())
    }

    /// End a failed save in [`SaveState::RolledBack`]
    ///
    /// Does nothing once the trace is terminal.
    pub fn roll_back(&mut self) {
        if !self.current().is_terminal() {
            tracing::debug!(model = %self.model, state = %SaveState::RolledBack, "save state");
            self.states.push(SaveState::RolledBack);
        }
    }

    /// States visited so far
    #[must_use]
    pub fn states(&self) -> &[SaveState] {
        &self.states
    }

    /// Consume into the visited states
    #[must_use]
    pub fn into_states(self) -> Vec<SaveState> {
        self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn create_path() {
        let mut trace = SaveTrace::start("sales");
        trace.advance(SaveState::Creating).unwrap();
        trace.advance(SaveState::Persisting).unwrap();
        trace.advance(SaveState::Committed).unwrap();

        assert_eq!(
            trace.states(),
            &[
                SaveState::Reconciling,
                SaveState::Creating,
                SaveState::Persisting,
                SaveState::Committed
            ]
        );
    }

    #[test]
    fn create_cannot_skip_persisting() {
        let mut trace = SaveTrace::start("sales");
        trace.advance(SaveState::Creating).unwrap();

        let err = trace.advance(SaveState::Committed).unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                from: SaveState::Creating,
                to: SaveState::Committed,
            }
        );
        assert_eq!(trace.current(), SaveState::Creating);
    }

    #[test]
    fn failed_validation_ends_rolled_back() {
        let mut trace = SaveTrace::start("sales");
        trace.advance(SaveState::Validating).unwrap();
        trace.roll_back();

        assert_eq!(trace.current(), SaveState::RolledBack);
        assert_eq!(
            trace.into_states(),
            vec![SaveState::Reconciling, SaveState::Validating, SaveState::RolledBack]
        );
    }

    #[test]
    fn roll_back_after_commit_is_ignored() {
        let mut trace = SaveTrace::start("sales");
        trace.advance(SaveState::Creating).unwrap();
        trace.advance(SaveState::Persisting).unwrap();
        trace.advance(SaveState::Committed).unwrap();
        trace.roll_back();

        assert_eq!(trace.current(), SaveState::Committed);
        assert_eq!(trace.states().len(), 4);
    }

    #[test]
    fn terminal_states_are_final() {
        for state in SaveState::ALL.iter().filter(|s| s.is_terminal()) {
            assert!(allowed_transitions(*state).is_empty());
        }
    }

    #[test]
    fn every_live_state_can_roll_back() {
        for state in SaveState::ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(validate_transition(*state, SaveState::RolledBack).is_ok());
        }
    }

    proptest! {
        #[test]
        fn transitions_match_allowed_set(
            from in prop::sample::select(SaveState::ALL.to_vec()),
            to in prop::sample::select(SaveState::ALL.to_vec()),
        ) {
            let allowed = allowed_transitions(from);
            prop_assert_eq!(validate_transition(from, to).is_ok(), allowed.contains(&to));
        }
    }
}
