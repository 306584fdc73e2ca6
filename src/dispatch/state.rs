//! Dispatch state machine.
//!
//! # States
//! - Building: request handed to the engine, nothing applied yet
//! - RequestIntercepted: request chain applied for the current hop
//! - Executing: transport call (or stub) for the current hop
//! - RedirectLoop: redirect resolved, next hop about to re-enter the request chain
//! - ResponseIntercepted: response chain applied to the final exchange
//! - Validated: the exchange left the response chain as a success
//! - Transferring: download body being written to its destination
//! - Deserializing: deserializer running over the body
//! - Completed: terminal, success or failure
//!
//! # State Transitions
//! ```text
//! Building → RequestIntercepted → Executing
//! Executing → RedirectLoop → RequestIntercepted   (per hop)
//! Executing → ResponseIntercepted → Validated → [Transferring] → Deserializing
//! any non-terminal → Completed(Failure)
//! Deserializing → Completed(Success)
//! ```

use std::fmt;

/// Outcome recorded by the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Building,
    RequestIntercepted,
    Executing,
    RedirectLoop,
    ResponseIntercepted,
    Validated,
    Transferring,
    Deserializing,
    Completed(Outcome),
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Completed(_))
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: DispatchState) -> bool {
        use DispatchState::*;

        if self.is_terminal() {
            return false;
        }
        if next == Completed(Outcome::Failure) {
            return true;
        }
        matches!(
            (self, next),
            (Building, RequestIntercepted)
                | (RequestIntercepted, Executing)
                | (Executing, RedirectLoop)
                | (RedirectLoop, RequestIntercepted)
                | (Executing, ResponseIntercepted)
                | (ResponseIntercepted, Validated)
                | (Validated, Transferring)
                | (Validated, Deserializing)
                | (Transferring, Deserializing)
                | (Deserializing, Completed(Outcome::Success))
        )
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Building => "building",
            DispatchState::RequestIntercepted => "request_intercepted",
            DispatchState::Executing => "executing",
            DispatchState::RedirectLoop => "redirect_loop",
            DispatchState::ResponseIntercepted => "response_intercepted",
            DispatchState::Validated => "validated",
            DispatchState::Transferring => "transferring",
            DispatchState::Deserializing => "deserializing",
            DispatchState::Completed(Outcome::Success) => "completed(success)",
            DispatchState::Completed(Outcome::Failure) => "completed(failure)",
        };
        f.write_str(name)
    }
}

/// Current state plus the path taken to reach it.
#[derive(Debug, Clone)]
pub struct StateTracker {
    current: DispatchState,
    history: Vec<DispatchState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            current: DispatchState::Building,
            history: vec![DispatchState::Building],
        }
    }

    pub fn current(&self) -> DispatchState {
        self.current
    }

    pub fn history(&self) -> &[DispatchState] {
        &self.history
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: DispatchState) {
        if !self.current.can_transition_to(next) {
            tracing::warn!(from = %self.current, to = %next, "Ignoring illegal dispatch transition");
            return;
        }
        tracing::debug!(from = %self.current, to = %next, "Dispatch state changed");
        self.current = next;
        self.history.push(next);
    }

    pub fn fail(&mut self) {
        self.advance(DispatchState::Completed(Outcome::Failure));
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_with_redirect() {
        let mut tracker = StateTracker::new();
        for next in [
            DispatchState::RequestIntercepted,
            DispatchState::Executing,
            DispatchState::RedirectLoop,
            DispatchState::RequestIntercepted,
            DispatchState::Executing,
            DispatchState::ResponseIntercepted,
            DispatchState::Validated,
            DispatchState::Deserializing,
            DispatchState::Completed(Outcome::Success),
        ] {
            tracker.advance(next);
        }
        assert_eq!(tracker.current(), DispatchState::Completed(Outcome::Success));
        assert_eq!(tracker.history().len(), 10);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut tracker = StateTracker::new();
        tracker.fail();
        tracker.advance(DispatchState::RequestIntercepted);
        tracker.fail();
        assert_eq!(tracker.current(), DispatchState::Completed(Outcome::Failure));
        assert_eq!(tracker.history().len(), 2);
    }

    #[test]
    fn test_cannot_skip_validation() {
        assert!(!DispatchState::Executing.can_transition_to(DispatchState::Deserializing));
        assert!(!DispatchState::Building.can_transition_to(DispatchState::Completed(Outcome::Success)));
        assert!(DispatchState::Executing.can_transition_to(DispatchState::Completed(Outcome::Failure)));
    }
}
