//! Tracker lifecycle.
//!
//! The tracker moves through `Uninitialized -> Ready <-> Tracking -> Closed`.
//! Every transition goes through [`TrackerState::next`]; anything not listed
//! there is rejected with a [`StateError`].

use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    Uninitialized,
    Ready,
    Tracking,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackerEvent {
    /// Capture device opened during construction.
    Open,
    StartTracking,
    StopTracking,
    Close,
}

impl TrackerEvent {
    pub fn name(self) -> &'static str {
        match self {
            TrackerEvent::Open => "open",
            TrackerEvent::StartTracking => "start_tracking",
            TrackerEvent::StopTracking => "stop_tracking",
            TrackerEvent::Close => "close",
        }
    }
}

impl TrackerState {
    /// Transition table. `None` means the event is not allowed in this state.
    pub fn next(self, event: TrackerEvent) -> Option<TrackerState> {
        use TrackerEvent as E;
        use TrackerState as S;
        match (self, event) {
            (S::Uninitialized, E::Open) => Some(S::Ready),
            (S::Ready, E::StartTracking) => Some(S::Tracking),
            (S::Tracking, E::StopTracking) => Some(S::Ready),
            (S::Ready | S::Tracking, E::Close) => Some(S::Closed),
            (S::Closed, E::Close) => Some(S::Closed),
            _ => None,
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, TrackerState::Ready | TrackerState::Tracking)
    }
}

impl fmt::Display for TrackerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackerState::Uninitialized => "uninitialized",
            TrackerState::Ready => "ready",
            TrackerState::Tracking => "tracking",
            TrackerState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A call was made in a state that does not allow it.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot {operation} while the tracker is {state}")]
pub struct StateError {
    pub operation: &'static str,
    pub state: TrackerState,
}

#[derive(Debug)]
pub(crate) struct StateMachine {
    state: TrackerState,
}

impl StateMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: TrackerState::Uninitialized,
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> TrackerState {
        self.state
    }

    pub(crate) fn apply(&mut self, event: TrackerEvent) -> Result<TrackerState, StateError> {
        let next = self.state.next(event).ok_or(StateError {
            operation: event.name(),
            state: self.state,
        })?;
        if next != self.state {
            log::debug!("tracker state {} -> {}", self.state, next);
        }
        self.state = next;
        Ok(next)
    }

    pub(crate) fn require(
        &self,
        operation: &'static str,
        allowed: impl Fn(TrackerState) -> bool,
    ) -> Result<(), StateError> {
        if allowed(self.state) {
            Ok(())
        } else {
            Err(StateError {
                operation,
                state: self.state,
            })
        }
    }
}
