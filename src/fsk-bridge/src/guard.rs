//! Single-flight guard.
//!
//! At most one request may be outstanding on the channel. The guard is an
//! atomic test-and-set, so the invariant holds even when several threads race
//! to send.

use std::sync::atomic::{AtomicU8, Ordering};

const IDLE: u8 = 0;
const NAVIGATION: u8 = 1;
const API: u8 = 2;

/// What kind of request holds the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    /// A page navigation; its response is rendered.
    Navigation,

    /// An intercepted API call; its response resolves the caller.
    Api,
}

impl Flight {
    fn as_u8(self) -> u8 {
        match self {
            Flight::Navigation => NAVIGATION,
            Flight::Api => API,
        }
    }
}

/// Observable guard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    AwaitingResponse(Flight),
}

impl GuardState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GuardState::Idle)
    }
}

/// Prevents more than one outstanding request.
#[derive(Debug)]
pub struct SingleFlight {
    state: AtomicU8,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Claim the guard for `flight`.
    ///
    /// Returns `false` without effect if a request is already outstanding.
    pub fn try_begin(&self, flight: Flight) -> bool {
        self.state
            .compare_exchange(IDLE, flight.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Return to idle unconditionally.
    pub fn release(&self) {
        self.state.store(IDLE, Ordering::Release);
    }

    pub fn state(&self) -> GuardState {
        match self.state.load(Ordering::Acquire) {
            NAVIGATION => GuardState::AwaitingResponse(Flight::Navigation),
            API => GuardState::AwaitingResponse(Flight::Api),
            _ => GuardState::Idle,
        }
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}
