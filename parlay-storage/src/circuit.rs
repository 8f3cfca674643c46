//! Circuit breaker for the remote tier.
//!
//! Two states only. A qualifying failure opens the circuit and it stays
//! open until an explicit connectivity probe succeeds; there is no
//! half-open state and no timer.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::RwLock;

use parlay_core::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    /// Remote tier in use.
    Closed = 0,
    /// Remote tier bypassed.
    Open = 1,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            _ => CircuitState::Open,
        }
    }
}

pub struct CircuitBreaker {
    state: AtomicU8,
    trips: AtomicU64,
    last_reason: RwLock<Option<String>>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(false)
    }
}

impl CircuitBreaker {
    pub fn new(initially_open: bool) -> Self {
        let state = if initially_open {
            CircuitState::Open
        } else {
            CircuitState::Closed
        };
        Self {
            state: AtomicU8::new(state as u8),
            trips: AtomicU64::new(0),
            last_reason: RwLock::new(None),
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    /// Open the circuit. Returns true if this call changed the state.
    pub fn trip(&self, reason: impl Into<String>) -> bool {
        if let Ok(mut guard) = self.last_reason.write() {
            *guard = Some(reason.into());
        }

        let previous = self.state.swap(CircuitState::Open as u8, Ordering::SeqCst);
        let changed = CircuitState::from(previous) == CircuitState::Closed;
        if changed {
            self.trips.fetch_add(1, Ordering::SeqCst);
        }
        changed
    }

    /// Open the circuit if `err` is of a kind that disables the remote tier.
    /// Returns true if the circuit is open because of this error.
    pub fn record(&self, err: &RemoteError) -> bool {
        if err.opens_circuit() {
            self.trip(err.to_string());
            true
        } else {
            false
        }
    }

    pub fn reset(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_reason.write() {
            *guard = None;
        }
    }

    /// How many times the circuit went from closed to open.
    pub fn trip_count(&self) -> u64 {
        self.trips.load(Ordering::SeqCst)
    }

    pub fn last_reason(&self) -> Option<String> {
        self.last_reason.read().ok().and_then(|r| r.clone())
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("state", &self.state())
            .field("trips", &self.trips.load(Ordering::Relaxed))
            .field("last_reason", &self.last_reason())
            .finish()
    }
}
