// Round gate - Generation counter that orders overlapping fetch rounds
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Every round takes a generation before it starts and hands its merge to the
/// gate when it settles. Merges run while the gate lock is held, so once
/// [`RoundGate::close`] returns no late round can touch state anymore.
#[derive(Debug, Default)]
pub struct RoundGate {
    state: Mutex<GateState>,
}

#[derive(Debug, Default)]
struct GateState {
    closed: bool,
    issued: u64,
    applied: u64,
}

impl RoundGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next generation, or `None` once the gate is closed.
    pub fn issue(&self) -> Option<u64> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.issued += 1;
        Some(state.issued)
    }

    /// Like [`RoundGate::issue`], but `start` runs under the gate lock. No
    /// merge can land between issuing the generation and `start`.
    pub fn issue_with<F: FnOnce(u64)>(&self, start: F) -> Option<u64> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        state.issued += 1;
        start(state.issued);
        Some(state.issued)
    }

    /// Merge unless a newer generation has already been merged.
    pub fn apply_if_newer<F: FnOnce()>(&self, generation: u64, merge: F) -> bool {
        let mut state = self.lock();
        if state.closed || generation <= state.applied {
            return false;
        }
        state.applied = generation;
        merge();
        true
    }

    /// Merge only if no round has been issued since this one.
    pub fn apply_if_latest<F: FnOnce()>(&self, generation: u64, merge: F) -> bool {
        let mut state = self.lock();
        if state.closed || generation != state.issued {
            return false;
        }
        state.applied = generation;
        merge();
        true
    }

    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
