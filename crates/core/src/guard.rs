//! Pending-action guard

use std::cell::Cell;

/// Guard position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GuardState {
    /// No request outstanding; the trigger accepts activation.
    #[default]
    Released,

    /// A request is in flight.
    Held,

    /// The action completed in a way that keeps the trigger disabled until reload.
    Locked,
}

/// Per-trigger flag preventing re-entrant activation while a request is outstanding.
#[derive(Debug, Default)]
pub struct PendingActionGuard {
    state: Cell<GuardState>,
}

impl PendingActionGuard {
    /// Create a released guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position.
    pub fn state(&self) -> GuardState {
        self.state.get()
    }

    /// Take the guard. Returns `false` if it was already held or locked.
    pub fn try_acquire(&self) -> bool {
        if self.state.get() != GuardState::Released {
            return false;
        }

        self.state.set(GuardState::Held);

        true
    }

    /// Release a held guard. A locked guard stays locked.
    pub fn release(&self) {
        if self.state.get() == GuardState::Held {
            self.state.set(GuardState::Released);
        }
    }

    /// Keep the trigger disabled for the rest of the page's life.
    pub fn lock(&self) {
        self.state.set(GuardState::Locked);
    }

    /// Whether activation is currently refused.
    pub fn is_engaged(&self) -> bool {
        self.state.get() != GuardState::Released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_while_held() {
        let guard = PendingActionGuard::new();

        assert!(guard.try_acquire());
        assert!(!guard.try_acquire());
        assert!(guard.is_engaged());

        guard.release();

        assert!(!guard.is_engaged());
        assert!(guard.try_acquire());
    }

    #[test]
    fn locked_guard_survives_release() {
        let guard = PendingActionGuard::new();

        assert!(guard.try_acquire());

        guard.lock();
        guard.release();

        assert_eq!(guard.state(), GuardState::Locked);
        assert!(!guard.try_acquire());
    }

    #[test]
    fn release_without_acquire_is_a_no_op() {
        let guard = PendingActionGuard::new();

        guard.release();

        assert_eq!(guard.state(), GuardState::Released);
    }
}
