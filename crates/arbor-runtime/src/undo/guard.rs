#![forbid(unsafe_code)]

//! Non-reentrant recorder guard.
//!
//! The guard is raised while the history itself mutates the document
//! (replaying a snapshot) or reads it (capturing one). Change notifications
//! that arrive while it is raised are not recorded.

use std::cell::Cell;
use std::fmt;

/// Single-flag guard; at most one [`GuardToken`] exists at a time.
#[derive(Default)]
pub struct RecorderGuard {
    active: Cell<bool>,
}

impl fmt::Debug for RecorderGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecorderGuard")
            .field("active", &self.active.get())
            .finish()
    }
}

impl RecorderGuard {
    /// Create an inactive guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a token is currently held.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Raise the guard, or return `None` if it is already raised.
    ///
    /// The guard drops back when the token does, on every exit path.
    #[must_use]
    pub fn try_acquire(&self) -> Option<GuardToken<'_>> {
        if self.active.replace(true) {
            return None;
        }
        Some(GuardToken { guard: self })
    }
}

/// Scope token for a raised [`RecorderGuard`].
pub struct GuardToken<'a> {
    guard: &'a RecorderGuard,
}

impl fmt::Debug for GuardToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardToken").finish_non_exhaustive()
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.active.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_releases_on_drop() {
        let guard = RecorderGuard::new();
        {
            let _token = guard.try_acquire().unwrap();
            assert!(guard.is_active());
        }
        assert!(!guard.is_active());
    }

    #[test]
    fn second_acquire_is_refused() {
        let guard = RecorderGuard::new();
        let token = guard.try_acquire();
        assert!(token.is_some());
        assert!(guard.try_acquire().is_none());
        assert!(guard.is_active(), "refused acquire must not release");
        drop(token);
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn token_releases_on_unwind() {
        let guard = RecorderGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _token = guard.try_acquire().unwrap();
            panic!("replay blew up");
        }));
        assert!(result.is_err());
        assert!(!guard.is_active());
    }
}
