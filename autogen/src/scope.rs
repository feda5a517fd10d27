//! Process-wide active mode.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::mode::Mode;

/// `None` until the first [`Scope::enter`].
static ACTIVE: Mutex<Option<Mode>> = Mutex::new(None);

fn active() -> MutexGuard<'static, Option<Mode>> {
    // The guarded value is a plain `Option<Mode>`, valid even after a panic
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holder of the mode used by tracing calls that do not name one.
///
/// The state is shared by the whole process. Changing it affects every later
/// call on every thread, so applications that trace from several threads
/// should pass modes explicitly.
pub struct Scope;

impl Scope {
    /// The active mode, or [`Mode::Numerical`] if no mode was ever entered.
    pub fn current_mode() -> Mode {
        active().unwrap_or(Mode::Numerical)
    }

    /// Whether any mode has been entered.
    pub fn is_initialized() -> bool {
        active().is_some()
    }

    /// Make `mode` the active mode until the next `enter`.
    pub fn enter(mode: Mode) {
        let previous = active().replace(mode);
        if previous != Some(mode) {
            debug!("scope: {:?} -> {}", previous, mode);
        }
    }

    /// Make `mode` active until the returned guard is dropped.
    pub fn enter_scoped(mode: Mode) -> ScopeGuard {
        let previous = active().replace(mode);
        debug!("scope: entered {} (restores {:?})", mode, previous);
        ScopeGuard { previous }
    }

    #[cfg(test)]
    pub(crate) fn reset() {
        *active() = None;
    }
}

/// Restores the previously active mode when dropped.
#[must_use = "the previous mode is restored as soon as the guard is dropped"]
pub struct ScopeGuard {
    previous: Option<Mode>,
}

impl ScopeGuard {
    /// The mode that will be restored.
    pub fn previous(&self) -> Option<Mode> {
        self.previous
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        *active() = self.previous;
        debug!("scope: restored {:?}", self.previous);
    }
}

/// Serializes unit tests that read or write the process-wide mode.
#[cfg(test)]
pub(crate) fn test_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    let guard = LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    Scope::reset();
    guard
}
