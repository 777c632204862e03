//! Debug-build check that the tick entry point stays on one thread.

use std::thread::{self, ThreadId};

/// Remembers the thread of the first checked call and asserts every later
/// call comes from it. Compiled to a no-op without `debug_assertions`.
#[derive(Debug)]
pub struct ThreadGuard {
    name: &'static str,
    owner: Option<ThreadId>,
}

impl ThreadGuard {
    /// Guard labelled `name` in assertion messages.
    pub fn new(name: &'static str) -> Self {
        Self { name, owner: None }
    }

    /// Assert the caller runs on the owning thread.
    pub fn check(&mut self, method: &str) {
        if !cfg!(debug_assertions) {
            return;
        }
        let current = thread::current().id();
        let owner = *self.owner.get_or_insert(current);
        debug_assert_eq!(
            owner, current,
            "{}::{} called off its owning thread",
            self.name, method
        );
    }

    /// Forget the owner (e.g. when a new session starts on another thread).
    pub fn release(&mut self) {
        self.owner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_thread_passes() {
        let mut guard = ThreadGuard::new("SoundEngine");
        guard.check("tick");
        guard.check("tick");
    }

    #[test]
    #[cfg(debug_assertions)]
    fn other_thread_panics() {
        let mut guard = ThreadGuard::new("SoundEngine");
        guard.check("tick");
        let result = std::thread::spawn(move || guard.check("tick")).join();
        assert!(result.is_err());
    }

    #[test]
    fn release_allows_new_owner() {
        let mut guard = ThreadGuard::new("SoundEngine");
        guard.check("tick");
        guard.release();
        std::thread::spawn(move || guard.check("tick"))
            .join()
            .expect("released guard adopts the new thread");
    }
}
