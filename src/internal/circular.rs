//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 256;

// Sees the chain on this thread only. Cycles split across threads are caught
// by the build graph in `singleton.rs`.
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

/// Entry on the thread-local resolution stack, popped on drop.
pub(crate) struct ResolutionGuard;

impl ResolutionGuard {
    /// Pushes `name` on the resolution stack.
    ///
    /// Fails with [`DiError::Circular`] when `name` is already being resolved
    /// further up the stack on this thread. The check has to happen before a
    /// one-time slot is entered, or re-entrant initialization would block forever.
    pub(crate) fn enter(name: &'static str) -> DiResult<Self> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.iter().any(|&n| n == name) || stack.len() >= MAX_DEPTH {
                let mut path = stack.clone();
                path.push(name);
                return Err(DiError::Circular(path));
            }

            stack.push(name);
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
