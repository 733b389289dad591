//! First construction of singletons across threads.
//!
//! The per-thread resolution stack cannot see a cycle whose halves run on
//! different threads: one thread builds `A` and waits for `B` while another
//! builds `B` and waits for `A`. Every in-progress build is recorded here
//! together with the slot each blocked thread waits on, so a thread about to
//! block can follow the chain of builders and refuse when it leads back to
//! itself.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{Condvar, Mutex};

use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

/// Address of a singleton's `OnceCell`; stable while its provider is alive.
type SlotId = usize;

#[derive(Default)]
struct BuildGraph {
    /// Slot -> thread running its factory, and the service name
    builders: HashMap<SlotId, (ThreadId, &'static str)>,
    /// Thread -> slot it is blocked on
    waiting: HashMap<ThreadId, SlotId>,
}

impl BuildGraph {
    /// Service names along the chain of builders starting at `slot`, if that
    /// chain ends at a slot `me` is building.
    fn cycle_through(&self, me: ThreadId, slot: SlotId) -> Option<Vec<&'static str>> {
        let mut path = Vec::new();
        let mut current = slot;
        for _ in 0..=self.waiting.len() {
            let &(owner, name) = self.builders.get(&current)?;
            path.push(name);
            if owner == me {
                return Some(path);
            }
            current = *self.waiting.get(&owner)?;
        }
        None
    }
}

static GRAPH: Lazy<Mutex<BuildGraph>> = Lazy::new(Default::default);
static BUILT: Condvar = Condvar::new();

/// Marks a slot as being built by the current thread until dropped.
struct BuildClaim {
    slot: SlotId,
}

impl Drop for BuildClaim {
    fn drop(&mut self) {
        GRAPH.lock().builders.remove(&self.slot);
        BUILT.notify_all();
    }
}

/// Returns the value in `cell`, running `build` if no thread has filled it yet.
///
/// Concurrent callers wait for the thread already building the slot. A caller
/// whose wait would close a cycle of builders gets [`DiError::Circular`]
/// instead. A failed build leaves the cell empty and the next waiter retries.
pub(crate) fn get_or_build<F>(cell: &OnceCell<AnyArc>, name: &'static str, build: F) -> DiResult<AnyArc>
where
    F: FnOnce() -> DiResult<AnyArc>,
{
    if let Some(value) = cell.get() {
        return Ok(value.clone());
    }

    let slot = cell as *const OnceCell<AnyArc> as SlotId;
    let me = thread::current().id();

    let _claim = {
        let mut graph = GRAPH.lock();
        loop {
            if let Some(value) = cell.get() {
                return Ok(value.clone());
            }
            if !graph.builders.contains_key(&slot) {
                graph.builders.insert(slot, (me, name));
                break BuildClaim { slot };
            }
            if let Some(mut path) = graph.cycle_through(me, slot) {
                path.push(name);
                tracing::debug!(service = name, "singleton build would wait on itself");
                return Err(DiError::Circular(path));
            }
            graph.waiting.insert(me, slot);
            BUILT.wait(&mut graph);
            graph.waiting.remove(&me);
        }
    };

    let value = build()?;
    // Published before the claim is released, so woken waiters find it.
    let _ = cell.set(value.clone());
    Ok(value)
}
