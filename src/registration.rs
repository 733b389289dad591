//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;

pub(crate) use crate::provider::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Service registration with lifetime and constructor
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    /// Process-wide slot, present only for singletons
    pub(crate) single_runtime: Option<OnceCell<AnyArc>>,
    /// Index into a scope's slot array, assigned by [`Registry::finalize`]
    pub(crate) scoped_slot: Option<usize>,
}

impl Registration {
    pub(crate) fn new(lifetime: Lifetime, ctor: Ctor) -> Self {
        let single_runtime = match lifetime {
            Lifetime::Singleton => Some(OnceCell::new()),
            _ => None,
        };

        Self {
            lifetime,
            ctor,
            single_runtime,
            scoped_slot: None,
        }
    }
}

/// Service registry holding all registrations
#[derive(Default)]
pub(crate) struct Registry {
    entries: HashMap<Key, Registration>,
    /// Total count of scoped registrations for slot allocation
    pub(crate) scoped_count: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a registration, returning the one it replaced.
    pub(crate) fn insert(&mut self, key: Key, registration: Registration) -> Option<Registration> {
        self.entries.insert(key, registration)
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.entries.get(key)
    }

    #[inline(always)]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.entries.iter()
    }

    /// Assigns scoped slot indices. Called once by `ServiceCollection::build`.
    pub(crate) fn finalize(&mut self) {
        let mut next_scoped_slot = 0;

        for reg in self.entries.values_mut() {
            if reg.lifetime == Lifetime::Scoped {
                reg.scoped_slot = Some(next_scoped_slot);
                next_scoped_slot += 1;
            }
        }

        self.scoped_count = next_scoped_slot;
    }
}
