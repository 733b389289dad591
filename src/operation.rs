//! The identity-generating service whose lifetime the endpoint reports.
//!
//! One implementation, [`OperationService`], sits behind three capability
//! traits. Binding each trait under a different [`Lifetime`] is what makes the
//! three reported identifiers behave differently.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::{Lifetime, ServiceCollection};

/// A service carrying an identifier fixed at construction.
pub trait Operation: Send + Sync {
    fn operation_id(&self) -> Uuid;
}

/// Capability resolved fresh on every resolution.
pub trait TransientOperation: Operation {}

/// Capability shared by every resolution within one request.
pub trait ScopedOperation: Operation {}

/// Capability shared by every request for the life of the process.
pub trait SingletonOperation: Operation {}

/// Identity generator: a random v4 UUID assigned in [`new`](Self::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationService {
    id: Uuid,
}

impl OperationService {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for OperationService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl Operation for OperationService {
    fn operation_id(&self) -> Uuid {
        self.id
    }
}

impl TransientOperation for OperationService {}
impl ScopedOperation for OperationService {}
impl SingletonOperation for OperationService {}

/// Registers the three operation capabilities, one per lifetime.
pub fn add_operations(services: &mut ServiceCollection) -> &mut ServiceCollection {
    services
        .register_trait::<dyn TransientOperation, _>(Lifetime::Transient, |_| {
            Ok(Arc::new(OperationService::new()))
        })
        .register_trait::<dyn ScopedOperation, _>(Lifetime::Scoped, |_| {
            Ok(Arc::new(OperationService::new()))
        })
        .register_trait::<dyn SingletonOperation, _>(Lifetime::Singleton, |_| {
            Ok(Arc::new(OperationService::new()))
        })
}
