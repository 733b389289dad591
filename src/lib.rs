//! # opscope
//!
//! A small dependency injection container and the HTTP endpoint that shows
//! off its three service lifetimes.
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: created once and shared for the life of the process
//! - **Scoped**: created once per scope; the HTTP layer opens one scope per request
//! - **Transient**: created fresh on every resolution
//!
//! ## Quick Start
//!
//! ```rust
//! use opscope::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_transient_factory::<UserService, _>(|resolver| {
//!     UserService {
//!         db: resolver.get_required::<Database>(),
//!     }
//! });
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## The `/getservices` endpoint
//!
//! ```rust
//! use opscope::operation::{add_operations, Operation, ScopedOperation, SingletonOperation};
//! use opscope::{ServiceCollection, Resolver};
//!
//! let mut services = ServiceCollection::new();
//! add_operations(&mut services);
//! let provider = services.build();
//!
//! let request_a = provider.create_scope();
//! let request_b = provider.create_scope();
//!
//! let scoped_a = request_a.get_required_trait::<dyn ScopedOperation>().operation_id();
//! let scoped_b = request_b.get_required_trait::<dyn ScopedOperation>().operation_id();
//! assert_ne!(scoped_a, scoped_b);
//!
//! let single_a = request_a.get_required_trait::<dyn SingletonOperation>().operation_id();
//! let single_b = request_b.get_required_trait::<dyn SingletonOperation>().operation_id();
//! assert_eq!(single_a, single_b);
//! ```

pub mod app;
pub mod axum_integration;
pub mod collection;
pub mod config;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod operation;
pub mod provider;
pub mod telemetry;
pub mod traits;

mod internal;
mod registration;

pub use collection::ServiceCollection;
pub use error::{DiError, DiResult};
pub use key::{key_of_trait, key_of_type, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, TracingObserver};
pub use provider::{ResolverContext, Scope, ServiceProvider};
pub use traits::{Resolver, ResolverCore};
