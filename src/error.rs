//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors
///
/// Two families: configuration errors (the container was asked for something
/// it cannot provide as registered) and construction errors (a registered
/// factory failed).
///
/// # Examples
///
/// ```rust
/// use opscope::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use opscope::DiError;
///
/// let not_found = DiError::NotFound("MyService");
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// let failed = DiError::construction::<String>("entropy source unavailable");
///
/// assert!(not_found.is_configuration());
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// assert!(!failed.is_configuration());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiError {
    /// Service not registered
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Invalid lifetime resolution (e.g., scoped from root)
    #[error("Lifetime error: {0}")]
    WrongLifetime(&'static str),
    /// A registered factory reported a failure
    #[error("Failed to construct {service}: {message}")]
    Construction {
        /// Type name of the service being built
        service: &'static str,
        /// Factory-supplied reason
        message: String,
    },
}

impl DiError {
    /// Builds a construction error attributed to `T`.
    pub fn construction<T: ?Sized>(message: impl fmt::Display) -> Self {
        DiError::Construction {
            service: std::any::type_name::<T>(),
            message: message.to_string(),
        }
    }

    /// `true` for errors caused by how the container was set up rather than
    /// by a factory failing at run time.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, DiError::Construction { .. })
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
