//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod singleton;

pub(crate) use circular::ResolutionGuard;
pub(crate) use singleton::get_or_build;
