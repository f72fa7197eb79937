//! Core traits for the injector.

mod destroy;
mod resolver;

pub use destroy::OnDestroy;
pub use resolver::{Resolver, ResolverCore};
