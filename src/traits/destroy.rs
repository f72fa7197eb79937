//! Destroy hook trait.

/// Teardown for operation-scoped objects.
///
/// Register the hook in the metadata table with
/// [`InjectableMetadata::with_destroy_hook`](crate::InjectableMetadata::with_destroy_hook)
/// or [`Factory::with_destroy_hook`](crate::Factory::with_destroy_hook). The hook
/// runs once when the operation that built the object completes, and only if
/// the object was actually built.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use reflective_di::{Injectable, InjectableMetadata, OnDestroy, ProviderScope};
///
/// struct Connection {
///     closed: AtomicBool,
/// }
///
/// impl OnDestroy for Connection {
///     fn on_destroy(&self) {
///         self.closed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// impl Injectable for Connection {
///     fn metadata() -> InjectableMetadata<Self> {
///         InjectableMetadata::new(|_| Ok(Connection { closed: AtomicBool::new(false) }))
///             .scope(ProviderScope::Operation)
///             .with_destroy_hook()
///     }
/// }
/// ```
pub trait OnDestroy: Send + Sync + 'static {
    fn on_destroy(&self);
}
