//! Tokens every application provides.

use once_cell::sync::Lazy;

use crate::key::{InjectionToken, Token};

/// The context value of the operation in flight, provided by every
/// operation injector.
///
/// The stored type is whatever was passed to
/// [`Application::operation`](crate::Application::operation), so it is an
/// untyped token; read it with `get_as::<C>(&*CONTEXT)`.
pub static CONTEXT: Lazy<Token> = Lazy::new(|| Token::opaque("context"));

/// Id of the module that owns the injector.
pub static MODULE_ID: Lazy<InjectionToken<String>> = Lazy::new(|| InjectionToken::new("module-id"));
