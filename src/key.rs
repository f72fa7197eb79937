//! Tokens, keys and the key registry.
//!
//! A [`Token`] names *what* should be injected. It is either a Rust type
//! (the analogue of a class reference) or an opaque injection token created
//! at runtime. Tokens compare by identity: two opaque tokens with the same
//! description are still different tokens.
//!
//! A [`Key`] is a token paired with a small integer assigned by a
//! [`KeyRegistry`] the first time the token is seen. Injectors store and
//! compare key ids only.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

static NEXT_OPAQUE_ID: AtomicU64 = AtomicU64::new(0);

static GLOBAL_REGISTRY: Lazy<KeyRegistry> = Lazy::new(KeyRegistry::new);

/// Identity of an injectable thing.
///
/// # Examples
///
/// ```rust
/// use reflective_di::Token;
///
/// struct Database;
///
/// assert_eq!(Token::of::<Database>(), Token::of::<Database>());
///
/// // Opaque tokens are unique even when their descriptions match.
/// let a = Token::opaque("config");
/// let b = Token::opaque("config");
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// ```
#[derive(Clone)]
pub enum Token {
    /// A Rust type used as its own token.
    Type(TypeId, &'static str),
    /// A runtime-created marker with a process-unique id and a description.
    Opaque(u64, Arc<str>),
}

impl Token {
    /// Token for the type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Creates a fresh opaque token.
    pub fn opaque(description: impl Into<Arc<str>>) -> Self {
        Token::Opaque(NEXT_OPAQUE_ID.fetch_add(1, Ordering::Relaxed), description.into())
    }

    /// Human readable name used in error messages.
    pub fn display_name(&self) -> String {
        self.to_string()
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Token::Type(..))
    }
}

// Identity only: the display strings never take part in comparisons.
impl PartialEq for Token {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Type(a, _), Token::Type(b, _)) => a == b,
            (Token::Opaque(a, _), Token::Opaque(b, _)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl Hash for Token {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Token::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Opaque(id, _) => {
                1u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(_, name) => f.write_str(name),
            Token::Opaque(_, description) => write!(f, "InjectionToken {}", description),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(_, name) => write!(f, "Type({})", name),
            Token::Opaque(id, description) => write!(f, "Opaque(#{} {})", id, description),
        }
    }
}

/// Typed opaque token.
///
/// The type parameter records what the token resolves to so that
/// [`Resolver::get_token`](crate::Resolver::get_token) can hand back an
/// `Arc<T>` without a separate type annotation.
///
/// ```rust
/// use reflective_di::{InjectionToken, Injector, Provider, Resolver};
///
/// let port: InjectionToken<u16> = InjectionToken::new("port");
/// let injector = Injector::create(
///     "root",
///     &[Provider::provide(&port).use_value(8080u16)],
///     None,
///     None,
/// ).unwrap();
///
/// assert_eq!(*injector.get_token(&port).unwrap(), 8080);
/// ```
pub struct InjectionToken<T> {
    token: Token,
    _marker: PhantomData<fn() -> T>,
}

impl<T> InjectionToken<T> {
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            token: Token::opaque(description),
            _marker: PhantomData,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

impl<T> Clone for InjectionToken<T> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for InjectionToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.token, f)
    }
}

impl<T> fmt::Display for InjectionToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.token, f)
    }
}

/// A token that is only known once its thunk runs.
///
/// Used when two declarations refer to each other and one of them cannot
/// name the other's token yet. The thunk is evaluated when a key is requested,
/// which happens while providers are resolved rather than when they are declared.
#[derive(Clone)]
pub struct ForwardRef(Arc<dyn Fn() -> Token + Send + Sync>);

impl ForwardRef {
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> Token + Send + Sync + 'static,
    {
        Self(Arc::new(thunk))
    }

    pub fn resolve(&self) -> Token {
        (self.0)()
    }
}

impl fmt::Debug for ForwardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForwardRef({})", self.resolve())
    }
}

/// Anything that can be turned into a [`Key`].
#[derive(Clone, Debug)]
pub enum TokenRef {
    Token(Token),
    Forward(ForwardRef),
    Key(Key),
}

impl TokenRef {
    /// Follows forward references down to a concrete token.
    pub fn resolve(&self) -> Token {
        match self {
            TokenRef::Token(token) => token.clone(),
            TokenRef::Forward(forward) => forward.resolve(),
            TokenRef::Key(key) => key.token().clone(),
        }
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.resolve(), f)
    }
}

impl From<Token> for TokenRef {
    fn from(token: Token) -> Self {
        TokenRef::Token(token)
    }
}

impl From<&Token> for TokenRef {
    fn from(token: &Token) -> Self {
        TokenRef::Token(token.clone())
    }
}

impl From<ForwardRef> for TokenRef {
    fn from(forward: ForwardRef) -> Self {
        TokenRef::Forward(forward)
    }
}

impl From<Key> for TokenRef {
    fn from(key: Key) -> Self {
        TokenRef::Key(key)
    }
}

impl From<&Key> for TokenRef {
    fn from(key: &Key) -> Self {
        TokenRef::Key(key.clone())
    }
}

impl<T> From<InjectionToken<T>> for TokenRef {
    fn from(token: InjectionToken<T>) -> Self {
        TokenRef::Token(token.token)
    }
}

impl<T> From<&InjectionToken<T>> for TokenRef {
    fn from(token: &InjectionToken<T>) -> Self {
        TokenRef::Token(token.token.clone())
    }
}

/// Registry-assigned identity for a token.
///
/// Two keys are equal when their ids are equal; the id is unique per token
/// for the lifetime of the registry that issued it.
#[derive(Clone, Debug)]
pub struct Key {
    token: Token,
    id: usize,
}

impl Key {
    /// Looks up (or assigns) the key for `token` in the global registry.
    #[inline]
    pub fn get(token: impl Into<TokenRef>) -> Key {
        KeyRegistry::global().get(token)
    }

    /// Key for the type `T` in the global registry.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Key {
        Key::get(Token::of::<T>())
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn display_name(&self) -> String {
        self.token.display_name()
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.token, f)
    }
}

/// Append-only token → key table.
///
/// Injectors always go through [`KeyRegistry::global`], which lives for the
/// whole process. Keys are never removed or reused, so the table is bounded
/// by the number of distinct tokens a program ever declares. Private
/// registries created with [`KeyRegistry::new`] hand out ids from their own
/// sequence and must not be mixed with injectors.
pub struct KeyRegistry {
    keys: Mutex<HashMap<Token, Key>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide registry used by every injector.
    pub fn global() -> &'static KeyRegistry {
        &GLOBAL_REGISTRY
    }

    /// Returns the key for `token`, creating it on first sight.
    ///
    /// Keys are returned unchanged and forward references are resolved
    /// before the lookup.
    pub fn get(&self, token: impl Into<TokenRef>) -> Key {
        let token = match token.into() {
            TokenRef::Key(key) => return key,
            other => other.resolve(),
        };

        let mut keys = self.keys.lock();
        let next_id = keys.len();
        keys.entry(token.clone())
            .or_insert_with(|| Key { token, id: next_id })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
