//! Client-side cookie storage.
//!
//! The auth service issues the session as an `access_token` cookie whose value
//! is `"Bearer <jwt>"`. The gateway captures `Set-Cookie` headers here, replays
//! them in a `Cookie` header and mirrors the token into `Authorization`.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};

/// Name of the cookie carrying the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Abstraction for cookie storage backends.
///
/// Values are stored raw, exactly as received, so they can be replayed
/// unchanged.
pub trait CookieStore: Send + Sync {
    /// Retrieves a cookie value by name.
    fn get(&self, name: &str) -> Option<SecretString>;

    /// Stores or replaces a cookie.
    fn set(&self, name: &str, value: SecretString);

    /// Removes a cookie by name. Idempotent.
    fn remove(&self, name: &str);

    /// Value for a `Cookie` request header, if any cookie is stored.
    fn header_value(&self) -> Option<String>;
}

/// In-memory cookie store.
#[derive(Default)]
pub struct MemoryCookieStore {
    cookies: RwLock<BTreeMap<String, SecretString>>,
}

impl MemoryCookieStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<SecretString> {
        self.cookies.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: SecretString) {
        self.cookies.write().insert(name.to_string(), value);
    }

    fn remove(&self, name: &str) {
        self.cookies.write().remove(name);
    }

    fn header_value(&self) -> Option<String> {
        let cookies = self.cookies.read();
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{name}={}", value.expose_secret()))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl std::fmt::Debug for MemoryCookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.cookies.read().keys().cloned().collect();
        f.debug_struct("MemoryCookieStore")
            .field("cookies", &names)
            .finish()
    }
}

/// A parsed `Set-Cookie` header.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SetCookie {
    /// Store (or replace) the cookie.
    Store { name: String, value: String },
    /// The server asked for the cookie to be dropped.
    Delete { name: String },
}

/// Parse a `Set-Cookie` header value.
///
/// Only the name/value pair and `Max-Age` matter here; an empty value or a
/// non-positive `Max-Age` is treated as a deletion.
pub(crate) fn parse_set_cookie(header: &str) -> Option<SetCookie> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim();

    let expired = parts.any(|attr| {
        attr.split_once('=').is_some_and(|(key, val)| {
            key.trim().eq_ignore_ascii_case("max-age")
                && val.trim().parse::<i64>().is_ok_and(|age| age <= 0)
        })
    });

    if expired || unquote(value).is_empty() {
        Some(SetCookie::Delete {
            name: name.to_string(),
        })
    } else {
        Some(SetCookie::Store {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Extract the bare token from an `access_token` cookie value.
///
/// Accepts `"Bearer abc"`, `Bearer abc` and `abc`.
#[must_use]
pub fn bearer_token(cookie_value: &str) -> Option<&str> {
    let unquoted = unquote(cookie_value.trim());
    let token = unquoted
        .strip_prefix("Bearer ")
        .unwrap_or(unquoted)
        .trim();
    (!token.is_empty()).then_some(token)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
