//! HTTP wrapper around the API gateway.
//!
//! Every request goes through [`ApiGateway::execute`], which attaches the
//! bearer token and stored cookies, captures `Set-Cookie` answers and turns a
//! 401 into a cleared session plus a redirect to the login page.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::cookies::{ACCESS_TOKEN_COOKIE, CookieStore, SetCookie, bearer_token, parse_set_cookie};
use crate::error::{ApiError, extract_message};
use crate::navigation::Navigator;
use crate::session::SessionHandle;

const JSON: &str = "application/json";

// =============================================================================
// ApiGateway
// =============================================================================

/// Client for the bakery API gateway.
///
/// Cheap to clone; all clones share the HTTP client, cookies, session and
/// navigator.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<ApiGatewayInner>,
}

struct ApiGatewayInner {
    client: reqwest::Client,
    base_url: Url,
    cookies: Arc<dyn CookieStore>,
    session: SessionHandle,
    navigator: Navigator,
}

impl ApiGateway {
    /// Create a gateway client for `config.api_url`.
    #[must_use]
    pub fn new(
        config: &ClientConfig,
        cookies: Arc<dyn CookieStore>,
        session: SessionHandle,
        navigator: Navigator,
    ) -> Self {
        Self {
            inner: Arc::new(ApiGatewayInner {
                client: reqwest::Client::new(),
                base_url: config.api_url.clone(),
                cookies,
                session,
                navigator,
            }),
        }
    }

    #[must_use]
    pub fn cookies(&self) -> &dyn CookieStore {
        self.inner.cookies.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.inner.navigator
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// `GET path` and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get<T: DeserializeOwned>(&self, path: impl Into<ApiPath>) -> Result<T, ApiError> {
        let text = self.execute(Method::GET, &path.into(), &[], None).await?;
        decode(&text)
    }

    /// `GET path?query` and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: impl Into<ApiPath>,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let text = self.execute(Method::GET, &path.into(), query, None).await?;
        decode(&text)
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post<B, T>(&self, path: impl Into<ApiPath>, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::POST, &path.into(), body).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn put<B, T>(&self, path: impl Into<ApiPath>, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::PUT, &path.into(), body).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn patch<B, T>(&self, path: impl Into<ApiPath>, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::PATCH, &path.into(), body).await
    }

    /// `DELETE path` and decode the JSON answer.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete<T: DeserializeOwned>(&self, path: impl Into<ApiPath>) -> Result<T, ApiError> {
        let text = self.execute(Method::DELETE, &path.into(), &[], None).await?;
        decode(&text)
    }

    /// Bodiless request whose answer is not needed.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn send(&self, method: Method, path: impl Into<ApiPath>) -> Result<(), ApiError> {
        self.execute(method, &path.into(), &[], None).await.map(drop)
    }

    async fn with_body<B, T>(&self, method: Method, path: &ApiPath, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let text = self.execute(method, path, &[], Some(body)).await?;
        decode(&text)
    }

    // =========================================================================
    // Core request
    // =========================================================================

    /// Send one request and return the raw body of a successful answer.
    async fn execute(
        &self,
        method: Method,
        path: &ApiPath,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(path, query);

        let mut request = self
            .inner
            .client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON);

        if let Some(stored) = self.inner.cookies.get(ACCESS_TOKEN_COOKIE)
            && let Some(token) = bearer_token(stored.expose_secret())
        {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(cookies) = self.inner.cookies.header_value() {
            request = request.header(COOKIE, cookies);
        }
        if let Some(body) = &body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(method = %method, path = %path, error = %e, "Request to API gateway failed");
                return Err(ApiError::Transport(e));
            }
        };

        for header in response.headers().get_all(SET_COOKIE) {
            if let Ok(header) = header.to_str() {
                self.apply_set_cookie(header);
            }
        }

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(method = %method, path = %path, "Unauthorized, clearing session");
            self.invalidate_session();
            return Err(ApiError::Unauthorized);
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(method = %method, path = %path, error = %e, "Failed to read response body");
                return Err(ApiError::Transport(e));
            }
        };

        if !status.is_success() {
            let message = extract_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            debug!(method = %method, path = %path, status = %status, message = %message, "Request rejected");
            return Err(ApiError::Rejected { status, message });
        }

        Ok(text)
    }

    /// Base URL plus `path`, each segment percent-encoded.
    fn endpoint(&self, path: &ApiPath, query: &[(&str, String)]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(&path.segments);
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    fn apply_set_cookie(&self, header: &str) {
        match parse_set_cookie(header) {
            Some(SetCookie::Store { name, value }) => {
                debug!(cookie = %name, "Storing cookie");
                self.inner.cookies.set(&name, SecretString::from(value));
            }
            Some(SetCookie::Delete { name }) => {
                debug!(cookie = %name, "Server deleted cookie");
                self.inner.cookies.remove(&name);
            }
            None => {}
        }
    }

    fn invalidate_session(&self) {
        self.inner.cookies.remove(ACCESS_TOKEN_COOKIE);
        self.inner.session.clear_auth();
        self.inner.navigator.redirect_to_login();
    }
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway")
            .field("base_url", &self.inner.base_url.as_str())
            .field("navigator", &self.inner.navigator)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ApiPath
// =============================================================================

/// Path below the gateway base URL, held as separate segments.
///
/// Plain strings are split on `/`. Values that come from users, such as a
/// tracking code, go in through [`ApiPath::segment`] so a `/` inside them is
/// encoded instead of starting a new segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    segments: Vec<String>,
}

impl ApiPath {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Append one segment as is.
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }
}

impl From<&str> for ApiPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<&String> for ApiPath {
    fn from(path: &String) -> Self {
        Self::new(path)
    }
}

impl std::fmt::Display for ApiPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Decode a successful answer; an empty body reads as JSON `null`.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse API gateway response"
        );
        ApiError::Parse(e)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::cookies::MemoryCookieStore;
    use crate::session::MemorySessionCache;

    use super::*;

    fn gateway(api_url: &str) -> ApiGateway {
        ApiGateway::new(
            &ClientConfig::for_api_url(api_url).unwrap(),
            Arc::new(MemoryCookieStore::new()),
            SessionHandle::new(Arc::new(MemorySessionCache::new())),
            Navigator::default(),
        )
    }

    #[test]
    fn test_endpoint_joins_path() {
        let gateway = gateway("http://127.0.0.1:8080");
        assert_eq!(
            gateway.endpoint(&"/cart/update/7".into(), &[]).as_str(),
            "http://127.0.0.1:8080/cart/update/7"
        );
    }

    #[test]
    fn test_endpoint_keeps_prefix_and_encodes() {
        let gateway = gateway("https://bakery.example/api/");
        assert_eq!(
            gateway.endpoint(&"/product/verify/Rye bread".into(), &[]).as_str(),
            "https://bakery.example/api/product/verify/Rye%20bread"
        );
    }

    #[test]
    fn test_endpoint_single_segment_keeps_slash() {
        let gateway = gateway("http://localhost");
        let path = ApiPath::new("/shipping").segment("TRK/0001").segment("status");
        assert_eq!(path.to_string(), "/shipping/TRK/0001/status");
        assert_eq!(
            gateway.endpoint(&path, &[]).as_str(),
            "http://localhost/shipping/TRK%2F0001/status"
        );
    }

    #[test]
    fn test_endpoint_query() {
        let gateway = gateway("http://localhost");
        let url = gateway.endpoint(&"/shipping/list".into(), &[("status", "in_transit".to_string())]);
        assert_eq!(url.as_str(), "http://localhost/shipping/list?status=in_transit");
    }

    #[test]
    fn test_set_cookie_capture() {
        let gateway = gateway("http://localhost");
        gateway.apply_set_cookie(r#"access_token="Bearer abc"; HttpOnly; Path=/"#);
        let stored = gateway.cookies().get(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(bearer_token(stored.expose_secret()), Some("abc"));

        gateway.apply_set_cookie(r#"access_token=""; Max-Age=0; Path=/"#);
        assert!(gateway.cookies().get(ACCESS_TOKEN_COOKIE).is_none());
    }

    #[test]
    fn test_decode_empty_body_as_unit() {
        let value: Option<u32> = decode("  ").unwrap();
        assert_eq!(value, None);
        assert!(decode::<u32>("nope").is_err());
    }
}
