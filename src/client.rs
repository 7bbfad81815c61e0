// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Low-level authenticated client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE};
use log::{debug, trace};
use reqwest::{IntoUrl, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use static_assertions::assert_impl_all;

use super::auth::AuthType;
use super::config::ClientOptions;
use super::limiter::RequestLimiter;
use super::login::{SessionAuth, TOKEN_HEADER};
use super::pagination::ResponseMetadata;
use super::request::Request;
use super::{Error, ErrorKind};

const MASK: &str = "*****";

static TRACE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_trace_id() -> String {
    let seq = TRACE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", Utc::now().timestamp_millis(), seq)
}

fn mask_header_value(name: &HeaderName, value: &HeaderValue) -> String {
    if name == AUTHORIZATION || name.as_str().eq_ignore_ascii_case(TOKEN_HEADER) {
        return MASK.into();
    }
    let text = match value.to_str() {
        Ok(text) => text,
        Err(..) => return "<binary>".into(),
    };
    if name == COOKIE || name == SET_COOKIE {
        // Mask the cookie value but keep attributes like Path=/.
        let (pair, attributes) = text.split_once(';').unwrap_or((text, ""));
        let key = pair.split_once('=').map(|(k, _)| k).unwrap_or(pair);
        if attributes.is_empty() {
            format!("{}={}", key, MASK)
        } else {
            format!("{}={};{}", key, MASK, attributes)
        }
    } else {
        text.into()
    }
}

fn format_headers(headers: &HeaderMap) -> String {
    let mut result = String::new();
    for (name, value) in headers {
        if !result.is_empty() {
            result.push_str(", ");
        }
        result.push_str(name.as_str());
        result.push_str(": ");
        result.push_str(&mask_header_value(name, value));
    }
    result
}

/// Check an array response for errors.
///
/// A client or server error status consumes the body and turns it into an
/// [`Error`] through the array error payload normalizer.
pub async fn check(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        trace!("HTTP request returned {}; error: {:?}", status, body);
        Err(Error::from_array_response(status, &body))
    } else {
        trace!(
            "HTTP request to {} returned {}",
            response.url(),
            response.status()
        );
        Ok(response)
    }
}

/// Authenticated HTTP client.
///
/// Executes [`Request`] descriptors against one API root. Uses `Arc`
/// internally and should be reused when possible by cloning it; clones share
/// the authentication state, the custom headers and the admission budget.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: reqwest::Client,
    base: Url,
    auth: Arc<dyn AuthType>,
    custom_headers: Arc<RwLock<HeaderMap>>,
    limiter: RequestLimiter,
    trace_header: HeaderName,
    verbose: bool,
}

assert_impl_all!(AuthenticatedClient: Send, Sync);

impl AuthenticatedClient {
    /// Create a new authenticated client against the given API root.
    ///
    /// Refreshes the authentication eagerly, so a client that constructed
    /// successfully is known to hold valid credentials.
    pub async fn new<U: IntoUrl, Auth: AuthType + 'static>(
        endpoint: U,
        auth_type: Auth,
        options: &ClientOptions,
    ) -> Result<AuthenticatedClient, Error> {
        let base = endpoint.into_url()?;
        let trace_header = HeaderName::from_bytes(options.trace_header.as_bytes())
            .map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.insecure)
            .build()?;
        auth_type.refresh(&client).await?;
        Ok(AuthenticatedClient {
            client,
            base,
            auth: Arc::new(auth_type),
            custom_headers: Arc::new(RwLock::new(HeaderMap::new())),
            limiter: RequestLimiter::new(options.rate_limit, options.admission_timeout)?,
            trace_header,
            verbose: options.verbose,
        })
    }

    /// Get a reference to the authentication type in use.
    #[inline]
    pub fn auth_type(&self) -> &dyn AuthType {
        self.auth.as_ref()
    }

    /// Get a reference to the inner (non-authenticated) client.
    #[inline]
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Update the authentication.
    ///
    /// # Warning
    ///
    /// Authentication will also be updated for clones of this client, since
    /// they share the same authentication object.
    #[inline]
    pub async fn refresh(&self) -> Result<(), Error> {
        self.auth.refresh(&self.client).await
    }

    /// Set a header on every subsequent request, until cleared.
    pub fn insert_header<V>(&self, name: HeaderName, value: V) -> Result<(), Error>
    where
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let value = HeaderValue::try_from(value)
            .map_err(|e| Error::new(ErrorKind::InvalidInput, e.into().to_string()))?;
        let _ = self
            .custom_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value);
        Ok(())
    }

    /// Remove all headers set through [`insert_header`](Self::insert_header).
    pub fn clear_headers(&self) {
        self.custom_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn build_url(&self, request: &Request) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "endpoint URL cannot be a base"))?
            .pop_if_empty()
            .extend(request.path_segments());
        if !request.query.is_empty() {
            url.set_query(Some(&request.query.encode()));
        }
        Ok(url)
    }

    fn prepare(&self, request: &Request) -> Result<RequestBuilder, Error> {
        let url = self.build_url(request)?;
        let mut headers = self
            .custom_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for (name, value) in &request.headers {
            let _ = headers.insert(name, value.clone());
        }
        if !headers.contains_key(&self.trace_header) {
            if let Ok(trace_id) = HeaderValue::from_str(&next_trace_id()) {
                let _ = headers.insert(self.trace_header.clone(), trace_id);
            }
        }
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder)
    }

    async fn issue(&self, request: &Request) -> Result<Response, Error> {
        let builder = self.prepare(request)?;
        let req = self
            .auth
            .authenticate(&self.client, builder)
            .await?
            .build()?;
        if self.verbose {
            debug!(
                "Sending {} {} ({})",
                req.method(),
                req.url(),
                format_headers(req.headers())
            );
        } else {
            trace!("Sending {} {}", req.method(), req.url());
        }
        let response = self.client.execute(req).await.map_err(Error::from)?;
        if self.verbose {
            debug!(
                "Received {} ({})",
                response.status(),
                format_headers(response.headers())
            );
        }
        Ok(response)
    }

    /// Execute a request, returning the raw response.
    ///
    /// Waits for an admission slot first. A 401 or 403 response triggers one
    /// authentication refresh followed by exactly one re-issue of the
    /// request; the outcome of the re-issue is final. A failed refresh
    /// propagates without re-issuing.
    pub async fn send(&self, request: Request) -> Result<Response, Error> {
        let _ticket = self.limiter.acquire().await?;
        let mut response = self.issue(&request).await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            debug!(
                "Request to {} rejected with {}, renewing the session",
                response.url(),
                response.status()
            );
            self.auth.refresh(&self.client).await?;
            response = self.issue(&request).await?;
        }
        check(response).await
    }

    /// Execute a request and JSON-decode the response body.
    ///
    /// An empty 2xx body is not an error; it decodes to the default value.
    pub async fn execute<R>(&self, request: Request) -> Result<R, Error>
    where
        R: DeserializeOwned + Default,
    {
        self.execute_with_metadata(request)
            .await
            .map(|(value, _)| value)
    }

    /// Execute a request, returning the decoded body and the pagination
    /// metadata of the response.
    ///
    /// Metadata is only available on success; an error response carries no
    /// `Content-Range` worth reporting, and error paths return the [`Error`]
    /// alone.
    pub async fn execute_with_metadata<R>(
        &self,
        request: Request,
    ) -> Result<(R, ResponseMetadata), Error>
    where
        R: DeserializeOwned + Default,
    {
        let response = self.send(request).await?;
        let metadata = ResponseMetadata::from_headers(response.headers());
        let body = response.bytes().await.map_err(Error::from)?;
        let value = if body.is_empty() {
            R::default()
        } else {
            serde_json::from_slice(&body)
                .map_err(|e| Error::new(ErrorKind::InvalidResponse, e.to_string()))?
        };
        Ok((value, metadata))
    }
}

/// A client for one array.
///
/// A thin wrapper around [`AuthenticatedClient`] carrying the per-resource
/// API (see the `volume`, `host`, `nas` etc. methods). Cheap to clone.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), powerstore::Error> {
/// let client = powerstore::Client::new(
///     "https://array.local/api/rest",
///     "admin",
///     "password",
///     powerstore::ClientOptions::default(),
/// ).await?;
/// for volume in client.volumes().await? {
///     println!("{}: {}", volume.id, volume.name);
/// }
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    inner: AuthenticatedClient,
}

impl Client {
    /// Create a client with session authentication.
    ///
    /// Logs in immediately; an invalid endpoint or rejected credentials
    /// surface here rather than on the first call.
    pub async fn new<U, S1, S2>(
        endpoint: U,
        username: S1,
        password: S2,
        options: ClientOptions,
    ) -> Result<Client, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
    {
        let base = endpoint.into_url()?;
        let auth = SessionAuth::new(base.clone(), username, password)?;
        Client::new_with_auth(base, auth, options).await
    }

    /// Create a client with a custom authentication type.
    pub async fn new_with_auth<U: IntoUrl, Auth: AuthType + 'static>(
        endpoint: U,
        auth_type: Auth,
        options: ClientOptions,
    ) -> Result<Client, Error> {
        Ok(Client {
            inner: AuthenticatedClient::new(endpoint, auth_type, &options).await?,
        })
    }

    /// Get a reference to the underlying authenticated client.
    #[inline]
    pub fn authenticated(&self) -> &AuthenticatedClient {
        &self.inner
    }

    /// Update the authentication shared by all clones of this client.
    #[inline]
    pub async fn refresh(&self) -> Result<(), Error> {
        self.inner.refresh().await
    }

    /// Set a header on every subsequent request, until cleared.
    #[inline]
    pub fn insert_header<V>(&self, name: HeaderName, value: V) -> Result<(), Error>
    where
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.inner.insert_header(name, value)
    }

    /// Remove all headers set through [`insert_header`](Self::insert_header).
    #[inline]
    pub fn clear_headers(&self) {
        self.inner.clear_headers()
    }

    pub(crate) async fn execute<R>(&self, request: Request) -> Result<R, Error>
    where
        R: DeserializeOwned + Default,
    {
        self.inner.execute(request).await
    }

    pub(crate) async fn execute_with_metadata<R>(
        &self,
        request: Request,
    ) -> Result<(R, ResponseMetadata), Error>
    where
        R: DeserializeOwned + Default,
    {
        self.inner.execute_with_metadata(request).await
    }
}
