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

//! Session token authentication.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use http::header::HeaderValue;
use log::{debug, trace};
use reqwest::{Client, IntoUrl, RequestBuilder, Url};
use static_assertions::assert_impl_all;

use super::auth::AuthType;
use super::{Error, ErrorKind};

/// Header carrying the session token, in both directions.
pub const TOKEN_HEADER: &str = "DELL-EMC-TOKEN";

const LOGIN_PATH: &str = "login_session";

/// Authentication type that maintains an array session.
///
/// Credentials are only sent to the login endpoint; every other request
/// carries the session token the array handed back. The token is cached
/// until [`refresh`](AuthType::refresh) replaces it, which the client does
/// automatically when the array rejects the old one.
///
/// ```rust,no_run
/// let auth = powerstore::SessionAuth::new(
///     "https://array.local/api/rest",
///     "admin",
///     "password",
/// ).expect("Invalid endpoint URL");
/// ```
#[derive(Clone)]
pub struct SessionAuth {
    login_url: Url,
    username: String,
    password: String,
    token: Arc<RwLock<Option<HeaderValue>>>,
}

assert_impl_all!(SessionAuth: Send, Sync);

impl SessionAuth {
    /// Create a session authentication method against the given API root.
    pub fn new<U, S1, S2>(endpoint: U, username: S1, password: S2) -> Result<SessionAuth, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
    {
        let mut login_url = endpoint.into_url()?;
        // Url::join treats a path without a trailing slash as a file name.
        login_url
            .path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "endpoint URL cannot be a base"))?
            .pop_if_empty()
            .push(LOGIN_PATH);
        Ok(SessionAuth {
            login_url,
            username: username.into(),
            password: password.into(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    fn cached_token(&self) -> Option<HeaderValue> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_token(&self, value: HeaderValue) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    async fn login(&self, client: &Client) -> Result<HeaderValue, Error> {
        debug!("Logging into {}", self.login_url);
        let response = client
            .get(self.login_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| Error::from(e).with_kind(ErrorKind::AuthenticationFailed))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                Error::from_array_response(status, &body).with_kind(ErrorKind::AuthenticationFailed)
            );
        }

        let mut token = response
            .headers()
            .get(TOKEN_HEADER)
            .cloned()
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::AuthenticationFailed,
                    format!("login response carried no {} header", TOKEN_HEADER),
                )
            })?;
        token.set_sensitive(true);
        trace!("Received a new session token from {}", self.login_url);
        Ok(token)
    }
}

#[async_trait]
impl AuthType for SessionAuth {
    /// Attach the session token, logging in first if none is cached.
    async fn authenticate(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        let token = match self.cached_token() {
            Some(token) => token,
            None => {
                let token = self.login(client).await?;
                self.store_token(token.clone());
                token
            }
        };
        Ok(request.header(TOKEN_HEADER, token))
    }

    /// Discard the cached token and log in again.
    async fn refresh(&self, client: &Client) -> Result<(), Error> {
        let token = self.login(client).await?;
        self.store_token(token);
        Ok(())
    }
}

impl fmt::Debug for SessionAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAuth")
            .field("login_url", &self.login_url.as_str())
            .field("username", &self.username)
            .field("password", &"*****")
            .field("token", &self.cached_token().map(|_| "*****"))
            .finish()
    }
}
