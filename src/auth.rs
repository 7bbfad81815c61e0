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

//! Base code for authentication.

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use static_assertions::{assert_impl_all, assert_obj_safe};

use super::Error;

/// Trait for an authentication type.
///
/// An authentication type is expected to be able to:
///
/// 1. attach credentials to an outgoing request,
/// 2. refresh those credentials when the array rejects them.
///
/// An authentication type should cache its credentials as long as they are
/// valid.
#[async_trait]
pub trait AuthType: Debug + Sync + Send {
    /// Authenticate a request.
    async fn authenticate(
        &self,
        client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error>;

    /// Refresh the authentication (renew the session token, etc).
    async fn refresh(&self, client: &Client) -> Result<(), Error>;
}

assert_obj_safe!(AuthType);

/// Authentication type that provides no authentication.
///
/// Requests are passed through unchanged. Only useful against arrays in a
/// lab configuration with authentication disabled:
/// ```rust,no_run
/// # async fn example() -> Result<(), powerstore::Error> {
/// let client = powerstore::Client::new_with_auth(
///     "https://array.local/api/rest",
///     powerstore::NoAuth::new(),
///     powerstore::ClientOptions::default(),
/// ).await?;
/// # Ok(()) }
/// ```
#[derive(Clone, Debug, Default)]
pub struct NoAuth {
    _private: (),
}

assert_impl_all!(NoAuth: Send, Sync);

impl NoAuth {
    /// Create a new fake authentication method.
    #[inline]
    pub fn new() -> NoAuth {
        NoAuth { _private: () }
    }
}

#[async_trait]
impl AuthType for NoAuth {
    /// Authenticate a request.
    async fn authenticate(
        &self,
        _client: &Client,
        request: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        Ok(request)
    }

    /// This call does nothing for `NoAuth`.
    async fn refresh(&self, _client: &Client) -> Result<(), Error> {
        Ok(())
    }
}
