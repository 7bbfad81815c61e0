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

//! Request descriptors consumed by the executor.

use http::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;

use super::query::QueryParams;
use super::{Error, ErrorKind};

/// Request bodies that contribute extra headers.
///
/// Some create payloads carry caller metadata that the array expects in
/// headers rather than in the JSON body. The executor merges these headers
/// into the request without clobbering headers that are already set.
pub trait MetadataHeaders {
    /// Headers derived from this body.
    fn metadata_headers(&self) -> HeaderMap;
}

/// A single API call, before authentication and execution.
///
/// Addresses a resource as `{resource}[/{id}][/{action}]` relative to the
/// API root:
///
/// ```rust
/// use powerstore::{QueryParams, Request};
///
/// let request = Request::post("volume")
///     .id("vol-1")
///     .action("clone")
///     .query(QueryParams::default().is_async(true));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) resource: String,
    pub(crate) id: Option<String>,
    pub(crate) action: Option<String>,
    pub(crate) query: QueryParams,
    pub(crate) body: Option<serde_json::Value>,
    pub(crate) headers: HeaderMap,
}

impl Request {
    /// Start a request against a resource collection.
    pub fn new<S: Into<String>>(method: Method, resource: S) -> Request {
        Request {
            method,
            resource: resource.into(),
            id: None,
            action: None,
            query: QueryParams::default(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Start a GET request.
    #[inline]
    pub fn get<S: Into<String>>(resource: S) -> Request {
        Request::new(Method::GET, resource)
    }

    /// Start a POST request.
    #[inline]
    pub fn post<S: Into<String>>(resource: S) -> Request {
        Request::new(Method::POST, resource)
    }

    /// Start a PATCH request.
    #[inline]
    pub fn patch<S: Into<String>>(resource: S) -> Request {
        Request::new(Method::PATCH, resource)
    }

    /// Start a DELETE request.
    #[inline]
    pub fn delete<S: Into<String>>(resource: S) -> Request {
        Request::new(Method::DELETE, resource)
    }

    /// Address one instance of the resource.
    pub fn id<S: Into<String>>(mut self, id: S) -> Request {
        self.id = Some(id.into());
        self
    }

    /// Invoke an action on the addressed resource.
    pub fn action<S: Into<String>>(mut self, action: S) -> Request {
        self.action = Some(action.into());
        self
    }

    /// Set the query parameters.
    pub fn query(mut self, query: QueryParams) -> Request {
        self.query = query;
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Request, Error> {
        self.body = Some(
            serde_json::to_value(body)
                .map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))?,
        );
        Ok(self)
    }

    /// Attach a JSON body that also contributes metadata headers.
    pub fn json_with_metadata<T>(mut self, body: &T) -> Result<Request, Error>
    where
        T: Serialize + MetadataHeaders,
    {
        for (name, value) in body.metadata_headers() {
            if let Some(name) = name {
                self.headers.entry(name).or_insert(value);
            }
        }
        self.json(body)
    }

    /// Path of this request relative to the API root.
    pub(crate) fn path_segments(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.resource.as_str())
            .chain(self.id.as_deref())
            .chain(self.action.as_deref())
    }
}
