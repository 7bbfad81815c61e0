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

//! Asynchronous client for the PowerStore management REST API.
//!
//! The entry point is [`Client`], which logs into the array on construction
//! and maintains the session transparently, renewing it when the array
//! rejects a stale token:
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), powerstore::Error> {
//! let client = powerstore::Client::new(
//!     "https://array.local/api/rest",
//!     "admin",
//!     "password",
//!     powerstore::ClientOptions::default().with_insecure(true),
//! ).await?;
//!
//! let created = client.create_volume(&powerstore::volume::VolumeCreate {
//!     name: "data".into(),
//!     size: 8 << 30,
//!     ..Default::default()
//! }).await?;
//! println!("created {}", created.id);
//! # Ok(()) }
//! ```
//!
//! Requests are admission-controlled: at most a configured number run
//! concurrently, and waiting for a slot is bounded by a timeout that
//! surfaces as [`ErrorKind::Throttled`]. Listing calls drain server-side
//! pagination; [`paginate`] and the `stream` feature expose the machinery
//! for custom queries.

#![crate_name = "powerstore"]
#![crate_type = "lib"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
#![deny(
    dead_code,
    improper_ctypes,
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true
)]

mod auth;
mod client;
mod config;
mod error;
mod limiter;
mod login;
mod pagination;
mod query;
mod request;
mod types;

pub mod appliance;
pub mod host;
pub mod metrics;
pub mod nas;
pub mod replication;
pub mod snapshot;
pub mod volume;

pub use crate::auth::{AuthType, NoAuth};
pub use crate::client::{check, AuthenticatedClient, Client};
pub use crate::config::{
    ClientOptions, DEFAULT_RATE_LIMIT, DEFAULT_TIMEOUT, DEFAULT_TRACE_HEADER,
};
pub use crate::error::{codes, Error, ErrorKind, Severity};
pub use crate::limiter::{AdmissionTicket, RequestLimiter};
pub use crate::login::{SessionAuth, TOKEN_HEADER};
#[cfg(feature = "stream")]
pub use crate::pagination::paginated;
pub use crate::pagination::{paginate, ResponseMetadata, DEFAULT_PAGE_LIMIT};
pub use crate::query::{QueryParams, Queryable};
pub use crate::request::{MetadataHeaders, Request};
pub use crate::types::{CreateResponse, EmptyResponse};
