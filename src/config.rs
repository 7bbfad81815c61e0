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

//! Client configuration.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default number of concurrent in-flight requests.
pub const DEFAULT_RATE_LIMIT: usize = 1000;

/// Default name of the request tracing header.
pub const DEFAULT_TRACE_HEADER: &str = "DELL-EMC-TRACE-ID";

/// Already-resolved client configuration.
///
/// Plain values with chainable setters; nothing here reads the environment.
/// How the values get populated (flags, files, environment) is the caller's
/// business.
///
/// ```rust
/// use std::time::Duration;
///
/// let options = powerstore::ClientOptions::default()
///     .with_timeout(Duration::from_secs(30))
///     .with_rate_limit(16)
///     .with_insecure(true);
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub(crate) timeout: Duration,
    pub(crate) rate_limit: usize,
    pub(crate) admission_timeout: Duration,
    pub(crate) insecure: bool,
    pub(crate) trace_header: String,
    pub(crate) verbose: bool,
}

impl Default for ClientOptions {
    fn default() -> ClientOptions {
        ClientOptions {
            timeout: DEFAULT_TIMEOUT,
            rate_limit: DEFAULT_RATE_LIMIT,
            admission_timeout: DEFAULT_TIMEOUT,
            insecure: false,
            trace_header: DEFAULT_TRACE_HEADER.into(),
            verbose: false,
        }
    }
}

impl ClientOptions {
    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> ClientOptions {
        self.timeout = timeout;
        self
    }

    /// Set the number of requests allowed in flight at once.
    ///
    /// Must be positive; the client constructor rejects zero.
    pub fn with_rate_limit(mut self, rate_limit: usize) -> ClientOptions {
        self.rate_limit = rate_limit;
        self
    }

    /// Set how long a request may wait for an in-flight slot.
    pub fn with_admission_timeout(mut self, timeout: Duration) -> ClientOptions {
        self.admission_timeout = timeout;
        self
    }

    /// Skip TLS certificate verification.
    ///
    /// Arrays commonly ship with self-signed certificates.
    pub fn with_insecure(mut self, insecure: bool) -> ClientOptions {
        self.insecure = insecure;
        self
    }

    /// Set the name of the header carrying the per-request trace ID.
    pub fn with_trace_header<S: Into<String>>(mut self, name: S) -> ClientOptions {
        self.trace_header = name.into();
        self
    }

    /// Dump requests and responses at `debug!` level.
    ///
    /// Secret header values are masked in the dumps.
    pub fn with_verbose(mut self, verbose: bool) -> ClientOptions {
        self.verbose = verbose;
        self
    }
}
