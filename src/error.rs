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

//! Error and error kinds.

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;

/// Array error codes that several classification predicates match on.
///
/// The array reports a hexadecimal functional code with most structured
/// error payloads. Conditions that share an HTTP status are told apart by
/// these codes, never by message text, with two documented exceptions (see
/// [`Error::is_volume_attached_to_host`] and
/// [`Error::is_unable_to_failover_from_destination`]).
pub mod codes {
    /// The requested name is already taken by another resource of the kind.
    pub const NAME_ALREADY_IN_USE: &str = "0xE04040030001";
    /// The volume is already mapped to the host.
    pub const HOST_ALREADY_MAPPED: &str = "0xE0A020010004";
    /// The host has no mapping for the volume.
    pub const HOST_NOT_MAPPED: &str = "0xE0A020010005";
    /// A replication session already exists for the resource.
    pub const REPLICATION_SESSION_EXISTS: &str = "0xE02020010002";
    /// The maximum number of REST sessions has been reached.
    pub const SESSION_LIMIT_REACHED: &str = "0xE08010080009";
}

/// Kind of an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The input provided by the caller is invalid.
    InvalidInput,

    /// The admission gate timed out before a request slot became free.
    ///
    /// This is local self-throttling, not an array failure.
    Throttled,

    /// The login call itself failed; a session could not be established.
    AuthenticationFailed,

    /// The array rejected the credentials or the session token (HTTP 401/403).
    ///
    /// Surfaced only when the single re-login-and-retry cycle did not help.
    AccessDenied,

    /// The requested resource does not exist (HTTP 404).
    ResourceNotFound,

    /// The request conflicts with the current state of a resource (HTTP 409).
    Conflict,

    /// The requested result offset is past the end of the collection (HTTP 416).
    ///
    /// Usually a benign race against concurrent deletions; the pagination
    /// driver absorbs this kind during continuation.
    BadRange,

    /// The array understood the request but refused to process it (HTTP 422).
    UnprocessableEntity,

    /// Any other client-side HTTP error (4xx).
    OperationFailed,

    /// An internal array failure (HTTP 5xx).
    ServerError,

    /// A network-level failure: DNS, connect, timeout or TLS.
    ///
    /// Never classified further and never retried by this crate.
    Transport,

    /// The response body does not match the expected shape.
    InvalidResponse,
}

impl ErrorKind {
    /// Short description of the kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Throttled => "too many concurrent requests",
            ErrorKind::AuthenticationFailed => "login failed",
            ErrorKind::AccessDenied => "access denied",
            ErrorKind::ResourceNotFound => "resource not found",
            ErrorKind::Conflict => "conflicting resource state",
            ErrorKind::BadRange => "requested range cannot be satisfied",
            ErrorKind::UnprocessableEntity => "request cannot be processed",
            ErrorKind::OperationFailed => "operation failed",
            ErrorKind::ServerError => "internal array error",
            ErrorKind::Transport => "transport failure",
            ErrorKind::InvalidResponse => "invalid response",
        }
    }
}

impl From<StatusCode> for ErrorKind {
    fn from(value: StatusCode) -> ErrorKind {
        match value {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::AccessDenied,
            StatusCode::NOT_FOUND => ErrorKind::ResourceNotFound,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            StatusCode::RANGE_NOT_SATISFIABLE => ErrorKind::BadRange,
            StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::UnprocessableEntity,
            c if c.is_server_error() => ErrorKind::ServerError,
            _ => ErrorKind::OperationFailed,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Severity reported by the array with a structured error payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Informational message.
    Info,
    /// Something worth attention but not an error yet.
    Warning,
    /// A failed operation.
    Error,
    /// A failure that requires service intervention.
    Critical,
}

impl Default for Severity {
    fn default() -> Severity {
        Severity::Error
    }
}

impl<T> From<T> for Severity
where
    T: Into<String>,
{
    fn from(value: T) -> Severity {
        match value.into().to_uppercase().as_ref() {
            "INFO" => Severity::Info,
            "WARNING" => Severity::Warning,
            "CRITICAL" => Severity::Critical,
            // The array only documents the four values; treat anything
            // unexpected as a plain error.
            _ => Severity::Error,
        }
    }
}

impl<'de> serde::Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Severity, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value: String = Deserialize::deserialize(deserializer)?;
        Ok(value.into())
    }
}

/// An error from this crate.
///
/// Errors from the array carry the HTTP status code, the array's functional
/// error code and the human-readable message from the structured payload.
/// Classification is exposed through predicate methods, e.g.
/// [`is_not_found`](Error::is_not_found); callers are expected to branch on
/// these rather than on message text.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
    code: Option<String>,
    severity: Severity,
    arguments: Vec<String>,
}

/// One message of the array's structured error payload.
#[derive(Debug, Deserialize)]
struct ArrayMessage {
    code: Option<String>,
    #[serde(default)]
    severity: Severity,
    message_l10n: Option<String>,
    #[serde(default)]
    arguments: Vec<String>,
}

/// The array's structured error payload.
#[derive(Debug, Deserialize)]
struct ArrayErrorResponse {
    messages: Vec<ArrayMessage>,
}

impl Error {
    /// Create a new error of the given kind.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            message: message.into(),
            status: None,
            code: None,
            severity: Severity::Error,
            arguments: Vec::new(),
        }
    }

    /// Normalize a non-2xx array response into an `Error`.
    ///
    /// The body is decoded as the array's structured error JSON. A malformed
    /// or plain-text body silently degrades to a textual error built from the
    /// raw content and the status code; this fallback never fails.
    pub(crate) fn from_array_response(status: StatusCode, body: &str) -> Error {
        let mut result = match serde_json::from_str::<ArrayErrorResponse>(body) {
            Ok(parsed) => match parsed.messages.into_iter().next() {
                Some(msg) => Error {
                    kind: status.into(),
                    message: msg
                        .message_l10n
                        .unwrap_or_else(|| ErrorKind::from(status).description().into()),
                    status: None,
                    code: msg.code,
                    severity: msg.severity,
                    arguments: msg.arguments,
                },
                None => Error::new(status.into(), ErrorKind::from(status).description()),
            },
            Err(..) => {
                let text = body.trim();
                let message = if text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown failure")
                } else {
                    text
                };
                Error::new(status.into(), message)
            }
        };
        result.status = Some(status);
        result
    }

    pub(crate) fn with_kind(mut self, kind: ErrorKind) -> Error {
        self.kind = kind;
        self
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status code, if the error came from an array response.
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The array's functional error code, if one was reported.
    #[inline]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Severity reported by the array.
    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Arguments of the array error message, if any were reported.
    #[inline]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }

    /// Whether the error is the admission gate timing out.
    #[inline]
    pub fn is_throttled(&self) -> bool {
        self.kind == ErrorKind::Throttled
    }

    /// Whether the array rejected the credentials or the session token.
    #[inline]
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::AccessDenied | ErrorKind::AuthenticationFailed
        )
    }

    /// Whether the requested resource does not exist.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::ResourceNotFound
    }

    /// Whether the requested offset is past the end of the collection.
    #[inline]
    pub fn is_bad_range(&self) -> bool {
        self.kind == ErrorKind::BadRange
    }

    /// Whether the requested name is already taken by a resource of the kind.
    #[inline]
    pub fn is_name_already_in_use(&self) -> bool {
        self.kind == ErrorKind::UnprocessableEntity && self.has_code(codes::NAME_ALREADY_IN_USE)
    }

    /// Whether the volume is already mapped to the host.
    #[inline]
    pub fn is_host_already_mapped(&self) -> bool {
        self.kind == ErrorKind::UnprocessableEntity && self.has_code(codes::HOST_ALREADY_MAPPED)
    }

    /// Whether the host has no mapping for the volume.
    #[inline]
    pub fn is_host_not_mapped(&self) -> bool {
        self.kind == ErrorKind::UnprocessableEntity && self.has_code(codes::HOST_NOT_MAPPED)
    }

    /// Whether a replication session already exists for the resource.
    #[inline]
    pub fn is_replication_session_exists(&self) -> bool {
        self.kind == ErrorKind::UnprocessableEntity
            && self.has_code(codes::REPLICATION_SESSION_EXISTS)
    }

    /// Whether the maximum number of REST sessions has been reached.
    #[inline]
    pub fn is_session_limit_reached(&self) -> bool {
        self.kind == ErrorKind::UnprocessableEntity && self.has_code(codes::SESSION_LIMIT_REACHED)
    }

    /// Whether a volume cannot be deleted because it is attached to a host.
    ///
    /// The array reports no distinct functional code for this condition, so
    /// this predicate matches on the message text. Do not copy this approach
    /// for new predicates.
    #[inline]
    pub fn is_volume_attached_to_host(&self) -> bool {
        self.kind == ErrorKind::UnprocessableEntity && self.message.contains("attached to host")
    }

    /// Whether a failover was requested on the destination end of a session.
    ///
    /// Like [`is_volume_attached_to_host`](Error::is_volume_attached_to_host),
    /// this condition has no functional code and matches on the message text.
    #[inline]
    pub fn is_unable_to_failover_from_destination(&self) -> bool {
        self.kind == ErrorKind::UnprocessableEntity
            && self.message.contains("failover is not allowed from destination")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.status, self.code.as_deref()) {
            (Some(status), Some(code)) => {
                write!(f, "{} (HTTP {}, code {})", self.message, status, code)
            }
            (Some(status), None) => write!(f, "{} (HTTP {})", self.message, status),
            _ => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let kind = if value.is_decode() {
            ErrorKind::InvalidResponse
        } else {
            ErrorKind::Transport
        };
        Error::new(kind, value.to_string())
    }
}

#[cfg(test)]
mod test {
    use reqwest::StatusCode;

    use super::{codes, Error, ErrorKind, Severity};

    const NAME_IN_USE_BODY: &str = r#"{
        "messages": [{
            "code": "0xE04040030001",
            "severity": "Error",
            "message_l10n": "Volume name vol-1 is already in use.",
            "arguments": ["vol-1"]
        }]
    }"#;

    #[test]
    fn test_structured_classification() {
        let err = Error::from_array_response(StatusCode::UNPROCESSABLE_ENTITY, NAME_IN_USE_BODY);
        assert_eq!(err.kind(), ErrorKind::UnprocessableEntity);
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert_eq!(err.code(), Some(codes::NAME_ALREADY_IN_USE));
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(err.arguments(), &["vol-1".to_string()]);
        assert!(err.is_name_already_in_use());
        assert!(!err.is_not_found());
        assert!(!err.is_bad_range());
        assert!(!err.is_replication_session_exists());
    }

    #[test]
    fn test_plain_text_fallback() {
        let err =
            Error::from_array_response(StatusCode::BAD_GATEWAY, "<html><body>boom</body></html>");
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(err.code(), None);
        assert_eq!(err.severity(), Severity::Error);
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_empty_body_fallback() {
        let err = Error::from_array_response(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_bad_range() {
        let err = Error::from_array_response(
            StatusCode::RANGE_NOT_SATISFIABLE,
            r#"{"messages": [{"severity": "Info", "message_l10n": "The range is invalid."}]}"#,
        );
        assert!(err.is_bad_range());
        assert_eq!(err.severity(), Severity::Info);
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_message_text_exceptions() {
        let attached = Error::from_array_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"messages": [{"message_l10n": "Volume vol-1 is attached to host h-1."}]}"#,
        );
        assert!(attached.is_volume_attached_to_host());
        assert!(!attached.is_name_already_in_use());

        let failover = Error::from_array_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"messages": [{"message_l10n": "A failover is not allowed from destination."}]}"#,
        );
        assert!(failover.is_unable_to_failover_from_destination());
        assert!(!failover.is_volume_attached_to_host());
    }

    #[test]
    fn test_unknown_severity_defaults_to_error() {
        let err = Error::from_array_response(
            StatusCode::CONFLICT,
            r#"{"messages": [{"severity": "Catastrophic", "message_l10n": "nope"}]}"#,
        );
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_throttled_is_distinct() {
        let err = Error::new(ErrorKind::Throttled, "no request slot available");
        assert!(err.is_throttled());
        assert_eq!(err.status(), None);
        assert!(!err.is_access_denied());
    }
}
