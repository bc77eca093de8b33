use serde_json::Value;
use thiserror::Error;

/// Maximum length for raw (non-JSON) error bodies kept on an error
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Message for failures where no response was received at all
const NETWORK_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection.";

/// Message for requests that exceeded their timeout
const TIMEOUT_MESSAGE: &str = "The server took too long to respond. Please try again.";

/// Fallback message when neither the payload nor the status table has one
const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// What went wrong, independent of the backend payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response received (connect failure, timeout, aborted body)
    Network,
    /// 400 with field-level messages
    Validation,
    /// 401 that survived the refresh attempt
    Authentication,
    /// 403
    Authorization,
    /// 404
    NotFound,
    /// 429
    RateLimit,
    /// 5xx
    Server,
    /// Any other 4xx
    Client,
    /// 2xx whose body did not decode into the expected type
    InvalidResponse,
    /// Request could not be built
    Request,
}

/// Status-keyed defaults: (status, kind, code, message).
const STATUS_TABLE: &[(u16, ErrorKind, &str, &str)] = &[
    (
        400,
        ErrorKind::Validation,
        "INVALID_INPUT",
        "Please check your input and try again.",
    ),
    (
        401,
        ErrorKind::Authentication,
        "UNAUTHORIZED",
        "Please log in to continue.",
    ),
    (
        403,
        ErrorKind::Authorization,
        "FORBIDDEN",
        "You don't have permission to perform this action.",
    ),
    (
        404,
        ErrorKind::NotFound,
        "NOT_FOUND",
        "The requested resource was not found.",
    ),
    (
        429,
        ErrorKind::RateLimit,
        "RATE_LIMIT",
        "Too many requests. Please try again later.",
    ),
];

const SERVER_ERROR: (ErrorKind, &str, &str) = (
    ErrorKind::Server,
    "SERVER_ERROR",
    "Server error. Please try again later.",
);

const OTHER_HTTP_ERROR: (ErrorKind, &str, &str) =
    (ErrorKind::Client, "HTTP_ERROR", UNEXPECTED_MESSAGE);

/// Payload keys that carry a ready-made message, in order of preference.
const MESSAGE_KEYS: &[&str] = &["detail", "message", "error"];

/// The single error shape every failing API call returns.
///
/// `status` is the HTTP status, or 0 when no response was received. `data`
/// holds whatever the backend sent (parsed JSON, or the raw text as a JSON
/// string) so callers can highlight individual form fields.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: u16,
    pub data: Value,
    pub code: &'static str,
}

impl ApiError {
    /// Build an error from a non-2xx response.
    pub fn from_response(status: u16, data: Value) -> Self {
        let (kind, code, default_message) = status_defaults(status);
        let message = extract_message(&data).unwrap_or_else(|| default_message.to_string());
        Self {
            kind,
            message,
            status,
            data,
            code,
        }
    }

    /// Build an error from a raw response body, keeping JSON when it parses.
    pub fn from_body(status: u16, body: &str) -> Self {
        Self::from_response(status, parse_body(body))
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: NETWORK_MESSAGE.to_string(),
            status: 0,
            data: Value::String(detail.into()),
            code: "NETWORK_ERROR",
        }
    }

    pub fn timeout() -> Self {
        Self {
            kind: ErrorKind::Network,
            message: TIMEOUT_MESSAGE.to_string(),
            status: 0,
            data: Value::Null,
            code: "TIMEOUT",
        }
    }

    pub fn invalid_response(status: u16, detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidResponse,
            message: "The server sent a response that could not be read.".to_string(),
            status,
            data: Value::String(detail.into()),
            code: "INVALID_RESPONSE",
        }
    }

    pub fn request(detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Request,
            message: "The request could not be prepared.".to_string(),
            status: 0,
            data: Value::String(detail.into()),
            code: "REQUEST_ERROR",
        }
    }

    /// Terminal authentication failure, keeping the backend payload if any.
    pub fn authentication_lost(body: &str) -> Self {
        Self::from_response(401, parse_body(body))
    }

    /// Map a transport error from reqwest. Only failures without an HTTP
    /// response end up here.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout()
        } else if err.is_builder() {
            Self::request(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }

    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    pub fn is_authentication(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }

    /// Field-level messages from a validation payload, in backend order.
    pub fn field_errors(&self) -> Vec<(String, Vec<String>)> {
        let Value::Object(map) = &self.data else {
            return Vec::new();
        };
        map.iter()
            .filter(|(key, _)| !MESSAGE_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| {
                let messages = messages_of(value);
                (!messages.is_empty()).then(|| (key.clone(), messages))
            })
            .collect()
    }
}

fn status_defaults(status: u16) -> (ErrorKind, &'static str, &'static str) {
    if let Some((_, kind, code, message)) = STATUS_TABLE.iter().find(|(s, ..)| *s == status) {
        return (*kind, *code, *message);
    }
    if (500..=599).contains(&status) {
        SERVER_ERROR
    } else {
        OTHER_HTTP_ERROR
    }
}

/// Pick the user-facing message out of a backend payload.
///
/// An explicit `detail`/`message`/`error` string wins; otherwise the first
/// message of the first field in a validation payload.
pub fn extract_message(data: &Value) -> Option<String> {
    match data {
        Value::Object(map) => {
            for key in MESSAGE_KEYS {
                if let Some(Value::String(message)) = map.get(*key) {
                    if !message.trim().is_empty() {
                        return Some(message.clone());
                    }
                }
            }
            map.values().find_map(|value| messages_of(value).into_iter().next())
        }
        Value::Array(items) => items.iter().find_map(|item| match item {
            Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
            _ => None,
        }),
        _ => None,
    }
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(message) if !message.trim().is_empty() => vec![message.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|message| !message.trim().is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse an error body: JSON if possible, otherwise the (truncated) text.
fn parse_body(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(truncate_body(trimmed)))
}

/// Truncate a response body to avoid keeping excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
