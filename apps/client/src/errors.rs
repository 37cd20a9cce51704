use thiserror::Error;

/// Authentication failure kinds reported by the API in the error envelope's
/// `code` field. Every kind forces the session back to `Unauthenticated`;
/// the kind itself is surfaced so the UI can differentiate its messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    TokenExpired,
    TokenInvalid,
    TokenNotActive,
    NoToken,
    AuthFailed,
}

impl AuthErrorKind {
    /// Maps a wire `code` to a kind. Unknown or absent codes on an auth
    /// endpoint collapse into the generic `AuthFailed`.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("TOKEN_EXPIRED") => AuthErrorKind::TokenExpired,
            Some("TOKEN_INVALID") => AuthErrorKind::TokenInvalid,
            Some("TOKEN_NOT_ACTIVE") => AuthErrorKind::TokenNotActive,
            Some("NO_TOKEN") => AuthErrorKind::NoToken,
            _ => AuthErrorKind::AuthFailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorKind::TokenExpired => "TOKEN_EXPIRED",
            AuthErrorKind::TokenInvalid => "TOKEN_INVALID",
            AuthErrorKind::TokenNotActive => "TOKEN_NOT_ACTIVE",
            AuthErrorKind::NoToken => "NO_TOKEN",
            AuthErrorKind::AuthFailed => "AUTH_FAILED",
        }
    }
}

/// Client-core error taxonomy.
///
/// Per-candidate transport failures (timeout, unreachable host, malformed
/// response) never escape a single logical call: the executor carries them
/// as causes and emits one `ServiceUnavailable` once every candidate
/// origin has been exhausted.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Every candidate origin failed; carries the last underlying cause.
    #[error("service unavailable: {last}")]
    ServiceUnavailable { last: String },

    /// Authentication rejected; always ends the session.
    #[error("authentication failed: {}", .0.as_str())]
    Auth(AuthErrorKind),

    /// 4xx with a server-provided message; surfaced verbatim, never retried.
    #[error("{0}")]
    Validation(String),

    /// 409 on an idempotent endpoint. The domain client decides whether this
    /// converges (save) or is a genuine business error (apply).
    #[error("conflict: {0}")]
    Conflict(String),

    /// 5xx beyond the location fallback already performed.
    #[error("server error (status {0})")]
    Server(u16),

    /// A response body that did not match the expected schema. Payloads are
    /// validated at the boundary; nothing loosely-typed reaches the cache.
    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// True when the server reported an idempotent-endpoint conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
