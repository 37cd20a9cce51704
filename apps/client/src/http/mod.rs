//! Request Executor — the single point of entry for all Remote API calls.
//!
//! ARCHITECTURAL RULE: no other module may touch the network directly.
//! Every domain client goes through `Executor::execute`.
//!
//! One logical call fans out across an ordered list of candidate origins:
//! each candidate gets exactly one attempt under a bounded wait window, and
//! a transport failure advances to the next candidate (fail-fast fan-out,
//! not retry-with-backoff). A completed HTTP exchange — any status — ends
//! the fan-out.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{ApiError, AuthErrorKind, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Wait-window class for one call. Standard calls get ~10s, the liveness
/// probe ~3s, payload-carrying submissions ~30s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallClass {
    Standard,
    Probe,
    Upload,
}

/// The three timeout windows, taken from `Config`.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub standard: Duration,
    pub probe: Duration,
    pub upload: Duration,
}

impl Timeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            standard: config.standard_timeout,
            probe: config.probe_timeout,
            upload: config.upload_timeout,
        }
    }

    fn for_class(&self, class: CallClass) -> Duration {
        match class {
            CallClass::Standard => self.standard,
            CallClass::Probe => self.probe,
            CallClass::Upload => self.upload,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transport seam
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WireRequest {
    pub url: String,
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// One HTTP exchange against one resolved URL. Implemented by
/// `ReqwestTransport` in production and by scripted fakes in tests; the
/// executor owns timeouts, so implementations just send.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: WireRequest) -> std::result::Result<WireResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, req: WireRequest) -> std::result::Result<WireResponse, TransportError> {
        let mut builder = match req.method {
            HttpMethod::Get => self.client.get(&req.url),
            HttpMethod::Post => self.client.post(&req.url),
            HttpMethod::Put => self.client.put(&req.url),
            HttpMethod::Delete => self.client.delete(&req.url),
        };
        if let Some(token) = &req.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(WireResponse { status, body })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared token cell
// ────────────────────────────────────────────────────────────────────────────

/// The session token, shared between the session store (writer) and every
/// executor (reader). Cloning shares the underlying cell.
#[derive(Clone, Default)]
pub struct TokenCell(Arc<RwLock<Option<String>>>);

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap().clone()
    }

    pub fn set(&self, token: String) {
        *self.0.write().unwrap() = Some(token);
    }

    pub fn clear(&self) {
        *self.0.write().unwrap() = None;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Executor
// ────────────────────────────────────────────────────────────────────────────

/// Wire error envelope: `{ message: string, code?: string }`. Unparseable
/// bodies fall back to the empty envelope.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// One executor per domain client; instances are cheap clones sharing the
/// transport and token cell, so all domains follow one policy.
#[derive(Clone)]
pub struct Executor {
    origins: Vec<String>,
    transport: Arc<dyn Transport>,
    token: TokenCell,
    timeouts: Timeouts,
}

impl Executor {
    pub fn new(
        origins: Vec<String>,
        transport: Arc<dyn Transport>,
        token: TokenCell,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            origins,
            transport,
            token,
            timeouts,
        }
    }

    /// Executes one logical call against the `/api` resource tree.
    ///
    /// Candidates are tried in order; a transport failure (timeout,
    /// unreachable, malformed 2xx body) moves to the next one, and once the
    /// last candidate fails the call rejects with `ServiceUnavailable`
    /// carrying the last cause. A completed exchange is mapped through the
    /// error taxonomy and ends the fan-out whatever the status was.
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        requires_auth: bool,
        class: CallClass,
    ) -> Result<Value> {
        let token = self.token.get();
        let bearer = if requires_auth || token.is_some() {
            token
        } else {
            None
        };
        let window = self.timeouts.for_class(class);

        let mut last_cause = String::new();

        for origin in &self.origins {
            let req = WireRequest {
                url: format!("{origin}/api{path}"),
                method,
                body: body.clone(),
                bearer: bearer.clone(),
            };
            debug!("{} {} (window {:?})", method, req.url, window);

            let outcome = tokio::time::timeout(window, self.transport.send(req)).await;

            let response = match outcome {
                Err(_) => {
                    last_cause = format!("timed out after {}s", window.as_secs());
                    warn!("{method} {origin}/api{path}: {last_cause}");
                    continue;
                }
                Ok(Err(e)) => {
                    last_cause = e.0;
                    warn!("{method} {origin}/api{path}: {last_cause}");
                    continue;
                }
                Ok(Ok(r)) => r,
            };

            if (200..300).contains(&response.status) {
                if response.body.trim().is_empty() {
                    return Ok(Value::Null);
                }
                // A 2xx with an unreadable body is a malformed response:
                // a transport failure for this candidate, not a final error.
                match serde_json::from_str(&response.body) {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        last_cause = format!("malformed response body: {e}");
                        warn!("{method} {origin}/api{path}: {last_cause}");
                        continue;
                    }
                }
            }

            return Err(Self::interpret_failure(&response));
        }

        Err(ApiError::ServiceUnavailable { last: last_cause })
    }

    /// Maps a completed non-2xx exchange onto the error taxonomy.
    fn interpret_failure(response: &WireResponse) -> ApiError {
        let envelope: ErrorEnvelope = serde_json::from_str(&response.body).unwrap_or_default();
        let message = envelope
            .message
            .unwrap_or_else(|| format!("request failed with status {}", response.status));

        match response.status {
            401 => ApiError::Auth(AuthErrorKind::from_code(envelope.code.as_deref())),
            409 => ApiError::Conflict(message),
            s if (400..500).contains(&s) => ApiError::Validation(message),
            s => ApiError::Server(s),
        }
    }

    /// Unauthenticated liveness check. Hits each candidate's `/health`
    /// (outside the `/api` tree) under the probe window and resolves with
    /// the first healthy origin.
    pub async fn probe(&self) -> Result<String> {
        let mut last_cause = String::new();

        for origin in &self.origins {
            let req = WireRequest {
                url: format!("{origin}/health"),
                method: HttpMethod::Get,
                body: None,
                bearer: None,
            };

            match tokio::time::timeout(self.timeouts.probe, self.transport.send(req)).await {
                Ok(Ok(r)) if (200..300).contains(&r.status) => return Ok(origin.clone()),
                Ok(Ok(r)) => last_cause = format!("probe returned status {}", r.status),
                Ok(Err(e)) => last_cause = e.0,
                Err(_) => {
                    last_cause = format!("probe timed out after {}s", self.timeouts.probe.as_secs())
                }
            }
        }

        Err(ApiError::ServiceUnavailable { last: last_cause })
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::testing::{FakeOutcome, FakeTransport};
    use super::*;

    fn timeouts() -> Timeouts {
        Timeouts {
            standard: Duration::from_secs(10),
            probe: Duration::from_secs(3),
            upload: Duration::from_secs(30),
        }
    }

    fn executor_with(origins: &[&str], transport: Arc<FakeTransport>) -> Executor {
        Executor::new(
            origins.iter().map(|s| s.to_string()).collect(),
            transport,
            TokenCell::new(),
            timeouts(),
        )
    }

    #[tokio::test]
    async fn test_first_healthy_candidate_wins() {
        let transport = Arc::new(FakeTransport::new());
        transport.on("http://a/api/jobs", FakeOutcome::Fail("connection refused"));
        transport.on("http://b/api/jobs", FakeOutcome::Reply(200, json!([{"id": "job_1"}])));

        let exec = executor_with(&["http://a", "http://b"], transport.clone());
        let value = exec
            .execute(HttpMethod::Get, "/jobs", None, false, CallClass::Standard)
            .await
            .unwrap();

        assert_eq!(value[0]["id"], "job_1");
        assert_eq!(
            transport.seen_urls(),
            vec!["http://a/api/jobs", "http://b/api/jobs"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_candidate_is_skipped() {
        let transport = Arc::new(FakeTransport::new());
        transport.on("http://a/api/jobs", FakeOutcome::Hang);
        transport.on("http://b/api/jobs", FakeOutcome::Reply(200, json!([])));

        let exec = executor_with(&["http://a", "http://b"], transport);
        let value = exec
            .execute(HttpMethod::Get, "/jobs", None, false, CallClass::Standard)
            .await
            .unwrap();

        assert_eq!(value, json!([]));
    }

    #[tokio::test]
    async fn test_all_candidates_down_aggregates_last_cause() {
        let transport = Arc::new(FakeTransport::new());
        transport.on("http://a/api/jobs", FakeOutcome::Fail("connection refused"));
        transport.on("http://b/api/jobs", FakeOutcome::Fail("dns lookup failed"));

        let exec = executor_with(&["http://a", "http://b"], transport);
        let err = exec
            .execute(HttpMethod::Get, "/jobs", None, false, CallClass::Standard)
            .await
            .unwrap_err();

        match err {
            ApiError::ServiceUnavailable { last } => assert_eq!(last, "dns lookup failed"),
            other => panic!("expected ServiceUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_completed_exchange_stops_the_fanout() {
        // A 500 from the first candidate is a final answer, not a reason
        // to try the fallback.
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            "http://a/api/jobs",
            FakeOutcome::Reply(500, json!({"message": "boom"})),
        );

        let exec = executor_with(&["http://a", "http://b"], transport.clone());
        let err = exec
            .execute(HttpMethod::Get, "/jobs", None, false, CallClass::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Server(500)));
        assert_eq!(transport.seen_urls().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_success_body_advances_to_fallback() {
        // Scripted fake bodies are always valid JSON, so the malformed-2xx
        // case gets its own transport.
        struct Garbage;
        #[async_trait]
        impl Transport for Garbage {
            async fn send(
                &self,
                req: WireRequest,
            ) -> std::result::Result<WireResponse, TransportError> {
                if req.url.starts_with("http://a") {
                    Ok(WireResponse {
                        status: 200,
                        body: "<html>gateway</html>".to_string(),
                    })
                } else {
                    Ok(WireResponse {
                        status: 200,
                        body: "[]".to_string(),
                    })
                }
            }
        }

        let exec = Executor::new(
            vec!["http://a".into(), "http://b".into()],
            Arc::new(Garbage),
            TokenCell::new(),
            timeouts(),
        );
        let value = exec
            .execute(HttpMethod::Get, "/jobs", None, false, CallClass::Standard)
            .await
            .unwrap();
        assert_eq!(value, json!([]));
    }

    #[tokio::test]
    async fn test_conflict_status_maps_to_conflict() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            "http://a/api/saved-jobs",
            FakeOutcome::Reply(409, json!({"message": "Job already saved"})),
        );

        let exec = executor_with(&["http://a"], transport);
        let err = exec
            .execute(
                HttpMethod::Post,
                "/saved-jobs",
                Some(json!({"jobId": "job_42"})),
                true,
                CallClass::Standard,
            )
            .await
            .unwrap_err();

        match err {
            ApiError::Conflict(message) => assert_eq!(message, "Job already saved"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_401_is_classified_by_code() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            "http://a/api/auth/me",
            FakeOutcome::Reply(401, json!({"code": "TOKEN_EXPIRED", "message": "Token expired"})),
        );

        let exec = executor_with(&["http://a"], transport);
        let err = exec
            .execute(HttpMethod::Get, "/auth/me", None, true, CallClass::Standard)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Auth(AuthErrorKind::TokenExpired)));
    }

    #[tokio::test]
    async fn test_unparseable_error_body_falls_back_to_empty_envelope() {
        struct Garbage;
        #[async_trait]
        impl Transport for Garbage {
            async fn send(
                &self,
                _req: WireRequest,
            ) -> std::result::Result<WireResponse, TransportError> {
                Ok(WireResponse {
                    status: 400,
                    body: "not json at all".to_string(),
                })
            }
        }

        let exec = Executor::new(
            vec!["http://a".into()],
            Arc::new(Garbage),
            TokenCell::new(),
            timeouts(),
        );
        let err = exec
            .execute(HttpMethod::Get, "/jobs", None, false, CallClass::Standard)
            .await
            .unwrap_err();

        match err {
            ApiError::Validation(message) => {
                assert_eq!(message, "request failed with status 400")
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bearer_attached_when_token_present() {
        let transport = Arc::new(FakeTransport::new());
        transport.on("http://a/api/search/jobs", FakeOutcome::Reply(200, json!([])));

        let token = TokenCell::new();
        token.set("abc".to_string());
        let exec = Executor::new(
            vec!["http://a".into()],
            transport.clone(),
            token,
            timeouts(),
        );

        // Even an unauthenticated endpoint carries the token once one exists.
        exec.execute(HttpMethod::Get, "/search/jobs", None, false, CallClass::Standard)
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].bearer.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_probe_hits_health_outside_api_tree() {
        let transport = Arc::new(FakeTransport::new());
        transport.on("http://a/health", FakeOutcome::Fail("connection refused"));
        transport.on("http://b/health", FakeOutcome::Reply(200, json!({"status": "ok"})));

        let exec = executor_with(&["http://a", "http://b"], transport);
        assert_eq!(exec.probe().await.unwrap(), "http://b");
    }
}
