use serde_json::{json, Value};
use tracing::debug;

use crate::http::{CallClass, Executor, HttpMethod};

/// Fire-and-forget telemetry. Events are best-effort by design: a failed
/// `POST /analytics/events` is logged at debug and never surfaced — the
/// app must never degrade over telemetry.
#[derive(Clone)]
pub struct AnalyticsClient {
    exec: Executor,
}

impl AnalyticsClient {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    pub async fn track(&self, event: &str, properties: Value) {
        let body = json!({ "event": event, "properties": properties });
        if let Err(e) = self
            .exec
            .execute(HttpMethod::Post, "/analytics/events", Some(body), true, CallClass::Standard)
            .await
        {
            debug!("analytics event '{event}' dropped: {e}");
        }
    }
}
