use crate::clients::decode;
use crate::errors::Result;
use crate::http::{CallClass, Executor, HttpMethod};
use crate::models::Job;

/// Filters for `GET /search/jobs`. All fields optional; an empty query
/// lists everything.
#[derive(Debug, Clone, Default)]
pub struct JobSearchQuery {
    pub text: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    pub remote: Option<bool>,
}

impl JobSearchQuery {
    fn to_query_string(&self) -> String {
        let mut qs = String::new();
        push_param(&mut qs, "q", self.text.as_deref());
        push_param(&mut qs, "location", self.location.as_deref());
        push_param(&mut qs, "type", self.job_type.as_deref());
        push_param(&mut qs, "category", self.category.as_deref());
        let remote = self.remote.map(|r| r.to_string());
        push_param(&mut qs, "remote", remote.as_deref());
        qs
    }
}

fn push_param(qs: &mut String, key: &str, value: Option<&str>) {
    let Some(value) = value else { return };
    qs.push(if qs.is_empty() { '?' } else { '&' });
    qs.push_str(key);
    qs.push('=');
    qs.push_str(&percent_encode(value));
}

/// Minimal query-component encoding: everything outside the unreserved set
/// is percent-escaped.
fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[derive(Clone)]
pub struct JobsClient {
    exec: Executor,
}

impl JobsClient {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// `GET /search/jobs` — public, no session needed.
    pub async fn search(&self, query: &JobSearchQuery) -> Result<Vec<Job>> {
        let path = format!("/search/jobs{}", query.to_query_string());
        let value = self
            .exec
            .execute(HttpMethod::Get, &path, None, false, CallClass::Standard)
            .await?;
        decode(value)
    }

    /// `GET /jobs/recommended` — skill-based list for the signed-in user.
    pub async fn recommended(&self) -> Result<Vec<Job>> {
        let value = self
            .exec
            .execute(HttpMethod::Get, "/jobs/recommended", None, true, CallClass::Standard)
            .await?;
        decode(value)
    }
}
