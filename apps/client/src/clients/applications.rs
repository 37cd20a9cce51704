use serde_json::{json, Map, Value};

use crate::clients::decode;
use crate::errors::Result;
use crate::http::{CallClass, Executor, HttpMethod};
use crate::models::Application;

#[derive(Clone)]
pub struct ApplicationsClient {
    exec: Executor,
}

impl ApplicationsClient {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// `GET /applications` — the current user's applications.
    pub async fn list(&self) -> Result<Vec<Application>> {
        let value = self
            .exec
            .execute(HttpMethod::Get, "/applications", None, true, CallClass::Standard)
            .await?;
        decode(value)
    }

    /// `POST /applications` — apply to a job.
    ///
    /// Network-first: nothing is written locally until the server returns
    /// the created record. A 409 here is a genuine business error (one
    /// live application per job) and propagates as `ApiError::Conflict`;
    /// it must NOT be converged away like the saved-jobs conflict.
    pub async fn apply(
        &self,
        job_id: &str,
        cover_letter: Option<&str>,
        resume_url: Option<&str>,
    ) -> Result<Application> {
        let mut body = Map::new();
        body.insert("jobId".to_string(), json!(job_id));
        if let Some(cover_letter) = cover_letter {
            body.insert("coverLetter".to_string(), json!(cover_letter));
        }
        if let Some(resume_url) = resume_url {
            body.insert("resumeUrl".to_string(), json!(resume_url));
        }

        // Applications carry the cover letter payload, so they get the
        // upload wait window.
        let value = self
            .exec
            .execute(
                HttpMethod::Post,
                "/applications",
                Some(Value::Object(body)),
                true,
                CallClass::Upload,
            )
            .await?;
        decode(value)
    }

    /// `DELETE /applications/:id` — withdraw an application.
    pub async fn withdraw(&self, id: &str) -> Result<()> {
        self.exec
            .execute(
                HttpMethod::Delete,
                &format!("/applications/{id}"),
                None,
                true,
                CallClass::Standard,
            )
            .await?;
        Ok(())
    }
}
