use serde::Deserialize;
use serde_json::json;

use crate::clients::decode;
use crate::errors::{ApiError, Result};
use crate::http::{CallClass, Executor, HttpMethod};

/// One saved-job record as served by `GET /saved-jobs`. Only the job id
/// matters to the cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobRecord {
    pub id: String,
    pub job_id: String,
}

/// Result of a save call. `AlreadySaved` is the conflict path converged
/// into a non-error: the job ends up in the saved set either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    AlreadySaved,
}

#[derive(Clone)]
pub struct SavedJobsClient {
    exec: Executor,
}

impl SavedJobsClient {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// `GET /saved-jobs`, reduced to the set of saved job ids.
    pub async fn list_ids(&self) -> Result<Vec<String>> {
        let value = self
            .exec
            .execute(HttpMethod::Get, "/saved-jobs", None, true, CallClass::Standard)
            .await?;
        let records: Vec<SavedJobRecord> = decode(value)?;
        Ok(records.into_iter().map(|r| r.job_id).collect())
    }

    /// `POST /saved-jobs` — idempotent save. The server's 409 means the
    /// job was already saved; that converges to `AlreadySaved` and no
    /// error reaches the caller.
    pub async fn save(&self, job_id: &str) -> Result<SaveOutcome> {
        let body = json!({ "jobId": job_id });
        match self
            .exec
            .execute(HttpMethod::Post, "/saved-jobs", Some(body), true, CallClass::Standard)
            .await
        {
            Ok(_) => Ok(SaveOutcome::Saved),
            Err(ApiError::Conflict(_)) => Ok(SaveOutcome::AlreadySaved),
            Err(e) => Err(e),
        }
    }

    /// `DELETE /saved-jobs/:jobId`.
    pub async fn unsave(&self, job_id: &str) -> Result<()> {
        self.exec
            .execute(
                HttpMethod::Delete,
                &format!("/saved-jobs/{job_id}"),
                None,
                true,
                CallClass::Standard,
            )
            .await?;
        Ok(())
    }
}
