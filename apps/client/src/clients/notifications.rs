use crate::clients::decode;
use crate::errors::Result;
use crate::http::{CallClass, Executor, HttpMethod};
use crate::models::Notification;

#[derive(Clone)]
pub struct NotificationsClient {
    exec: Executor,
}

impl NotificationsClient {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// `GET /notifications`, newest first (server-ordered; the client does
    /// not re-sort).
    pub async fn list(&self) -> Result<Vec<Notification>> {
        let value = self
            .exec
            .execute(HttpMethod::Get, "/notifications", None, true, CallClass::Standard)
            .await?;
        decode(value)
    }

    /// `PUT /notifications/:id/read`. Callers flip `is_read` locally no
    /// matter what this returns; see the synchronizer's read-receipt
    /// policy.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        self.exec
            .execute(
                HttpMethod::Put,
                &format!("/notifications/{id}/read"),
                None,
                true,
                CallClass::Standard,
            )
            .await?;
        Ok(())
    }
}
