use serde::Serialize;

use crate::clients::decode;
use crate::errors::Result;
use crate::http::{CallClass, Executor, HttpMethod};
use crate::models::UserProfile;

/// Partial profile update; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Clone)]
pub struct ProfileClient {
    exec: Executor,
}

impl ProfileClient {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// `GET /users/profile`.
    pub async fn get(&self) -> Result<UserProfile> {
        let value = self
            .exec
            .execute(HttpMethod::Get, "/users/profile", None, true, CallClass::Standard)
            .await?;
        decode(value)
    }

    /// `PUT /users/profile` — returns the updated profile.
    pub async fn update(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let body = serde_json::to_value(update)?;
        let value = self
            .exec
            .execute(HttpMethod::Put, "/users/profile", Some(body), true, CallClass::Standard)
            .await?;
        decode(value)
    }
}
