use serde::{Deserialize, Serialize};

/// The validated identity of the signed-in user.
///
/// Only ever constructed from a successful `/auth/me`, login, or register
/// response — a persisted token alone never produces an `Identity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Full profile as served by `/users/profile`. The identity fields are a
/// strict subset; the rest is editable by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}
