use serde::{Deserialize, Serialize};

/// An in-app notification. `is_read` may be flipped locally before the
/// server confirms (the one local-first exception to the mutation policy).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_read: bool,
}
