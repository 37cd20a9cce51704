use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A job posting, opaque to this core beyond its id.
///
/// The listing schema belongs to the rendering layer; everything except the
/// id rides through untouched in `rest` so server-side additions never
/// break the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}
