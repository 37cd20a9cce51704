use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A company profile from the public browse surface. Like `Job`, only the
/// id and name matter to this core; the rest passes through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}
