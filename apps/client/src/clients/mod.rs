//! Per-domain API clients.
//!
//! Thin typed wrappers over the shared `Executor`. Every response body is
//! decoded into an explicit model at this boundary; raw `Value`s never
//! leave this module.

pub mod analytics;
pub mod applications;
pub mod auth;
pub mod companies;
pub mod jobs;
pub mod notifications;
pub mod profile;
pub mod saved_jobs;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::Result;

/// Decodes an executor payload into a typed model, mapping schema
/// violations to `ApiError::Decode`.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}
