//! JobLink client core — the resilient access layer behind the mobile UI.
//!
//! Everything the UI touches goes through one [`sync::Synchronizer`]
//! instance: it owns the session, the cached collections, and the
//! per-domain API clients, and it is the only writer of any of them.

pub mod cache;
pub mod clients;
pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod session;
pub mod store;
pub mod sync;

pub use config::Config;
pub use errors::{ApiError, AuthErrorKind};
pub use session::{SessionBoot, SessionState};
pub use sync::{AppSnapshot, Synchronizer};
