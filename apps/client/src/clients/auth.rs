use serde::Deserialize;
use serde_json::json;

use crate::clients::decode;
use crate::errors::Result;
use crate::http::{CallClass, Executor, HttpMethod};
use crate::models::Identity;

/// Token + identity pair returned by login and register.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: Identity,
}

#[derive(Clone)]
pub struct AuthClient {
    exec: Executor,
}

impl AuthClient {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// `POST /auth/login`. Failures surface verbatim; no state is touched
    /// here — the session store owns persistence.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let body = json!({ "email": email, "password": password });
        let value = self
            .exec
            .execute(HttpMethod::Post, "/auth/login", Some(body), false, CallClass::Standard)
            .await?;
        decode(value)
    }

    /// `POST /auth/register`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<AuthSession> {
        let body = json!({
            "name": name,
            "email": email,
            "password": password,
            "role": role,
        });
        let value = self
            .exec
            .execute(HttpMethod::Post, "/auth/register", Some(body), false, CallClass::Standard)
            .await?;
        decode(value)
    }

    /// `GET /auth/me` — validates the current token and returns the
    /// identity it belongs to.
    pub async fn me(&self) -> Result<Identity> {
        let value = self
            .exec
            .execute(HttpMethod::Get, "/auth/me", None, true, CallClass::Standard)
            .await?;
        decode(value)
    }
}
