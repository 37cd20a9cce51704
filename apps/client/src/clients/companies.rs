use crate::clients::decode;
use crate::errors::Result;
use crate::http::{CallClass, Executor, HttpMethod};
use crate::models::Company;

#[derive(Clone)]
pub struct CompaniesClient {
    exec: Executor,
}

impl CompaniesClient {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// `GET /companies` — public browse list.
    pub async fn list(&self) -> Result<Vec<Company>> {
        let value = self
            .exec
            .execute(HttpMethod::Get, "/companies", None, false, CallClass::Standard)
            .await?;
        decode(value)
    }

    /// `GET /companies/:id`.
    pub async fn get(&self, id: &str) -> Result<Company> {
        let value = self
            .exec
            .execute(
                HttpMethod::Get,
                &format!("/companies/{id}"),
                None,
                false,
                CallClass::Standard,
            )
            .await?;
        decode(value)
    }
}
