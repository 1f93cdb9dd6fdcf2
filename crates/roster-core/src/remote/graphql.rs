//! HTTP GraphQL client for the directory service

use super::documents::Operation;
use super::{EmployeeService, RemoteError, RemoteResult, wire};
use crate::concurrency::SharedToken;
use crate::config::{RosterConfig, TimeoutConfig};
use crate::error::{RosterError, RosterResult};
use crate::model::{
    EmployeeChanges, EmployeeConnection, EmployeeId, EmployeeRecord, EmploymentStatus,
    LoginGrant, NewEmployee, StatusChange, UserIdentity,
};
use crate::query::QuerySpec;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

/// [`EmployeeService`] over HTTP
///
/// Sends `{query, operationName, variables}` to a single endpoint and
/// attaches the shared bearer token when one is held.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: Client,
    endpoint: String,
    token: SharedToken,
}

impl GraphqlClient {
    pub fn new(
        endpoint: impl Into<String>,
        timeouts: &TimeoutConfig,
        token: SharedToken,
    ) -> RosterResult<Self> {
        let endpoint = endpoint.into();
        let http = Client::builder()
            .connect_timeout(timeouts.connect_timeout())
            .timeout(timeouts.request_timeout())
            .build()
            .map_err(|e| {
                RosterError::config_with_context(
                    format!("Failed to create HTTP client: {}", e),
                    format!("Connecting to '{}'", endpoint),
                )
            })?;

        debug!(
            "Created GraphQL client for '{}' with timeouts: connection={}s, request={}s",
            endpoint, timeouts.connect_secs, timeouts.request_secs
        );

        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn from_config(config: &RosterConfig, token: SharedToken) -> RosterResult<Self> {
        Self::new(config.endpoint.trim(), &config.timeouts, token)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute(&self, op: Operation, variables: Value) -> RemoteResult<Value> {
        let body = json!({
            "query": op.document(),
            "operationName": op.name(),
            "variables": variables,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(bearer) = self.token.bearer() {
            request = request.bearer_auth(bearer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(format!("{} request failed: {}", op, e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(format!("{} response unreadable: {}", op, e)))?;

        debug!(operation = %op, status, "GraphQL response received");
        wire::decode_response(op, status, &text)
    }
}

#[async_trait]
impl EmployeeService for GraphqlClient {
    #[instrument(skip(self, password), level = "debug")]
    async fn login(&self, email: &str, password: &str) -> RemoteResult<LoginGrant> {
        let value = self
            .execute(
                Operation::Login,
                json!({ "email": email, "password": password }),
            )
            .await?;
        wire::login(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn identity_probe(&self) -> RemoteResult<UserIdentity> {
        let value = self.execute(Operation::GetMe, json!({})).await?;
        wire::identity(value)
    }

    #[instrument(skip(self, spec), fields(spec = %spec), level = "debug")]
    async fn list_employees(&self, spec: &QuerySpec) -> RemoteResult<EmployeeConnection> {
        let value = self
            .execute(Operation::GetEmployees, spec.to_variables())
            .await?;
        wire::connection(value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_employee(&self, id: &EmployeeId) -> RemoteResult<EmployeeRecord> {
        let value = self
            .execute(Operation::GetEmployee, json!({ "id": id }))
            .await?;
        wire::record(Operation::GetEmployee, Some(id), value)
    }

    #[instrument(skip(self, input), level = "debug")]
    async fn create_employee(&self, input: &NewEmployee) -> RemoteResult<EmployeeRecord> {
        let value = self
            .execute(Operation::CreateEmployee, json!({ "input": input }))
            .await?;
        wire::record(Operation::CreateEmployee, None, value)
    }

    #[instrument(skip(self, changes), level = "debug")]
    async fn update_employee(
        &self,
        id: &EmployeeId,
        changes: &EmployeeChanges,
    ) -> RemoteResult<EmployeeRecord> {
        let value = self
            .execute(
                Operation::UpdateEmployee,
                json!({ "id": id, "input": changes }),
            )
            .await?;
        wire::record(Operation::UpdateEmployee, Some(id), value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn update_employee_status(
        &self,
        id: &EmployeeId,
        status: EmploymentStatus,
    ) -> RemoteResult<StatusChange> {
        let value = self
            .execute(
                Operation::UpdateEmployeeStatus,
                json!({ "id": id, "status": status.as_str() }),
            )
            .await?;
        wire::status_change(id, value)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_employee(&self, id: &EmployeeId) -> RemoteResult<bool> {
        let value = self
            .execute(Operation::DeleteEmployee, json!({ "id": id }))
            .await?;
        wire::deleted(value)
    }
}
