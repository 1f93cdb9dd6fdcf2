//! Decoding of GraphQL response envelopes

use super::documents::Operation;
use super::{RemoteError, RemoteResult};
use crate::model::{
    EmployeeConnection, EmployeeId, EmployeeRecord, LoginGrant, PageInfo, StatusChange,
    UserIdentity,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphqlError {
    fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }

    fn is_auth_failure(&self) -> bool {
        if matches!(self.code(), Some("UNAUTHENTICATED") | Some("FORBIDDEN")) {
            return true;
        }
        let message = self.message.to_ascii_lowercase();
        message.contains("not authenticated")
            || message.contains("authentication")
            || message.contains("unauthorized")
    }
}

fn classify(op: Operation, error: &GraphqlError) -> RemoteError {
    if op == Operation::Login {
        RemoteError::InvalidCredentials
    } else if error.is_auth_failure() {
        RemoteError::Unauthorized
    } else {
        RemoteError::Rejected(error.message.clone())
    }
}

/// Turn an HTTP status and body into the operation's root field
///
/// A `null` root field is returned as [`Value::Null`]; what that means is up
/// to the operation.
pub fn decode_response(op: Operation, status: u16, body: &str) -> RemoteResult<Value> {
    if status == 401 {
        return Err(RemoteError::Unauthorized);
    }
    let success = (200..300).contains(&status);

    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if !success => return Err(RemoteError::Network(format!("HTTP {}", status))),
        Err(e) => return Err(RemoteError::Decode(format!("{}: {}", op, e))),
    };

    if let Some(first) = envelope.errors.first() {
        return Err(classify(op, first));
    }
    if !success {
        return Err(RemoteError::Network(format!("HTTP {}", status)));
    }

    let mut data = envelope
        .data
        .ok_or_else(|| RemoteError::Decode(format!("{}: response has no data", op)))?;
    Ok(data
        .get_mut(op.root_field())
        .map(Value::take)
        .unwrap_or(Value::Null))
}

fn from_value<T: DeserializeOwned>(op: Operation, value: Value) -> RemoteResult<T> {
    serde_json::from_value(value).map_err(|e| RemoteError::Decode(format!("{}: {}", op, e)))
}

fn non_null(op: Operation, value: Value) -> RemoteResult<Value> {
    if value.is_null() {
        Err(RemoteError::Decode(format!("{}: null result", op)))
    } else {
        Ok(value)
    }
}

pub(super) fn login(value: Value) -> RemoteResult<LoginGrant> {
    from_value(Operation::Login, non_null(Operation::Login, value)?)
}

/// `me` is null when the token is not accepted
pub(super) fn identity(value: Value) -> RemoteResult<UserIdentity> {
    if value.is_null() {
        return Err(RemoteError::Unauthorized);
    }
    from_value(Operation::GetMe, value)
}

#[derive(Debug, Deserialize)]
struct Edge {
    #[allow(dead_code)]
    cursor: Option<String>,
    node: EmployeeRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    page_info: PageInfo,
    #[serde(default)]
    total_count: u64,
}

pub(super) fn connection(value: Value) -> RemoteResult<EmployeeConnection> {
    let op = Operation::GetEmployees;
    let wire: Connection = from_value(op, non_null(op, value)?)?;
    Ok(EmployeeConnection {
        records: wire.edges.into_iter().map(|edge| edge.node).collect(),
        page_info: wire.page_info,
        total_count: wire.total_count,
    })
}

/// A null record means the id does not exist (or no longer exists)
pub(super) fn record(op: Operation, id: Option<&EmployeeId>, value: Value) -> RemoteResult<EmployeeRecord> {
    match (value.is_null(), id) {
        (true, Some(id)) => Err(RemoteError::NotFound(id.clone())),
        (true, None) => Err(RemoteError::Decode(format!("{}: null result", op))),
        (false, _) => from_value(op, value),
    }
}

pub(super) fn status_change(id: &EmployeeId, value: Value) -> RemoteResult<StatusChange> {
    if value.is_null() {
        return Err(RemoteError::NotFound(id.clone()));
    }
    from_value(Operation::UpdateEmployeeStatus, value)
}

pub(super) fn deleted(value: Value) -> RemoteResult<bool> {
    match value {
        Value::Bool(deleted) => Ok(deleted),
        Value::Null => Ok(false),
        other => Err(RemoteError::Decode(format!(
            "{}: expected boolean, got {}",
            Operation::DeleteEmployee,
            other
        ))),
    }
}
