use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::workspace::WorkspaceAdminLookup;

const ADMIN_PERMISSION: &str = "a";
const GLOBAL_USER: &str = "*";
const ADMINISTER_METHOD: &str = "Workspace.administer";

/// JSON-RPC 1.1 client for the workspace service.
pub struct WorkspaceClient {
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    version: &'static str,
    id: String,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct WorkspacePermissions {
    perms: Vec<serde_json::Map<String, Value>>,
}

impl WorkspaceClient {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(request_timeout)
                .connect_timeout(connect_timeout)
                .build()
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "failed to build HTTP client with timeouts, using default");
                    reqwest::Client::default()
                }),
        }
    }

    async fn call(&self, url: &str, token: &str, method: &str, params: Value) -> Result<Value> {
        let request = RpcRequest {
            version: "1.1",
            id: Uuid::new_v4().to_string(),
            method,
            params,
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Workspace(format!("{method} request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Workspace(format!("failed to read {method} response: {e}")))?;

        // Errors arrive with a 500 status and a JSON-RPC error body; prefer the body.
        let parsed: RpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(Error::Workspace(format!("{method} returned {status}: {body}")));
            }
            Err(e) => {
                return Err(Error::Workspace(format!("malformed {method} response: {e}")));
            }
        };

        if let Some(err) = parsed.error.filter(|e| !e.is_null()) {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(Error::Workspace(format!("{method} failed: {message}")));
        }
        if !status.is_success() {
            return Err(Error::Workspace(format!("{method} returned {status}")));
        }

        parsed
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| Error::Workspace(format!("{method} returned no result")))
    }
}

#[async_trait::async_trait]
impl WorkspaceAdminLookup for WorkspaceClient {
    async fn get_ws_admins(
        &self,
        ws_id: i64,
        workspace_url: &str,
        token: &str,
    ) -> Result<Vec<String>> {
        tracing::debug!(ws_id, "looking up workspace admins");
        let result = self
            .call(workspace_url, token, ADMINISTER_METHOD, permissions_command(ws_id))
            .await?;

        let permissions: WorkspacePermissions = serde_json::from_value(result)
            .map_err(|e| Error::Workspace(format!("unexpected permissions payload: {e}")))?;
        let perms = permissions
            .perms
            .into_iter()
            .next()
            .ok_or_else(|| Error::Workspace(format!("no permissions returned for workspace {ws_id}")))?;

        Ok(admins_from_perms(perms))
    }
}

/// Admin-level `getPermissionsMass`, so private workspaces resolve with the
/// workspace admin token.
fn permissions_command(ws_id: i64) -> Value {
    serde_json::json!([{
        "command": "getPermissionsMass",
        "params": { "workspaces": [{ "id": ws_id }] },
    }])
}

fn admins_from_perms(perms: serde_json::Map<String, Value>) -> Vec<String> {
    perms
        .into_iter()
        .filter(|(user, perm)| user != GLOBAL_USER && perm.as_str() == Some(ADMIN_PERMISSION))
        .map(|(user, _)| user)
        .collect()
}
