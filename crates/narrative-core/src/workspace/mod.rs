pub mod jsonrpc;

use crate::error::Result;

/// Resolves who administers a workspace.
#[async_trait::async_trait]
pub trait WorkspaceAdminLookup: Send + Sync {
    /// Users holding admin permission on `ws_id`, in the order the workspace
    /// service reports them.
    async fn get_ws_admins(
        &self,
        ws_id: i64,
        workspace_url: &str,
        token: &str,
    ) -> Result<Vec<String>>;
}
