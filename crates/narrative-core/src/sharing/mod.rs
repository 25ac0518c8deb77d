pub mod requester;

use std::sync::Arc;

use crate::config::NarrativeConfig;
use crate::error::Result;
use crate::feeds::NotificationPublisher;
use crate::feeds::http::FeedsClient;
use crate::model::share::{ShareRequestParams, ShareResult};
use crate::storage::{NoopShareRequestStore, ShareRequestStore};
use crate::workspace::WorkspaceAdminLookup;
use crate::workspace::jsonrpc::WorkspaceClient;

pub use requester::ShareRequester;

pub struct NarrativeEngine {
    pub config: Arc<NarrativeConfig>,
    pub workspace: Arc<dyn WorkspaceAdminLookup>,
    pub feeds: Arc<dyn NotificationPublisher>,
    pub share_store: Arc<dyn ShareRequestStore>,
}

impl NarrativeEngine {
    pub fn new(
        config: NarrativeConfig,
        workspace: Arc<dyn WorkspaceAdminLookup>,
        feeds: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            workspace,
            feeds,
            share_store: Arc::new(NoopShareRequestStore),
        }
    }

    /// Engine talking to the real workspace and feeds services over HTTP.
    pub fn from_config(config: NarrativeConfig) -> Self {
        let workspace = Arc::new(WorkspaceClient::new(
            config.request_timeout,
            config.connect_timeout,
        ));
        let feeds = Arc::new(FeedsClient::new(
            config.request_timeout,
            config.connect_timeout,
        ));
        Self::new(config, workspace, feeds)
    }

    pub fn with_share_store(mut self, store: Arc<dyn ShareRequestStore>) -> Self {
        self.share_store = store;
        self
    }

    pub async fn request_share(&self, params: ShareRequestParams) -> Result<ShareResult> {
        let requester = ShareRequester::new(params, self.config.clone())?;
        requester
            .request_share(
                self.workspace.as_ref(),
                self.feeds.as_ref(),
                self.share_store.as_ref(),
            )
            .await
    }
}
