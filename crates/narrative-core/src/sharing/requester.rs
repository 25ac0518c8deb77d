use std::sync::Arc;

use crate::config::NarrativeConfig;
use crate::error::Result;
use crate::feeds::NotificationPublisher;
use crate::model::notification::Notification;
use crate::model::share::{
    DUPLICATE_REQUEST, MISSING_AUTHORIZATION, ShareRequestParams, ShareRequestRecord, ShareResult,
    ValidatedShareRequest,
};
use crate::storage::{Reservation, ShareRequestStore};
use crate::workspace::WorkspaceAdminLookup;

/// A validated request for access to a narrative's workspace, ready to be
/// announced to that workspace's admins.
#[derive(Debug, Clone)]
pub struct ShareRequester {
    request: ValidatedShareRequest,
    config: Arc<NarrativeConfig>,
}

impl ShareRequester {
    /// Validate `params`. No network calls happen here.
    pub fn new(params: ShareRequestParams, config: Arc<NarrativeConfig>) -> Result<Self> {
        let request = params.validate()?;
        Ok(Self { request, config })
    }

    pub fn request(&self) -> &ValidatedShareRequest {
        &self.request
    }

    /// Notify the workspace admins (and the requester) that `user` wants
    /// access at `share_level`.
    ///
    /// A missing service token or an already-recorded request is reported
    /// through [`ShareResult`]; collaborator failures are returned as errors
    /// untouched.
    pub async fn request_share(
        &self,
        workspace: &dyn WorkspaceAdminLookup,
        feeds: &dyn NotificationPublisher,
        store: &dyn ShareRequestStore,
    ) -> Result<ShareResult> {
        let request = &self.request;
        let Some(service_token) = self.config.service_token.as_deref() else {
            tracing::warn!(ws_id = request.ws_id, "share request rejected: no service token configured");
            return Ok(ShareResult::failure(MISSING_AUTHORIZATION));
        };

        match store
            .reserve(request.ws_id, &request.user, request.share_level)
            .await?
        {
            Reservation::Reserved => {}
            Reservation::AlreadyRequested(existing) => {
                tracing::info!(
                    ws_id = request.ws_id,
                    user = %request.user,
                    notification_id = ?existing.map(|r| r.notification_id),
                    "share request already made"
                );
                return Ok(ShareResult::failure(DUPLICATE_REQUEST));
            }
        }

        let notification_id = match self.notify_admins(workspace, feeds, service_token).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(release_err) = store
                    .release(request.ws_id, &request.user, request.share_level)
                    .await
                {
                    tracing::warn!(error = %release_err, "failed to release share request reservation");
                }
                return Err(e);
            }
        };

        store
            .save(&ShareRequestRecord::new(request, notification_id))
            .await?;

        Ok(ShareResult::success())
    }

    /// Look up the workspace admins and send them the request notification,
    /// returning the notification id.
    async fn notify_admins(
        &self,
        workspace: &dyn WorkspaceAdminLookup,
        feeds: &dyn NotificationPublisher,
        service_token: &str,
    ) -> Result<String> {
        let request = &self.request;
        let admins = workspace
            .get_ws_admins(
                request.ws_id,
                self.config.workspace_url()?,
                self.config.ws_admin_token()?,
            )
            .await?;
        tracing::debug!(ws_id = request.ws_id, admins = admins.len(), "resolved workspace admins");

        let note = Notification::share_request(request, admins);
        let notification_id = feeds
            .create_notification(&note, self.config.feeds_url()?, service_token)
            .await?;
        tracing::info!(
            ws_id = request.ws_id,
            user = %request.user,
            level = %request.share_level,
            recipients = note.users.len(),
            notification_id = %notification_id,
            "share request sent"
        );
        Ok(notification_id)
    }
}
