pub mod http;

use crate::error::Result;
use crate::model::notification::Notification;

/// Delivers notifications to the feeds service.
#[async_trait::async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Submit `note` and return the id the feeds service assigned to it.
    async fn create_notification(
        &self,
        note: &Notification,
        feeds_url: &str,
        token: &str,
    ) -> Result<String>;
}
