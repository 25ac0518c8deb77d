use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::feeds::NotificationPublisher;
use crate::model::notification::Notification;

pub struct FeedsClient {
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CreatedNotification {
    id: String,
}

impl FeedsClient {
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
}

fn notification_endpoint(feeds_url: &str) -> String {
    format!("{}/api/V1/notification", feeds_url.trim_end_matches('/'))
}

#[async_trait::async_trait]
impl NotificationPublisher for FeedsClient {
    async fn create_notification(
        &self,
        note: &Notification,
        feeds_url: &str,
        token: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(notification_endpoint(feeds_url))
            .header("Authorization", token)
            .json(note)
            .send()
            .await
            .map_err(|e| Error::Feeds(format!("notification request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Feeds(format!("feeds API error {status}: {body}")));
        }

        let created: CreatedNotification = response
            .json()
            .await
            .map_err(|e| Error::Feeds(format!("unexpected feeds response: {e}")))?;
        Ok(created.id)
    }
}
