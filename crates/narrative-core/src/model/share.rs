use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const MISSING_AUTHORIZATION: &str =
    "Unable to request share - NarrativeService is missing authorization.";
pub const DUPLICATE_REQUEST: &str = "A request has already been made";

/// Permission level being asked for on a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShareLevel {
    #[serde(rename = "a")]
    Admin,
    #[serde(rename = "w")]
    Write,
    #[serde(rename = "r")]
    Read,
}

impl ShareLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareLevel::Admin => "a",
            ShareLevel::Write => "w",
            ShareLevel::Read => "r",
        }
    }
}

impl std::fmt::Display for ShareLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShareLevel {
    type Err = ValidationError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "a" => Ok(ShareLevel::Admin),
            "w" => Ok(ShareLevel::Write),
            "r" => Ok(ShareLevel::Read),
            _ => Err(ValidationError::InvalidShareLevel(s.to_string())),
        }
    }
}

/// Parameters as supplied by the caller. Absent and `null` fields both
/// deserialize to `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareRequestParams {
    #[serde(default)]
    pub ws_id: Option<i64>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub share_level: Option<String>,
}

impl ShareRequestParams {
    pub fn new(ws_id: i64, user: impl Into<String>, share_level: impl Into<String>) -> Self {
        Self {
            ws_id: Some(ws_id),
            user: Some(user.into()),
            share_level: Some(share_level.into()),
        }
    }

    /// Checks required fields in the order `ws_id`, `share_level`, `user`,
    /// then the share level itself.
    pub fn validate(self) -> std::result::Result<ValidatedShareRequest, ValidationError> {
        let ws_id = self
            .ws_id
            .ok_or_else(|| ValidationError::MissingField("ws_id".to_string()))?;
        let level = self
            .share_level
            .ok_or_else(|| ValidationError::MissingField("share_level".to_string()))?;
        let user = self
            .user
            .ok_or_else(|| ValidationError::MissingField("user".to_string()))?;
        let share_level = level.parse::<ShareLevel>()?;
        Ok(ValidatedShareRequest {
            ws_id,
            user,
            share_level,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedShareRequest {
    pub ws_id: i64,
    /// The user to be shared with, who is also the one asking.
    pub user: String,
    pub share_level: ShareLevel,
}

/// Outcome reported back to the caller. `ok == 0` carries a human-readable
/// reason; hard failures are returned as errors instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareResult {
    pub ok: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShareResult {
    pub fn success() -> Self {
        Self { ok: 1, error: None }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: 0,
            error: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok == 1
    }
}

/// A share request that has been announced to the workspace admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRequestRecord {
    pub id: Uuid,
    pub ws_id: i64,
    pub user: String,
    pub share_level: ShareLevel,
    pub notification_id: String,
    pub created_at: String,
}

impl ShareRequestRecord {
    pub fn new(request: &ValidatedShareRequest, notification_id: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            ws_id: request.ws_id,
            user: request.user.clone(),
            share_level: request.share_level,
            notification_id,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
