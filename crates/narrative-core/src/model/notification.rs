//! Feed notification document posted to the feeds service.

use serde::{Deserialize, Serialize};

use crate::model::share::{ShareLevel, ValidatedShareRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Narrative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationObject {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContext {
    pub level: ShareLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl Recipient {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: EntityType::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub actor: Actor,
    pub verb: String,
    pub object: NotificationObject,
    pub context: NotificationContext,
    pub users: Vec<Recipient>,
}

impl Notification {
    /// Build the "user requests narrative" notification. Recipients are the
    /// admins in the order given, then the requesting user; duplicates are kept.
    pub fn share_request(request: &ValidatedShareRequest, admins: Vec<String>) -> Self {
        let users = admins
            .into_iter()
            .chain(std::iter::once(request.user.clone()))
            .map(Recipient::user)
            .collect();

        Self {
            actor: Actor {
                entity_type: EntityType::User,
                id: request.user.clone(),
            },
            verb: "request".to_string(),
            object: NotificationObject {
                entity_type: EntityType::Narrative,
                id: request.ws_id,
            },
            context: NotificationContext {
                level: request.share_level,
            },
            users,
        }
    }

    pub fn recipient_ids(&self) -> Vec<&str> {
        self.users.iter().map(|u| u.id.as_str()).collect()
    }
}
