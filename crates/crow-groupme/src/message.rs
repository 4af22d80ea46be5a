use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Bot callback payload GroupMe posts for every message in a group.
pub struct GroupMeMessage {
    pub id: String,
    pub name: String,
    pub avatar_url: String,
    pub group_id: String,
    pub created_at: i64,
    pub user_id: String,
    pub text: String,
    pub attachments: Vec<Value>,
    pub system: bool,
    pub source_guid: String,
    pub sender_id: String,
    pub sender_type: String,
}

impl GroupMeMessage {
    /// Replies are addressed to a user; system and bot posts carry no user id.
    pub fn has_user(&self) -> bool {
        !self.user_id.trim().is_empty()
    }

    /// Text posted back to the group, mentioning the original sender.
    pub fn mention(&self, reply: &str) -> String {
        format!("@{} {}", self.name, reply)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMeSendRequest {
    pub bot_id: String,
    pub text: String,
}
