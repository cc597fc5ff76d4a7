use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time;

/// Opaque identifier. Backend có thể gửi dạng số hoặc chuỗi, phía client luôn giữ chuỗi.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct Id(String);

pub type NotificationId = Id;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for Id {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(number) => Id(number.to_string()),
            RawId::Text(text) => Id(text),
        }
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id(value)
    }
}

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    NewPost,
    PostLike,
    PostComment,
    PostShare,
    FriendRequest,
    FriendAccepted,
    GroupInvite,
    GroupJoinRequest,
    GroupJoinAccepted,
    ChatMessage,
    Mention,
    System,
}

impl NotificationType {
    pub const ALL: [NotificationType; 12] = [
        NotificationType::NewPost,
        NotificationType::PostLike,
        NotificationType::PostComment,
        NotificationType::PostShare,
        NotificationType::FriendRequest,
        NotificationType::FriendAccepted,
        NotificationType::GroupInvite,
        NotificationType::GroupJoinRequest,
        NotificationType::GroupJoinAccepted,
        NotificationType::ChatMessage,
        NotificationType::Mention,
        NotificationType::System,
    ];

    /// Wire name, e.g. `POST_LIKE`.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::NewPost => "NEW_POST",
            NotificationType::PostLike => "POST_LIKE",
            NotificationType::PostComment => "POST_COMMENT",
            NotificationType::PostShare => "POST_SHARE",
            NotificationType::FriendRequest => "FRIEND_REQUEST",
            NotificationType::FriendAccepted => "FRIEND_ACCEPTED",
            NotificationType::GroupInvite => "GROUP_INVITE",
            NotificationType::GroupJoinRequest => "GROUP_JOIN_REQUEST",
            NotificationType::GroupJoinAccepted => "GROUP_JOIN_ACCEPTED",
            NotificationType::ChatMessage => "CHAT_MESSAGE",
            NotificationType::Mention => "MENTION",
            NotificationType::System => "SYSTEM",
        }
    }

    /// Tiêu đề ngắn dùng cho toast.
    pub fn title(self) -> &'static str {
        match self {
            NotificationType::NewPost => "New post",
            NotificationType::PostLike => "New like",
            NotificationType::PostComment => "New comment",
            NotificationType::PostShare => "Post shared",
            NotificationType::FriendRequest => "Friend request",
            NotificationType::FriendAccepted => "Friend request accepted",
            NotificationType::GroupInvite => "Group invitation",
            NotificationType::GroupJoinRequest => "Group join request",
            NotificationType::GroupJoinAccepted => "Group join accepted",
            NotificationType::ChatMessage => "New message",
            NotificationType::Mention => "You were mentioned",
            NotificationType::System => "System",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().replace('-', "_").to_ascii_uppercase();
        NotificationType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown notification type `{value}`"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    #[serde(alias = "id")]
    pub user_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, alias = "fullName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, alias = "avatar", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserRef {
    pub fn new(user_id: impl Into<Id>) -> Self {
        Self {
            user_id: user_id.into(),
            username: None,
            display_name: None,
            avatar_url: None,
        }
    }

    /// Tên hiển thị tốt nhất có được, fallback về user id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(self.user_id.as_str())
    }
}

/// Domain model đại diện một thông báo, do backend sinh ra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: NotificationId,
    #[serde(default)]
    pub receiver: Option<UserRef>,
    #[serde(default)]
    pub sender: Option<UserRef>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub related_id: Option<Id>,
    #[serde(default)]
    pub read: bool,
    #[serde(deserialize_with = "time::flexible::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "time::flexible_option::deserialize")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for the create / update management endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub receiver_id: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<Id>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_id: Option<Id>,
    pub read: bool,
}

/// Spring-style page envelope returned by `GET /notifications/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// Read-only view of the sync state, handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub is_loading: bool,
    pub has_more: bool,
    pub current_page: u32,
}
