use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::time;
use super::types::{Id, Notification, NotificationType, UserRef};

/// Một frame push từ WebSocket, mỗi frame ứng với một sự kiện phía server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketNotificationPayload {
    #[serde(default)]
    pub notification_id: Option<Id>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub related_id: Option<Id>,
    #[serde(deserialize_with = "time::flexible::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub sender_id: Option<Id>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

impl WebSocketNotificationPayload {
    /// Builds the list entry for a pushed event. Payloads without an id get a local `push-<uuid>` id.
    pub fn into_notification(self, receiver: Option<&Id>) -> Notification {
        let notification_id = self
            .notification_id
            .unwrap_or_else(|| Id::from(format!("push-{}", Uuid::new_v4())));

        let sender = self.sender_id.map(|sender_id| UserRef {
            display_name: self.sender_name.clone(),
            ..UserRef::new(sender_id)
        });

        Notification {
            notification_id,
            receiver: receiver.cloned().map(UserRef::new),
            sender,
            kind: self.kind,
            content: self.content,
            related_id: self.related_id,
            read: self.read,
            created_at: self.timestamp,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_without_id_gets_local_id() {
        let json = r#"{
            "type": "FRIEND_REQUEST",
            "content": "Bao sent you a friend request",
            "relatedId": 88,
            "timestamp": 1717234200000,
            "read": false,
            "senderId": 88,
            "senderName": "Bao"
        }"#;

        let payload: WebSocketNotificationPayload = serde_json::from_str(json).unwrap();
        let receiver = Id::from("me");
        let notification = payload.into_notification(Some(&receiver));

        assert!(notification.notification_id.as_str().starts_with("push-"));
        assert_eq!(notification.kind, NotificationType::FriendRequest);
        assert_eq!(notification.sender.as_ref().unwrap().label(), "Bao");
        assert_eq!(notification.receiver.unwrap().user_id, receiver);
        assert_eq!(notification.created_at.timestamp(), 1_717_234_200);
    }

    #[test]
    fn payload_keeps_server_id_when_present() {
        let json = r#"{
            "notificationId": "n-77",
            "type": "POST_LIKE",
            "content": "liked your post",
            "timestamp": "2024-06-01T09:30:00"
        }"#;

        let payload: WebSocketNotificationPayload = serde_json::from_str(json).unwrap();
        let notification = payload.into_notification(None);
        assert_eq!(notification.notification_id.as_str(), "n-77");
        assert!(notification.sender.is_none());
        assert!(notification.receiver.is_none());
    }
}
