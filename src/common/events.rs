use serde::Serialize;

use super::types::{Id, Notification, NotificationSnapshot};

/// Sự kiện từ actor gửi lên UI.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    StateChanged(NotificationSnapshot),
    Alert(Toast),
    /// Lỗi hiển thị tạm thời cho người dùng; không bao giờ làm dừng actor.
    Error(String),
    PushConnected,
    PushDisconnected(String),
}

/// A transient alert raised for a pushed notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub title: String,
    pub body: String,
    pub related_id: Option<Id>,
    pub play_sound: bool,
}

impl Toast {
    pub fn for_notification(notification: &Notification, play_sound: bool) -> Self {
        let title = match &notification.sender {
            Some(sender) => format!("{} · {}", notification.kind.title(), sender.label()),
            None => notification.kind.title().to_string(),
        };
        Self {
            title,
            body: notification.content.clone(),
            related_id: notification.related_id.clone(),
            play_sound,
        }
    }
}
