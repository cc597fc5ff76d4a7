use chrono::{DateTime, Utc};

use crate::common::{Id, NotificationSnapshot, Toast};

const MAX_RECENT: usize = 20;

/// Một dòng log hiển thị (alert hoặc lỗi) kèm thời điểm nhận.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Trạng thái cục bộ của console.
pub struct ConsoleState {
    pub snapshot: NotificationSnapshot,
    pub push_online: bool,
    pub recent_alerts: Vec<Toast>,
    pub errors: Vec<LogEntry>,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self {
            snapshot: NotificationSnapshot {
                notifications: Vec::new(),
                unread_count: 0,
                is_loading: false,
                has_more: true,
                current_page: 0,
            },
            push_online: false,
            recent_alerts: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: NotificationSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn push_alert(&mut self, toast: Toast) {
        self.recent_alerts.push(toast);
        if self.recent_alerts.len() > MAX_RECENT {
            self.recent_alerts.remove(0);
        }
    }

    pub fn push_error(&mut self, message: String) {
        self.errors.push(LogEntry {
            timestamp: Utc::now(),
            message,
        });
        if self.errors.len() > MAX_RECENT {
            self.errors.remove(0);
        }
    }

    /// `3` nghĩa là mục thứ 3 đang hiển thị; mọi thứ khác được coi là id.
    pub fn resolve_target(&self, token: &str) -> Id {
        token
            .parse::<usize>()
            .ok()
            .filter(|position| *position >= 1)
            .and_then(|position| self.snapshot.notifications.get(position - 1))
            .map(|notification| notification.notification_id.clone())
            .unwrap_or_else(|| Id::from(token))
    }
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new()
    }
}
