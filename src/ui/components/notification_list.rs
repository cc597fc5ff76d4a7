use std::fmt::Write as _;

use crate::common::{Notification, NotificationSnapshot};

pub fn render(snapshot: &NotificationSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Notifications ({} unread)", snapshot.unread_count);

    if snapshot.notifications.is_empty() {
        let _ = writeln!(out, "  (no notifications yet)");
    }

    for (index, notification) in snapshot.notifications.iter().enumerate() {
        let _ = writeln!(out, "{}", render_row(index + 1, notification));
    }

    let footer = if snapshot.is_loading {
        "loading…"
    } else if snapshot.has_more {
        "type `more` to load older notifications"
    } else {
        "end of list"
    };
    let _ = write!(out, "  page {} · {footer}", snapshot.current_page);
    out
}

pub fn render_row(position: usize, notification: &Notification) -> String {
    let marker = if notification.read { "○" } else { "●" };
    let sender = notification
        .sender
        .as_ref()
        .map(|sender| format!("{}: ", sender.label()))
        .unwrap_or_default();
    format!(
        "{position:>3}. {marker} [{}] {sender}{} ({})",
        notification.kind,
        notification.content,
        notification.created_at.format("%Y-%m-%d %H:%M")
    )
}
