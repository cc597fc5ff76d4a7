use std::fmt::Write as _;

use crate::ui::state::ConsoleState;

const SHOWN: usize = 5;

/// Tóm tắt phiên: kênh push, số chưa đọc, vài alert và lỗi gần nhất.
pub fn render(state: &ConsoleState) -> String {
    let mut out = String::new();
    let live = if state.push_online { "online" } else { "offline" };
    let _ = writeln!(out, "push channel: {live}");
    let _ = writeln!(
        out,
        "unread: {} · held: {} · page {}",
        state.snapshot.unread_count,
        state.snapshot.notifications.len(),
        state.snapshot.current_page
    );

    let _ = writeln!(out, "recent alerts:");
    if state.recent_alerts.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for alert in state.recent_alerts.iter().rev().take(SHOWN) {
        let _ = writeln!(out, "  {}", alert.title);
    }

    let _ = write!(out, "recent errors:");
    if state.errors.is_empty() {
        let _ = write!(out, "\n  (none)");
    }
    for entry in state.errors.iter().rev().take(SHOWN) {
        let _ = write!(
            out,
            "\n  {} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.message
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Toast;

    #[test]
    fn empty_session() {
        let text = render(&ConsoleState::new());
        assert!(text.contains("push channel: offline"));
        assert!(text.contains("unread: 0 · held: 0 · page 0"));
        assert_eq!(text.matches("(none)").count(), 2);
    }

    #[test]
    fn newest_alerts_and_errors_first() {
        let mut state = ConsoleState::new();
        state.push_online = true;
        for title in ["first", "second"] {
            state.push_alert(Toast {
                title: title.into(),
                body: String::new(),
                related_id: None,
                play_sound: false,
            });
        }
        state.push_error("Could not load notifications".into());

        let text = render(&state);
        assert!(text.contains("push channel: online"));
        let second = text.find("second").unwrap();
        let first = text.find("first").unwrap();
        assert!(second < first);
        assert!(text.contains("Could not load notifications"));
    }
}
