/// Một dòng lệnh người dùng gõ trong chế độ `watch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    LoadMore,
    Refresh,
    /// Số thứ tự trong danh sách (1-based) hoặc notification id.
    MarkRead(String),
    MarkAllRead,
    Show,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "commands: more | refresh | read <n|id> | read-all | show | status | help | quit";

pub fn parse(input: &str) -> Option<UserAction> {
    let mut parts = input.split_whitespace();
    let action = match parts.next()? {
        "more" | "m" => UserAction::LoadMore,
        "refresh" | "r" => UserAction::Refresh,
        "read" => UserAction::MarkRead(parts.next()?.to_string()),
        "read-all" | "ra" => UserAction::MarkAllRead,
        "show" | "ls" => UserAction::Show,
        "status" | "st" => UserAction::Status,
        "help" | "?" => UserAction::Help,
        "quit" | "exit" | "q" => UserAction::Quit,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse("more"), Some(UserAction::LoadMore));
        assert_eq!(parse("  read 3 "), Some(UserAction::MarkRead("3".into())));
        assert_eq!(parse("read-all"), Some(UserAction::MarkAllRead));
        assert_eq!(parse("status"), Some(UserAction::Status));
        assert_eq!(parse("q"), Some(UserAction::Quit));
    }

    #[test]
    fn rejects_incomplete_or_unknown() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("read"), None);
        assert_eq!(parse("delete 4"), None);
    }
}
