use tokio::sync::oneshot;

use super::types::{Notification, NotificationId, NotificationSnapshot};

/// Lệnh UI gửi xuống actor đồng bộ thông báo.
#[derive(Debug)]
pub enum SyncCommand {
    /// Tải trang `page`. Trang 0 thay thế danh sách, các trang sau nối vào cuối.
    FetchPage(u32),
    /// Tải trang kế tiếp nếu còn và không có request trang nào đang chạy.
    LoadMore,
    RefreshUnreadCount,
    MarkAsRead(NotificationId),
    MarkAllAsRead,
    /// Thông báo đến từ kênh push (hoặc được inject trực tiếp).
    Push(Notification),
    Snapshot(oneshot::Sender<NotificationSnapshot>),
    Shutdown,
}
