pub mod commands;
pub mod events;
pub mod payload;
pub mod time;
pub mod types;

pub use commands::SyncCommand;
pub use events::{SyncEvent, Toast};
pub use payload::WebSocketNotificationPayload;
pub use types::{
    Id, Notification, NotificationDraft, NotificationId, NotificationSnapshot, NotificationType,
    Page, UserRef,
};
