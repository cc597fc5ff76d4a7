pub mod api;
pub mod http;
pub mod push;
pub mod session;

pub use api::NotificationApi;
pub use http::HttpNotificationApi;
pub use push::{PushListener, PushMessage};
pub use session::AuthSession;
