use async_trait::async_trait;

use crate::common::{Notification, NotificationDraft, NotificationId, Page};
use crate::error::ApiError;

/// REST surface of the notification backend.
///
/// `NotificationSync` only uses the first four methods; the management calls
/// exist for the CLI.
#[async_trait]
pub trait NotificationApi: Send + Sync + 'static {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page<Notification>, ApiError>;

    async fn unread_count(&self) -> Result<u64, ApiError>;

    async fn mark_as_read(&self, id: &NotificationId) -> Result<(), ApiError>;

    async fn mark_all_as_read(&self) -> Result<(), ApiError>;

    async fn create(&self, draft: &NotificationDraft) -> Result<Notification, ApiError>;

    async fn update(
        &self,
        id: &NotificationId,
        draft: &NotificationDraft,
    ) -> Result<Notification, ApiError>;

    async fn delete(&self, id: &NotificationId) -> Result<(), ApiError>;
}
