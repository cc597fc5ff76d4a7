use tokio::sync::{mpsc, oneshot};

use crate::common::{Notification, NotificationId, NotificationSnapshot, SyncCommand};
use crate::error::SyncClosed;

/// Cloneable sender side of the `NotificationSync` actor.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    sender: mpsc::Sender<SyncCommand>,
}

impl SyncHandle {
    pub(crate) fn new(sender: mpsc::Sender<SyncCommand>) -> Self {
        Self { sender }
    }

    async fn send(&self, command: SyncCommand) -> Result<(), SyncClosed> {
        self.sender.send(command).await.map_err(|_| SyncClosed)
    }

    pub async fn fetch_page(&self, page: u32) -> Result<(), SyncClosed> {
        self.send(SyncCommand::FetchPage(page)).await
    }

    pub async fn load_more(&self) -> Result<(), SyncClosed> {
        self.send(SyncCommand::LoadMore).await
    }

    pub async fn refresh_unread_count(&self) -> Result<(), SyncClosed> {
        self.send(SyncCommand::RefreshUnreadCount).await
    }

    pub async fn mark_as_read(&self, id: NotificationId) -> Result<(), SyncClosed> {
        self.send(SyncCommand::MarkAsRead(id)).await
    }

    pub async fn mark_all_as_read(&self) -> Result<(), SyncClosed> {
        self.send(SyncCommand::MarkAllAsRead).await
    }

    pub async fn push(&self, notification: Notification) -> Result<(), SyncClosed> {
        self.send(SyncCommand::Push(notification)).await
    }

    /// Fetches page 0 and the unread count, like opening the notification view.
    pub async fn start(&self) -> Result<(), SyncClosed> {
        self.fetch_page(0).await?;
        self.refresh_unread_count().await
    }

    pub async fn snapshot(&self) -> Result<NotificationSnapshot, SyncClosed> {
        let (reply, response) = oneshot::channel();
        self.send(SyncCommand::Snapshot(reply)).await?;
        response.await.map_err(|_| SyncClosed)
    }

    pub async fn shutdown(&self) -> Result<(), SyncClosed> {
        self.send(SyncCommand::Shutdown).await
    }
}
