use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{self, JoinError, JoinSet};

use crate::common::{Notification, NotificationId, Page, SyncCommand, SyncEvent, Toast};
use crate::error::ApiError;
use crate::network::{AuthSession, NotificationApi, PushMessage};
use crate::storage::NotificationCache;

use super::handle::SyncHandle;
use super::state::{MergePolicy, NotificationState, ReadUndo};

const CHANNEL_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub page_size: u32,
    pub rollback_on_failure: bool,
    pub merge_policy: MergePolicy,
    pub alert_sound: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            rollback_on_failure: true,
            merge_policy: MergePolicy::Append,
            alert_sound: true,
        }
    }
}

/// Result of a request task, delivered back into the actor loop.
enum Completion {
    Page {
        page: u32,
        result: Result<Page<Notification>, ApiError>,
    },
    UnreadCount(Result<u64, ApiError>),
    MarkRead {
        id: NotificationId,
        undo: ReadUndo,
        result: Result<(), ApiError>,
    },
    MarkAllRead {
        undo: ReadUndo,
        result: Result<(), ApiError>,
    },
}

/// Actor sở hữu trạng thái thông báo.
///
/// Ba nguồn ghi (tải trang, mutation đã đọc, push) đều đi qua vòng lặp này,
/// nên mỗi chuyển trạng thái chạy trọn vẹn trước khi cái tiếp theo bắt đầu.
/// Request mạng chạy trong `JoinSet`; kết quả quay về vòng lặp như một sự kiện.
pub struct NotificationSync<A: NotificationApi> {
    api: Arc<A>,
    session: AuthSession,
    options: SyncOptions,
    state: NotificationState,
    command_receiver: mpsc::Receiver<SyncCommand>,
    push_receiver: Option<mpsc::Receiver<PushMessage>>,
    event_sender: mpsc::Sender<SyncEvent>,
    in_flight: JoinSet<Completion>,
    /// Page number of every page request still in `in_flight`.
    page_tasks: HashMap<task::Id, u32>,
    cache: Option<NotificationCache>,
}

impl<A: NotificationApi> NotificationSync<A> {
    pub fn new(
        api: Arc<A>,
        session: AuthSession,
        options: SyncOptions,
    ) -> (Self, SyncHandle, mpsc::Receiver<SyncEvent>) {
        let (command_sender, command_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_sender, event_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let sync = Self {
            api,
            session,
            state: NotificationState::new(options.merge_policy),
            options,
            command_receiver,
            push_receiver: None,
            event_sender,
            in_flight: JoinSet::new(),
            page_tasks: HashMap::new(),
            cache: None,
        };
        (sync, SyncHandle::new(command_sender), event_receiver)
    }

    pub fn with_push(mut self, push_receiver: mpsc::Receiver<PushMessage>) -> Self {
        self.push_receiver = Some(push_receiver);
        self
    }

    /// Attaches a snapshot cache and seeds the state from it.
    pub fn with_cache(mut self, cache: NotificationCache) -> Self {
        match cache.load_snapshot() {
            Ok(Some(cached)) => {
                log::info!(
                    "Restored {} cached notifications from {}",
                    cached.notifications.len(),
                    cached.saved_at
                );
                self.state.hydrate(cached.notifications, cached.unread_count);
            }
            Ok(None) => {}
            Err(err) => log::warn!("Failed to read notification cache: {err}"),
        }
        self.cache = Some(cache);
        self
    }

    pub async fn run(mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if !self.session.is_authenticated() {
            log::warn!("No auth token configured; notification sync stays idle");
            self.emit(SyncEvent::Error("Not signed in".to_string())).await;
            return Ok(());
        }

        log::info!("Notification sync started (user={:?})", self.session.user_id());
        self.emit_state().await;

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    match command {
                        Some(SyncCommand::Shutdown) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                message = next_push(&mut self.push_receiver) => {
                    match message {
                        Some(message) => self.handle_push_message(message).await,
                        None => {
                            log::warn!("Push listener stopped; continuing with REST only");
                            self.push_receiver = None;
                        }
                    }
                }
                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    self.handle_completion(joined).await;
                }
            }
        }

        if !self.in_flight.is_empty() {
            log::debug!("Aborting {} in-flight requests", self.in_flight.len());
            self.in_flight.shutdown().await;
        }
        log::info!("Notification sync stopped");
        Ok(())
    }

    async fn handle_command(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::FetchPage(page) => self.start_page_fetch(page).await,
            SyncCommand::LoadMore => {
                if !self.state.can_load_more() {
                    log::debug!(
                        "load more ignored (has_more={}, loading={})",
                        self.state.has_more(),
                        self.state.is_loading()
                    );
                    return;
                }
                let Some(next) = self.state.current_page().checked_add(1) else {
                    log::warn!("load more ignored: no page after {}", self.state.current_page());
                    return;
                };
                self.start_page_fetch(next).await;
            }
            SyncCommand::RefreshUnreadCount => {
                let api = self.api.clone();
                self.in_flight.spawn(async move {
                    Completion::UnreadCount(api.unread_count().await)
                });
            }
            SyncCommand::MarkAsRead(id) => {
                let undo = self.state.mark_read(&id);
                self.state_changed().await;
                let api = self.api.clone();
                self.in_flight.spawn(async move {
                    let result = api.mark_as_read(&id).await;
                    Completion::MarkRead { id, undo, result }
                });
            }
            SyncCommand::MarkAllAsRead => {
                let undo = self.state.mark_all_read();
                self.state_changed().await;
                let api = self.api.clone();
                self.in_flight.spawn(async move {
                    let result = api.mark_all_as_read().await;
                    Completion::MarkAllRead { undo, result }
                });
            }
            SyncCommand::Push(notification) => self.on_push(notification).await,
            SyncCommand::Snapshot(reply) => {
                let _ = reply.send(self.state.snapshot());
            }
            SyncCommand::Shutdown => {}
        }
    }

    async fn start_page_fetch(&mut self, page: u32) {
        self.state.begin_page_fetch();
        self.emit_state().await;

        let api = self.api.clone();
        let page_size = self.options.page_size;
        log::debug!("Fetching notification page {page} (size {page_size})");
        let abort_handle = self.in_flight.spawn(async move {
            let result = api.fetch_page(page, page_size).await;
            Completion::Page { page, result }
        });
        self.page_tasks.insert(abort_handle.id(), page);
    }

    async fn handle_push_message(&mut self, message: PushMessage) {
        match message {
            PushMessage::Connected => self.emit(SyncEvent::PushConnected).await,
            PushMessage::Disconnected(reason) => {
                self.emit(SyncEvent::PushDisconnected(reason)).await
            }
            PushMessage::Payload(payload) => {
                let notification = payload.into_notification(self.session.user_id());
                self.on_push(notification).await;
            }
        }
    }

    async fn on_push(&mut self, notification: Notification) {
        let toast = Toast::for_notification(&notification, self.options.alert_sound);
        let id = notification.notification_id.clone();
        if !self.state.push(notification) {
            log::debug!("Dropped pushed notification {id}: already held");
            return;
        }
        log::info!("Pushed notification {id}");
        self.state_changed().await;
        self.emit(SyncEvent::Alert(toast)).await;
    }

    async fn handle_completion(&mut self, joined: Result<(task::Id, Completion), JoinError>) {
        let completion = match joined {
            Ok((id, completion)) => {
                self.page_tasks.remove(&id);
                completion
            }
            Err(err) => {
                self.task_failed(err).await;
                return;
            }
        };

        match completion {
            Completion::Page { page, result } => match result {
                Ok(fetched) => {
                    let added = self.state.apply_page(page, fetched);
                    log::info!(
                        "Loaded notification page {page}: {added} items (has_more={})",
                        self.state.has_more()
                    );
                    self.state_changed().await;
                }
                Err(err) => {
                    log::error!("Failed to load notification page {page}: {err}");
                    self.page_failed(describe(&err)).await;
                }
            },
            Completion::UnreadCount(result) => match result {
                Ok(count) => {
                    self.state.set_unread_count(count);
                    self.state_changed().await;
                }
                Err(err) => {
                    log::error!("Failed to refresh unread count: {err}");
                    self.emit(SyncEvent::Error(format!(
                        "Could not refresh unread count: {}",
                        describe(&err)
                    )))
                    .await;
                }
            },
            Completion::MarkRead { id, undo, result } => {
                if let Err(err) = result {
                    log::error!("Failed to mark notification {id} as read: {err}");
                    let message = format!("Could not mark notification as read: {}", describe(&err));
                    self.mutation_failed(undo, message).await;
                }
            }
            Completion::MarkAllRead { undo, result } => {
                if let Err(err) = result {
                    log::error!("Failed to mark all notifications as read: {err}");
                    let message = format!("Could not mark all as read: {}", describe(&err));
                    self.mutation_failed(undo, message).await;
                }
            }
        }
    }

    /// A request task panicked. Page requests still clear their loading slot.
    async fn task_failed(&mut self, err: JoinError) {
        match self.page_tasks.remove(&err.id()) {
            Some(page) => {
                log::error!("Notification page {page} request task failed: {err}");
                self.page_failed(format!("request task failed ({err})")).await;
            }
            None => log::error!("Notification request task failed: {err}"),
        }
    }

    async fn page_failed(&mut self, reason: String) {
        self.state.fail_page_fetch();
        self.emit_state().await;
        self.emit(SyncEvent::Error(format!("Could not load notifications: {reason}")))
            .await;
    }

    async fn mutation_failed(&mut self, undo: ReadUndo, message: String) {
        if self.options.rollback_on_failure && !undo.is_noop() {
            if self.state.rollback(undo) {
                self.state_changed().await;
            } else {
                log::info!("Skipped rollback: list was refetched since the mutation");
            }
        }
        self.emit(SyncEvent::Error(message)).await;
    }

    /// Emit the new state and persist it.
    async fn state_changed(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            if let Err(err) = cache.save_snapshot(&self.state.snapshot()) {
                log::warn!("Failed to write notification cache: {err}");
            }
        }
        self.emit_state().await;
    }

    async fn emit_state(&mut self) {
        self.emit(SyncEvent::StateChanged(self.state.snapshot())).await;
    }

    // &mut self giữ future của `run` là Send: NotificationCache không Sync.
    async fn emit(&mut self, event: SyncEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::debug!("No listener for sync event: {err}");
        }
    }
}

fn describe(err: &ApiError) -> String {
    if err.is_unauthorized() {
        "session expired, sign in again".to_string()
    } else {
        err.to_string()
    }
}

async fn next_push(receiver: &mut Option<mpsc::Receiver<PushMessage>>) -> Option<PushMessage> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
