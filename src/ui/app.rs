use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::common::SyncEvent;
use crate::sync::SyncHandle;

use super::components::input_bar::{self, UserAction};
use super::components::{notification_list, status, toast};
use super::state::ConsoleState;

/// Console front end: in lệnh từ stdin xuống actor và in sự kiện từ actor ra stdout.
pub struct ConsoleApp {
    state: ConsoleState,
    handle: SyncHandle,
    event_receiver: mpsc::Receiver<SyncEvent>,
}

impl ConsoleApp {
    pub fn new(handle: SyncHandle, event_receiver: mpsc::Receiver<SyncEvent>) -> Self {
        Self {
            state: ConsoleState::new(),
            handle,
            event_receiver,
        }
    }

    pub async fn run(self) -> io::Result<()> {
        self.run_with(BufReader::new(tokio::io::stdin())).await
    }

    /// Hết input (stdin đóng) không dừng app: vẫn in sự kiện cho tới khi
    /// actor dừng hoặc nhận Ctrl-C.
    pub async fn run_with<R: AsyncBufRead + Unpin>(mut self, input: R) -> io::Result<()> {
        println!("{}", input_bar::HELP);
        let mut lines = input.lines();
        let mut input_open = true;
        let interrupted = tokio::signal::ctrl_c();
        tokio::pin!(interrupted);

        loop {
            tokio::select! {
                line = lines.next_line(), if input_open => {
                    match line? {
                        Some(line) => {
                            if !self.handle_input(&line).await {
                                break;
                            }
                        }
                        None => {
                            log::info!("Input closed; still following notifications");
                            input_open = false;
                        }
                    }
                }
                event = self.event_receiver.recv() => {
                    match event {
                        Some(event) => self.handle_sync_event(event),
                        None => {
                            log::info!("Notification sync ended");
                            break;
                        }
                    }
                }
                _ = &mut interrupted => {
                    log::info!("Interrupted");
                    break;
                }
            }
        }

        if self.handle.shutdown().await.is_err() {
            log::debug!("Sync actor already stopped");
        }
        Ok(())
    }

    fn handle_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::StateChanged(snapshot) => {
                let changed_list = snapshot.notifications != self.state.snapshot.notifications
                    || snapshot.unread_count != self.state.snapshot.unread_count;
                self.state.apply_snapshot(snapshot);
                if changed_list {
                    println!("{}", notification_list::render(&self.state.snapshot));
                }
            }
            SyncEvent::Alert(alert) => {
                println!("{}", toast::render(&alert));
                self.state.push_alert(alert);
            }
            SyncEvent::Error(message) => {
                println!("{}", toast::render_error(&message));
                self.state.push_error(message);
            }
            SyncEvent::PushConnected => {
                self.state.push_online = true;
                println!("[live] push channel connected");
            }
            SyncEvent::PushDisconnected(reason) => {
                self.state.push_online = false;
                println!("[live] push channel offline ({reason})");
            }
        }
    }

    /// Returns `false` when the user asked to quit.
    async fn handle_input(&mut self, line: &str) -> bool {
        let Some(action) = input_bar::parse(line) else {
            if !line.trim().is_empty() {
                println!("{}", input_bar::HELP);
            }
            return true;
        };

        let sent = match action {
            UserAction::LoadMore => self.handle.load_more().await,
            UserAction::Refresh => self.handle.start().await,
            UserAction::MarkRead(token) => {
                let id = self.state.resolve_target(&token);
                self.handle.mark_as_read(id).await
            }
            UserAction::MarkAllRead => self.handle.mark_all_as_read().await,
            UserAction::Show => {
                println!("{}", notification_list::render(&self.state.snapshot));
                Ok(())
            }
            UserAction::Status => {
                println!("{}", status::render(&self.state));
                Ok(())
            }
            UserAction::Help => {
                println!("{}", input_bar::HELP);
                Ok(())
            }
            UserAction::Quit => return false,
        };

        if let Err(err) = sent {
            log::warn!("Failed to send command to notification sync: {err}");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::common::{NotificationSnapshot, SyncCommand};
    use crate::sync::state::tests::notification;

    #[tokio::test]
    async fn keeps_following_after_input_closes() {
        let (command_sender, mut command_receiver) = mpsc::channel(8);
        let (event_sender, event_receiver) = mpsc::channel(8);
        let app = ConsoleApp::new(SyncHandle::new(command_sender), event_receiver);
        let task = tokio::spawn(app.run_with(BufReader::new(&b""[..])));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());

        event_sender
            .send(SyncEvent::StateChanged(NotificationSnapshot {
                notifications: vec![notification("a", false)],
                unread_count: 1,
                is_loading: false,
                has_more: false,
                current_page: 0,
            }))
            .await
            .unwrap();
        drop(event_sender);

        task.await.unwrap().unwrap();
        assert!(matches!(command_receiver.recv().await, Some(SyncCommand::Shutdown)));
    }

    #[tokio::test]
    async fn quit_line_stops_the_app() {
        let (command_sender, mut command_receiver) = mpsc::channel(8);
        let (_event_sender, event_receiver) = mpsc::channel(8);
        let app = ConsoleApp::new(SyncHandle::new(command_sender), event_receiver);

        app.run_with(BufReader::new(&b"more\nquit\n"[..])).await.unwrap();
        assert!(matches!(command_receiver.recv().await, Some(SyncCommand::LoadMore)));
        assert!(matches!(command_receiver.recv().await, Some(SyncCommand::Shutdown)));
    }
}
