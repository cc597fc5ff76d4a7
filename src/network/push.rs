use std::time::Duration;

use async_tungstenite::tungstenite::Message;
use async_tungstenite::tungstenite::client::IntoClientRequest;
use async_tungstenite::tungstenite::handshake::client::Request;
use async_tungstenite::tungstenite::http::header::{AUTHORIZATION, HeaderValue};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::common::WebSocketNotificationPayload;
use crate::error::PushError;

use super::session::AuthSession;

/// Message từ listener push gửi vào actor.
#[derive(Debug, Clone)]
pub enum PushMessage {
    Connected,
    Disconnected(String),
    Payload(WebSocketNotificationPayload),
}

/// Giữ một subscription WebSocket lâu dài và chuyển từng frame thành `PushMessage`.
pub struct PushListener {
    url: String,
    session: AuthSession,
    reconnect_delay: Duration,
    sender: mpsc::Sender<PushMessage>,
}

impl PushListener {
    pub fn new(
        url: impl Into<String>,
        session: AuthSession,
        reconnect_delay: Duration,
        sender: mpsc::Sender<PushMessage>,
    ) -> Self {
        Self {
            url: url.into(),
            session,
            reconnect_delay,
            sender,
        }
    }

    /// Runs until the receiving side is dropped, reconnecting after every disconnect.
    pub async fn run(self) {
        loop {
            let reason = match self.connect_once().await {
                Ok(()) => "connection closed".to_string(),
                Err(PushError::Unauthorized) => {
                    log::error!("Push channel rejected credentials; not reconnecting");
                    let _ = self
                        .sender
                        .send(PushMessage::Disconnected("unauthorized".to_string()))
                        .await;
                    return;
                }
                Err(err) => err.to_string(),
            };

            if self.sender.is_closed() {
                log::debug!("Push receiver dropped; listener exiting");
                return;
            }

            log::warn!(
                "Push channel down ({reason}); reconnecting in {}s",
                self.reconnect_delay.as_secs_f32()
            );
            if self
                .sender
                .send(PushMessage::Disconnected(reason))
                .await
                .is_err()
            {
                return;
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn connect_once(&self) -> Result<(), PushError> {
        let request = build_request(&self.url, &self.session)?;
        let (mut stream, _response) = async_tungstenite::tokio::connect_async(request).await?;
        log::info!("Push channel connected to {}", self.url);

        if self.sender.send(PushMessage::Connected).await.is_err() {
            return Ok(());
        }

        while let Some(frame) = stream.next().await {
            match frame? {
                Message::Text(text) => {
                    let Some(payload) = parse_frame(text.as_str()) else {
                        continue;
                    };
                    if self.sender.send(PushMessage::Payload(payload)).await.is_err() {
                        return Ok(());
                    }
                }
                Message::Close(frame) => {
                    log::info!("Push channel closed by server: {frame:?}");
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }
}

pub(crate) fn build_request(url: &str, session: &AuthSession) -> Result<Request, PushError> {
    let mut request = url
        .into_client_request()
        .map_err(|err| PushError::Request(err.to_string()))?;
    if let Some(bearer) = session.bearer() {
        let value =
            HeaderValue::from_str(&bearer).map_err(|err| PushError::Request(err.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    Ok(request)
}

/// Parses one text frame. Malformed frames are logged and dropped.
pub fn parse_frame(text: &str) -> Option<WebSocketNotificationPayload> {
    match serde_json::from_str::<WebSocketNotificationPayload>(text) {
        Ok(payload) => Some(payload),
        Err(err) => {
            log::warn!("Skipping malformed push frame ({err}): {text}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::NotificationType;
    use futures::SinkExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    async fn bind() -> (TcpListener, String) {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws/notifications", server.local_addr().unwrap());
        (server, url)
    }

    async fn accept(server: &TcpListener) -> TcpStream {
        timeout(WAIT, server.accept()).await.unwrap().unwrap().0
    }

    /// Reads the upgrade request and answers with a plain HTTP status.
    async fn refuse_upgrade(stream: &mut TcpStream, status: &str) -> String {
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buf).await.unwrap();
            if read == 0 {
                break;
            }
            head.extend_from_slice(&buf[..read]);
        }
        let response = format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        stream.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&head).into_owned()
    }

    async fn next(receiver: &mut mpsc::Receiver<PushMessage>) -> PushMessage {
        timeout(WAIT, receiver.recv())
            .await
            .expect("timed out waiting for push message")
            .expect("listener dropped the channel")
    }

    #[test]
    fn parses_valid_frame() {
        let frame = r#"{"type":"MENTION","content":"@you","timestamp":1717234200000,"read":false}"#;
        let payload = parse_frame(frame).unwrap();
        assert_eq!(payload.kind, NotificationType::Mention);
    }

    #[test]
    fn drops_malformed_frames() {
        assert!(parse_frame("ping").is_none());
        assert!(parse_frame(r#"{"type":"MENTION"}"#).is_none());
    }

    #[test]
    fn request_carries_bearer_token() {
        let session = AuthSession::new("tok", None);
        let request = build_request("wss://travel.example.com/ws/notifications", &session).unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer tok"
        );

        let anonymous = build_request("ws://localhost:8080/ws", &AuthSession::anonymous()).unwrap();
        assert!(anonymous.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn rejects_non_websocket_url() {
        assert!(matches!(
            build_request("not a url", &AuthSession::anonymous()),
            Err(PushError::Request(_))
        ));
    }

    #[tokio::test]
    async fn stops_when_credentials_are_rejected() {
        let (server, url) = bind().await;
        let (sender, mut receiver) = mpsc::channel(8);
        let listener = PushListener::new(
            url,
            AuthSession::new("stale", None),
            Duration::from_millis(10),
            sender,
        );
        let run = tokio::spawn(listener.run());

        let mut stream = accept(&server).await;
        let head = refuse_upgrade(&mut stream, "401 Unauthorized").await;
        assert!(head.to_ascii_lowercase().contains("authorization: bearer stale"));

        timeout(WAIT, run).await.unwrap().unwrap();
        match next(&mut receiver).await {
            PushMessage::Disconnected(reason) => assert_eq!(reason, "unauthorized"),
            other => panic!("unexpected message {other:?}"),
        }
        assert!(
            timeout(Duration::from_millis(100), server.accept())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn reconnects_and_forwards_frames() {
        let (server, url) = bind().await;
        let (sender, mut receiver) = mpsc::channel(8);
        let listener = PushListener::new(
            url,
            AuthSession::new("tok", None),
            Duration::from_millis(10),
            sender,
        );
        let run = tokio::spawn(listener.run());

        let mut stream = accept(&server).await;
        refuse_upgrade(&mut stream, "503 Service Unavailable").await;
        drop(stream);
        match next(&mut receiver).await {
            PushMessage::Disconnected(reason) => assert_ne!(reason, "unauthorized"),
            other => panic!("unexpected message {other:?}"),
        }

        let stream = accept(&server).await;
        let mut socket = async_tungstenite::tokio::accept_async(stream).await.unwrap();
        assert!(matches!(next(&mut receiver).await, PushMessage::Connected));

        socket.send(Message::Text("not json".into())).await.unwrap();
        socket
            .send(Message::Text(
                r#"{"notificationId":"n-1","type":"POST_SHARE","content":"Vy shared your trip","timestamp":1717234200000,"read":false}"#
                    .into(),
            ))
            .await
            .unwrap();
        match next(&mut receiver).await {
            PushMessage::Payload(payload) => {
                assert_eq!(payload.kind, NotificationType::PostShare);
                assert_eq!(payload.content, "Vy shared your trip");
            }
            other => panic!("unexpected message {other:?}"),
        }

        socket.close(None).await.unwrap();
        assert!(matches!(
            next(&mut receiver).await,
            PushMessage::Disconnected(_)
        ));

        let mut stream = accept(&server).await;
        refuse_upgrade(&mut stream, "401 Unauthorized").await;
        timeout(WAIT, run).await.unwrap().unwrap();
    }
}
