use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::common::{Notification, NotificationDraft, NotificationId, Page};
use crate::error::ApiError;

use super::api::NotificationApi;
use super::session::AuthSession;

/// Một số endpoint bọc kết quả trong `{ "data": ... }`, số khác trả thẳng.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UnreadCount {
    Number(u64),
    Count { count: u64 },
    #[serde(rename_all = "camelCase")]
    Unread { unread_count: u64 },
}

impl UnreadCount {
    fn value(self) -> u64 {
        match self {
            UnreadCount::Number(count)
            | UnreadCount::Count { count }
            | UnreadCount::Unread {
                unread_count: count,
            } => count,
        }
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    Ok(envelope.into_inner())
}

/// `NotificationApi` over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpNotificationApi {
    client: Client,
    base_url: Url,
    session: AuthSession,
}

impl HttpNotificationApi {
    pub fn new(base_url: &str, session: AuthSession, timeout: Duration) -> Result<Self, ApiError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url =
            Url::parse(&normalized).map_err(|_| ApiError::InvalidUrl(base_url.to_string()))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::InvalidUrl(format!("{}{path}", self.base_url)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        let mut builder = self.client.request(method, url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::debug!("Notification API error {status}: {body}");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(builder).await?;
        decode_body(&body)
    }
}

fn item_path(id: &NotificationId) -> String {
    format!("notifications/{id}")
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Page<Notification>, ApiError> {
        let builder = self
            .request(Method::GET, "notifications/me")?
            .query(&[("page", page), ("pageSize", page_size)]);
        self.send_json(builder).await
    }

    async fn unread_count(&self) -> Result<u64, ApiError> {
        let builder = self.request(Method::GET, "notifications/me/unread-count")?;
        let count: UnreadCount = self.send_json(builder).await?;
        Ok(count.value())
    }

    async fn mark_as_read(&self, id: &NotificationId) -> Result<(), ApiError> {
        let builder = self.request(Method::PATCH, &format!("{}/read", item_path(id)))?;
        self.send(builder).await.map(|_| ())
    }

    async fn mark_all_as_read(&self) -> Result<(), ApiError> {
        let builder = self.request(Method::PATCH, "notifications/me/read-all")?;
        self.send(builder).await.map(|_| ())
    }

    async fn create(&self, draft: &NotificationDraft) -> Result<Notification, ApiError> {
        let builder = self.request(Method::POST, "notifications")?.json(draft);
        self.send_json(builder).await
    }

    async fn update(
        &self,
        id: &NotificationId,
        draft: &NotificationDraft,
    ) -> Result<Notification, ApiError> {
        let builder = self.request(Method::PUT, &item_path(id))?.json(draft);
        self.send_json(builder).await
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &item_path(id))?;
        self.send(builder).await.map(|_| ())
    }
}
