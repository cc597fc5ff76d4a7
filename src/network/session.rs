use std::fmt;

use crate::common::Id;

/// Auth context cho các request REST và kênh push.
///
/// Được truyền vào lúc khởi tạo thay vì đọc từ state toàn cục.
#[derive(Clone, Default)]
pub struct AuthSession {
    token: Option<String>,
    user_id: Option<Id>,
}

impl AuthSession {
    pub fn new(token: impl Into<String>, user_id: Option<Id>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
            user_id,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user_id(&self) -> Option<&Id> {
        self.user_id.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .finish()
    }
}
