use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::Id;
use crate::error::ConfigError;
use crate::network::AuthSession;
use crate::sync::{MergePolicy, SyncOptions};

pub const DEFAULT_CONFIG_PATH: &str = "config/notification_sync.json";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub ws_url: String,
    pub page_size: u32,
    /// Hoàn tác cập nhật lạc quan khi mutation thất bại.
    pub rollback_on_failure: bool,
    pub merge_policy: MergePolicy,
    pub alert_sound: bool,
    pub push_reconnect_secs: u64,
    pub request_timeout_secs: u64,
    pub cache_path: Option<String>,
    /// Thường lấy từ `NOTIFY_TOKEN` thay vì ghi vào file.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub user_id: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            ws_url: "ws://localhost:8080/ws/notifications".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            rollback_on_failure: true,
            merge_policy: MergePolicy::Append,
            alert_sound: true,
            push_reconnect_secs: 5,
            request_timeout_secs: 15,
            cache_path: Some("data/notifications.db".to_string()),
            token: None,
            user_id: None,
        }
    }
}

impl AppConfig {
    /// Biến môi trường (kể cả từ `.env`) ghi đè giá trị trong file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("NOTIFY_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = lookup("NOTIFY_WS_URL") {
            self.ws_url = url;
        }
        if let Some(token) = lookup("NOTIFY_TOKEN") {
            self.token = Some(token);
        }
        if let Some(user_id) = lookup("NOTIFY_USER_ID") {
            self.user_id = Some(user_id);
        }
        if let Some(raw) = lookup("NOTIFY_PAGE_SIZE") {
            match raw.parse() {
                Ok(size) => self.page_size = size,
                Err(err) => log::warn!("Ignoring NOTIFY_PAGE_SIZE `{raw}`: {err}"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "api_base_url `{}` must be an http(s) url",
                self.api_base_url
            )));
        }
        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "ws_url `{}` must be a ws(s) url",
                self.ws_url
            )));
        }
        Ok(())
    }

    pub fn session(&self) -> AuthSession {
        AuthSession::new(
            self.token.clone().unwrap_or_default(),
            self.user_id.clone().map(Id::from),
        )
    }

    /// Session for the live feed, which needs a token to do anything.
    pub fn signed_in_session(&self) -> Result<AuthSession, ConfigError> {
        let session = self.session();
        if session.is_authenticated() {
            Ok(session)
        } else {
            Err(ConfigError::MissingToken)
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            page_size: self.page_size,
            rollback_on_failure: self.rollback_on_failure,
            merge_policy: self.merge_policy,
            alert_sound: self.alert_sound,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn push_reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.push_reconnect_secs.max(1))
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}
