use async_tungstenite::tungstenite::{self, http::StatusCode};
use thiserror::Error;

/// Lỗi khi gọi REST API thông báo.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url `{0}`")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}

#[derive(Error, Debug)]
pub enum PushError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid push request: {0}")]
    Request(String),
    #[error("{0}")]
    Protocol(tungstenite::Error),
}

impl From<tungstenite::Error> for PushError {
    fn from(error: tungstenite::Error) -> Self {
        if let tungstenite::Error::Http(response) = &error {
            if response.status() == StatusCode::UNAUTHORIZED {
                return PushError::Unauthorized;
            }
        }
        PushError::Protocol(error)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("not signed in: set NOTIFY_TOKEN or `token` in the config file")]
    MissingToken,
}

/// Returned by `SyncHandle` once the actor has stopped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("notification sync has shut down")]
pub struct SyncClosed;

#[cfg(test)]
mod tests {
    use super::*;
    use async_tungstenite::tungstenite::http::Response;

    fn http_error(status: u16) -> tungstenite::Error {
        tungstenite::Error::Http(Response::builder().status(status).body(None).unwrap())
    }

    #[test]
    fn rejected_upgrade_maps_to_unauthorized() {
        assert!(matches!(PushError::from(http_error(401)), PushError::Unauthorized));
        assert!(matches!(
            PushError::from(http_error(503)),
            PushError::Protocol(tungstenite::Error::Http(_))
        ));
        assert!(matches!(
            PushError::from(tungstenite::Error::ConnectionClosed),
            PushError::Protocol(_)
        ));
    }

    #[test]
    fn only_401_status_is_unauthorized() {
        let expired = ApiError::Status {
            status: 401,
            body: String::new(),
        };
        let forbidden = ApiError::Status {
            status: 403,
            body: String::new(),
        };
        assert!(expired.is_unauthorized());
        assert!(!forbidden.is_unauthorized());
    }
}
