use thiserror::Error;

pub type Result<T> = std::result::Result<T, CloudError>;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("{action} returned HTTP {status}: code={code}, message={message}")]
    Http {
        action: String,
        status: u16,
        code: String,
        message: String,
    },
    #[error("{action} returned code {code}: {message}")]
    Api {
        action: String,
        code: String,
        message: String,
    },
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("{action} response decode error: {source}")]
    Decode {
        action: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("request signing error: {0}")]
    Signing(String),
}

impl CloudError {
    /// Backend status code when the failure carried one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Http { code, .. } | Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}
