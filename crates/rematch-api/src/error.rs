use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("browser launch error: {0}")]
    BrowserLaunch(String),
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("unauthorized after signature refresh")]
    UnauthorizedRetryExhausted,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {0}")]
    Status(StatusCode),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("other: {0}")]
    Other(String),
}

impl ClientError {
    /// Errors that must stop a resolution cascade instead of being folded
    /// into a per-platform miss.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClientError::ExtractionFailed(_)
                | ClientError::BrowserLaunch(_)
                | ClientError::Cdp(_)
                | ClientError::UnauthorizedRetryExhausted
        )
    }

    /// The stats API answers 500 for identities that exist but were never
    /// tracked. Upstream quirk, kept behind this one predicate.
    pub fn is_dataless_profile(&self) -> bool {
        matches!(self, ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_split() {
        assert!(ClientError::UnauthorizedRetryExhausted.is_fatal());
        assert!(ClientError::ExtractionFailed("no key".into()).is_fatal());
        assert!(!ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR).is_fatal());
        assert!(!ClientError::Status(StatusCode::NOT_FOUND).is_fatal());
        assert!(!ClientError::Other("whatever".into()).is_fatal());
    }

    #[test]
    fn only_500_is_dataless() {
        assert!(ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR).is_dataless_profile());
        assert!(!ClientError::Status(StatusCode::NOT_FOUND).is_dataless_profile());
        assert!(!ClientError::UnauthorizedRetryExhausted.is_dataless_profile());
    }
}
