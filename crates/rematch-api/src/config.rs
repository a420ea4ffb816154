use std::path::PathBuf;
use std::time::Duration;

use crate::default::DEFAULT_UA;

pub const DEFAULT_API_BASE_URL: &str = "https://api.rematchtracker.com";
pub const DEFAULT_TRACKER_ORIGIN: &str = "https://www.rematchtracker.com";
pub const DEFAULT_CACHE_FILE: &str = ".secret-cache.json";

/// Configurable options for the tracker client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the stats API.
    pub api_base_url: String,

    /// Origin of the web application whose runtime imports the signing key.
    pub tracker_origin: String,

    /// Location of the persisted secret record.
    pub cache_path: PathBuf,

    /// Maximum age before a captured secret is considered expired.
    pub secret_ttl: Duration,

    /// Overall timeout for each HTTP request.
    pub http_timeout: Duration,

    /// How long to wait for the page's request helper during extraction.
    pub page_ready_timeout: Duration,

    /// Pause between the in-page trigger call and reading the captured key.
    pub capture_settle: Duration,

    /// User agent for the Steam community search requests.
    pub user_agent: String,

    /// Explicit Chromium executable for extraction; autodetected when unset.
    pub browser_executable: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            tracker_origin: DEFAULT_TRACKER_ORIGIN.to_owned(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            secret_ttl: Duration::from_secs(24 * 60 * 60),
            http_timeout: Duration::from_secs(30),
            page_ready_timeout: Duration::from_secs(15),
            capture_settle: Duration::from_secs(1),
            user_agent: DEFAULT_UA.to_owned(),
            browser_executable: None,
        }
    }
}

impl ClientConfig {
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_tracker_origin(mut self, origin: impl Into<String>) -> Self {
        self.tracker_origin = origin.into();
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_secret_ttl(mut self, ttl: Duration) -> Self {
        self.secret_ttl = ttl;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_browser_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.browser_executable = Some(path.into());
        self
    }
}
