use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use futures::StreamExt;
use tracing::{debug, info};

use super::{SecretSource, SigningSecret};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::signing;

/// Installed before any page script runs. Wraps the WebCrypto key import so
/// that the raw key material of the page's own HMAC import lands in a slot
/// we can read back; the call itself is forwarded unchanged.
const IMPORT_KEY_HOOK: &str = r#"
(() => {
    const original = crypto.subtle.importKey.bind(crypto.subtle);
    crypto.subtle.importKey = function (format, keyData, algorithm, extractable, keyUsages) {
        try {
            const name = typeof algorithm === 'string' ? algorithm : (algorithm && algorithm.name) || '';
            if (name.toUpperCase() === 'HMAC' && keyData) {
                let text = null;
                if (typeof keyData === 'string') {
                    text = keyData;
                } else if (keyData instanceof Uint8Array) {
                    text = new TextDecoder().decode(keyData);
                } else if (keyData instanceof ArrayBuffer) {
                    text = new TextDecoder().decode(new Uint8Array(keyData));
                }
                if (text) {
                    window.__capturedHmacKey = text;
                }
            }
        } catch (e) {}
        return original(format, keyData, algorithm, extractable, keyUsages);
    };
})();
"#;

/// One harmless in-page request; the app imports its signing key to sign it.
const TRIGGER_CALL: &str =
    "window.api.post('/scrap/resolve', { platform: 'steam', identifier: 'test' }).catch(() => {})";

const PAGE_API_PROBE: &str = "typeof window.api !== 'undefined'";

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Captures the signing secret by instrumenting a headless Chromium session
/// on the tracker origin.
pub struct ChromiumSniffer {
    origin: String,
    page_ready_timeout: Duration,
    capture_settle: Duration,
    executable: Option<PathBuf>,
}

impl ChromiumSniffer {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            origin: config.tracker_origin.clone(),
            page_ready_timeout: config.page_ready_timeout,
            capture_settle: config.capture_settle,
            executable: config.browser_executable.clone(),
        }
    }

    async fn capture(&self, browser: &Browser) -> Result<String> {
        let page = browser.new_page("about:blank").await?;

        let hook = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(IMPORT_KEY_HOOK)
            .build()
            .map_err(ClientError::ExtractionFailed)?;
        page.execute(hook).await?;

        page.goto(self.origin.as_str()).await?;
        self.wait_for_page_api(&page).await?;

        let trigger = EvaluateParams::builder()
            .expression(TRIGGER_CALL)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(ClientError::ExtractionFailed)?;
        if let Err(e) = page.evaluate(trigger).await {
            debug!(error = %e, "trigger call failed; key may still have been imported");
        }

        tokio::time::sleep(self.capture_settle).await;

        let result = page.evaluate("window.__capturedHmacKey || null").await?;
        result
            .value()
            .and_then(|value| value.as_str())
            .filter(|key| !key.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| {
                ClientError::ExtractionFailed(
                    "no HMAC key import observed on the page".to_string(),
                )
            })
    }

    /// Bounded wait for the page's request helper; fails fast instead of
    /// hanging when the app never boots.
    async fn wait_for_page_api(&self, page: &Page) -> Result<()> {
        let deadline = tokio::time::Instant::now() + self.page_ready_timeout;
        loop {
            let ready = page
                .evaluate(PAGE_API_PROBE)
                .await
                .ok()
                .and_then(|result| result.value().and_then(|value| value.as_bool()))
                .unwrap_or(false);
            if ready {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ClientError::ExtractionFailed(
                    "page request helper never became available".to_string(),
                ));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl SecretSource for ChromiumSniffer {
    async fn extract(&self) -> Result<SigningSecret> {
        info!(origin = %self.origin, "launching headless browser to capture signing key");

        let mut builder = BrowserConfig::builder().no_sandbox();
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(ClientError::BrowserLaunch)?;

        let (mut browser, mut handler) = Browser::launch(browser_config).await?;
        let driver = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let outcome = self.capture(&browser).await;

        // The browser is torn down on success and failure alike.
        if let Err(e) = browser.close().await {
            debug!(error = %e, "browser close failed");
        }
        let _ = browser.wait().await;
        driver.abort();

        let value = outcome?;
        let acquired_at = signing::epoch_millis()?;
        info!(bytes = value.len(), "captured signing key");
        Ok(SigningSecret::new(value, acquired_at))
    }
}
