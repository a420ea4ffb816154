use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::models::{MatchesEnvelope, ProfileResponse, ResolveResponse};
use crate::resolver::{Platform, ProfileApi};
use crate::secret::{SecretManager, SigningSecret};
use crate::signing;

/// Signed-request executor for the stats API.
///
/// Every call carries `x-timestamp`, `x-nonce` and `x-signature` headers
/// computed from the current signing secret. A 401 (or an application-level
/// "Unauthorized" payload) invalidates the secret, forces one re-extraction
/// and retries the call exactly once with a fresh timestamp and nonce. A
/// second rejection is fatal. Callers must tolerate browser-automation
/// latency on that recovery path.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    secrets: Arc<SecretManager>,
    base_url: String,
}

impl ApiClient {
    pub fn new(http: Client, secrets: Arc<SecretManager>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http,
            secrets,
            base_url,
        }
    }

    /// Issues a signed request. `path` may carry a query string and is
    /// normalized to a leading slash; the normalized form is what gets
    /// signed, and the body is signed as the exact string transmitted.
    pub async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let path = normalize_path(path);
        let body_str = body.map(serde_json::to_string).transpose()?;

        let secret = self.secrets.ensure().await?;
        let (status, text) = self
            .send_signed(&method, &path, body_str.as_deref(), &secret)
            .await?;

        if !is_unauthorized(status, &text) {
            return parse_body(status, text);
        }

        debug!(%path, "signature rejected; re-extracting signing secret");
        self.secrets.invalidate().await;
        let secret = self.secrets.ensure().await?;
        let (status, text) = self
            .send_signed(&method, &path, body_str.as_deref(), &secret)
            .await?;

        if is_unauthorized(status, &text) {
            return Err(ClientError::UnauthorizedRetryExhausted);
        }
        parse_body(status, text)
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::DELETE, path, None).await
    }

    /// Maps a human identifier to the platform's internal ID.
    pub async fn resolve(&self, platform: Platform, identifier: &str) -> Result<ResolveResponse> {
        let body = json!({ "platform": platform.as_str(), "identifier": identifier });
        let value = self.post("/scrap/resolve", &body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetches the full profile for a resolved platform ID. Note the profile
    /// endpoint's platform naming differs from resolve's.
    pub async fn profile(&self, platform: Platform, platform_id: &str) -> Result<ProfileResponse> {
        let body = json!({ "platform": platform.api_name(), "platformId": platform_id });
        let value = self.post("/scrap/profile", &body).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Newest tracked matches across all players. Degrades to an empty list
    /// on upstream trouble; only service-level failures surface.
    pub async fn recent_matches(&self, limit: usize) -> Result<Vec<Value>> {
        let value = match self.get("/matches?page=1").await {
            Ok(value) => value,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "recent matches fetch failed");
                return Ok(Vec::new());
            }
        };
        let envelope: MatchesEnvelope = serde_json::from_value(value).unwrap_or_default();
        Ok(envelope.data.data.into_iter().take(limit).collect())
    }

    async fn send_signed(
        &self,
        method: &Method,
        path: &str,
        body: Option<&str>,
        secret: &SigningSecret,
    ) -> Result<(StatusCode, String)> {
        let timestamp = signing::epoch_millis()?;
        let nonce = signing::new_nonce();
        let signature = signing::sign_request(
            secret.as_bytes(),
            method.as_str(),
            path,
            body,
            timestamp,
            &nonce,
        );

        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("x-timestamp", timestamp.to_string())
            .header("x-nonce", &nonce)
            .header("x-signature", &signature);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_owned());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

#[async_trait]
impl ProfileApi for ApiClient {
    async fn resolve(&self, platform: Platform, identifier: &str) -> Result<ResolveResponse> {
        ApiClient::resolve(self, platform, identifier).await
    }

    async fn profile(&self, platform: Platform, platform_id: &str) -> Result<ProfileResponse> {
        ApiClient::profile(self, platform, platform_id).await
    }
}

/// Endpoints are addressed by path only; a missing leading slash would
/// splice the path into the host. Normalized before signing so the signed
/// and transmitted forms agree.
fn normalize_path(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    }
}

/// The API signals auth failures both as a bare 401 and as an error payload
/// on other 4xx statuses. The payload check is scoped to 4xx: a 5xx with
/// the same payload stays a status failure and lands on the dataless-500
/// rule, not auth recovery.
fn is_unauthorized(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::UNAUTHORIZED {
        return true;
    }
    if !status.is_client_error() {
        return false;
    }
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.as_str())
                .map(|e| e == "Unauthorized")
        })
        .unwrap_or(false)
}

fn parse_body(status: StatusCode, text: String) -> Result<Value> {
    if !status.is_success() {
        return Err(ClientError::Status(status));
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
