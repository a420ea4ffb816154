use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rematch_api::secret::{SecretCache, SecretManager, SecretSource, SigningSecret};
use rematch_api::{ApiClient, ClientError, Platform, default_client, signing};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Deterministic secret source: `secret-0`, `secret-1`, ...
struct StaticSource {
    extractions: Arc<AtomicUsize>,
}

#[async_trait]
impl SecretSource for StaticSource {
    async fn extract(&self) -> rematch_api::Result<SigningSecret> {
        let n = self.extractions.fetch_add(1, Ordering::SeqCst);
        Ok(SigningSecret::new(
            format!("secret-{n}"),
            signing::epoch_millis()?,
        ))
    }
}

fn client_for(server_uri: &str, dir: &tempfile::TempDir) -> (ApiClient, Arc<AtomicUsize>) {
    let extractions = Arc::new(AtomicUsize::new(0));
    let source = StaticSource {
        extractions: extractions.clone(),
    };
    let manager = SecretManager::new(
        Box::new(source),
        SecretCache::new(dir.path().join(".secret-cache.json")),
        Duration::from_secs(24 * 60 * 60),
    );
    // Same bootstrap as production; a plain reqwest client has no TLS
    // provider under this feature set.
    let client = ApiClient::new(
        default_client(Duration::from_secs(5)),
        Arc::new(manager),
        server_uri,
    );
    (client, extractions)
}

#[derive(Clone)]
struct SignedHeaders {
    timestamp: String,
    nonce: String,
    signature: String,
}

struct RecorderState {
    hits: AtomicUsize,
    headers: Mutex<Vec<SignedHeaders>>,
    rejections: usize,
    reject_with: ResponseTemplate,
}

/// Records the signing headers of every request, rejects the first
/// `rejections` hits, then answers with a successful resolve payload.
#[derive(Clone)]
struct SignatureRecorder {
    state: Arc<RecorderState>,
}

impl SignatureRecorder {
    fn new(rejections: usize, reject_with: ResponseTemplate) -> Self {
        Self {
            state: Arc::new(RecorderState {
                hits: AtomicUsize::new(0),
                headers: Mutex::new(Vec::new()),
                rejections,
                reject_with,
            }),
        }
    }
}

fn header_value(request: &Request, name: &str) -> String {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

impl Respond for SignatureRecorder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.state.headers.lock().unwrap().push(SignedHeaders {
            timestamp: header_value(request, "x-timestamp"),
            nonce: header_value(request, "x-nonce"),
            signature: header_value(request, "x-signature"),
        });
        let hit = self.state.hits.fetch_add(1, Ordering::SeqCst);
        if hit < self.state.rejections {
            self.state.reject_with.clone()
        } else {
            ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "platform_id": "76561198000000001",
                "display_name": "Miltu"
            }))
        }
    }
}

#[tokio::test]
async fn unauthorized_triggers_one_reextraction_with_fresh_nonce() {
    let server = MockServer::start().await;
    let recorder = SignatureRecorder::new(1, ResponseTemplate::new(401));
    Mock::given(method("POST"))
        .and(path("/scrap/resolve"))
        .respond_with(recorder.clone())
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, extractions) = client_for(&server.uri(), &dir);

    let resolved = client.resolve(Platform::Steam, "miltu").await.unwrap();
    assert!(resolved.success);
    assert_eq!(resolved.platform_id.as_deref(), Some("76561198000000001"));

    // One extraction up front, one forced by the rejection.
    assert_eq!(extractions.load(Ordering::SeqCst), 2);

    let seen = recorder.state.headers.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].nonce, seen[1].nonce);
    assert_ne!(seen[0].signature, seen[1].signature);

    // Each attempt was signed with the secret of its era, over the exact
    // body bytes that were transmitted.
    let body =
        serde_json::to_string(&json!({ "platform": "steam", "identifier": "miltu" })).unwrap();
    for (attempt, secret) in seen.iter().zip(["secret-0", "secret-1"]) {
        let expected = signing::sign_request(
            secret.as_bytes(),
            "POST",
            "/scrap/resolve",
            Some(&body),
            attempt.timestamp.parse().unwrap(),
            &attempt.nonce,
        );
        assert_eq!(attempt.signature, expected);
    }
}

#[tokio::test]
async fn second_rejection_is_fatal_with_no_third_attempt() {
    let server = MockServer::start().await;
    let recorder = SignatureRecorder::new(usize::MAX, ResponseTemplate::new(401));
    Mock::given(method("POST"))
        .and(path("/scrap/resolve"))
        .respond_with(recorder.clone())
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, extractions) = client_for(&server.uri(), &dir);

    let err = client.resolve(Platform::Steam, "miltu").await.unwrap_err();
    assert!(matches!(err, ClientError::UnauthorizedRetryExhausted));
    assert_eq!(recorder.state.hits.load(Ordering::SeqCst), 2);
    assert_eq!(extractions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn application_level_unauthorized_payload_triggers_recovery() {
    let server = MockServer::start().await;
    let reject = ResponseTemplate::new(403).set_body_json(json!({ "error": "Unauthorized" }));
    let recorder = SignatureRecorder::new(1, reject);
    Mock::given(method("POST"))
        .and(path("/scrap/resolve"))
        .respond_with(recorder.clone())
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, extractions) = client_for(&server.uri(), &dir);

    let resolved = client.resolve(Platform::Steam, "miltu").await.unwrap();
    assert!(resolved.success);
    assert_eq!(recorder.state.hits.load(Ordering::SeqCst), 2);
    assert_eq!(extractions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn bare_paths_gain_a_leading_slash() {
    let server = MockServer::start().await;
    let recorder = SignatureRecorder::new(0, ResponseTemplate::new(401));
    Mock::given(method("POST"))
        .and(path("/scrap/resolve"))
        .respond_with(recorder.clone())
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, _extractions) = client_for(&server.uri(), &dir);

    let body = json!({ "platform": "steam", "identifier": "miltu" });
    let value = client.post("scrap/resolve", &body).await.unwrap();
    assert_eq!(value["success"], json!(true));

    // The signature covers the normalized path, not the bare one.
    let seen = recorder.state.headers.lock().unwrap().clone();
    let body_str = serde_json::to_string(&body).unwrap();
    let expected = signing::sign_request(
        b"secret-0",
        "POST",
        "/scrap/resolve",
        Some(&body_str),
        seen[0].timestamp.parse().unwrap(),
        &seen[0].nonce,
    );
    assert_eq!(seen[0].signature, expected);
}

#[tokio::test]
async fn non_auth_failures_propagate_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrap/profile"))
        .and(body_json(json!({ "platform": "psn", "platformId": "psn-1" })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, extractions) = client_for(&server.uri(), &dir);

    let err = client
        .profile(Platform::Playstation, "psn-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status(status) if status.as_u16() == 500));
    assert!(err.is_dataless_profile());
    assert_eq!(extractions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn recent_matches_unwraps_the_nested_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/matches"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "data": [ { "id": 1 }, { "id": 2 }, { "id": 3 }, { "id": 4 } ] }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, _extractions) = client_for(&server.uri(), &dir);

    let matches = client.recent_matches(3).await.unwrap();
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0], json!({ "id": 1 }));
}

#[tokio::test]
async fn recent_matches_degrades_to_empty_on_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/matches"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (client, _extractions) = client_for(&server.uri(), &dir);

    let matches = client.recent_matches(5).await.unwrap();
    assert!(matches.is_empty());
}
