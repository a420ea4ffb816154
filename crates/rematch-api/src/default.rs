use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use rustls::{ClientConfig as TlsConfig, crypto::ring};
use rustls_platform_verifier::BuilderVerifierExt;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::resolver::Resolver;
use crate::secret::{ChromiumSniffer, SecretCache, SecretManager};
use crate::steam::SteamSearch;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

pub fn default_client(timeout: Duration) -> Client {
    let provider = Arc::new(ring::default_provider());
    let tls_config = TlsConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("Failed to configure default TLS protocol versions")
        .with_platform_verifier()
        .unwrap()
        .with_no_client_auth();

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client")
}

/// Wires the production stack: headless-browser secret source, disk cache,
/// signed API client and Steam candidate search.
pub fn default_resolver(config: ClientConfig) -> Resolver<ApiClient, SteamSearch> {
    let http = default_client(config.http_timeout);

    let sniffer = ChromiumSniffer::new(&config);
    let cache = SecretCache::new(config.cache_path.clone());
    let secrets = Arc::new(SecretManager::new(
        Box::new(sniffer),
        cache,
        config.secret_ttl,
    ));

    let api = ApiClient::new(http.clone(), secrets, config.api_base_url.clone());
    let steam = SteamSearch::new(http, config.user_agent.clone());
    Resolver::new(api, steam)
}
