use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::models::{ProfileResponse, ResolveResponse};
use crate::profile::PlayerProfile;
use crate::steam::SteamCandidate;

/// Attempt ceiling across Steam candidates within one multi-platform search,
/// counting the first candidate.
const MAX_STEAM_ATTEMPTS: usize = 20;

/// Platforms the stats API can resolve identities on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Steam,
    Playstation,
    Xbox,
}

impl Platform {
    /// Name used in `/scrap/resolve` payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Steam => "steam",
            Platform::Playstation => "playstation",
            Platform::Xbox => "xbox",
        }
    }

    /// Name used in `/scrap/profile` payloads. The profile endpoint expects
    /// `psn` where resolve expects `playstation`.
    pub fn api_name(self) -> &'static str {
        match self {
            Platform::Playstation => "psn",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "steam" => Ok(Platform::Steam),
            "playstation" | "psn" => Ok(Platform::Playstation),
            "xbox" => Ok(Platform::Xbox),
            other => Err(ClientError::UnknownPlatform(other.to_owned())),
        }
    }
}

/// Upstream resolve/profile operations used by the cascade. Split from the
/// HTTP client so scripted fakes can drive cascade tests.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn resolve(&self, platform: Platform, identifier: &str) -> Result<ResolveResponse>;
    async fn profile(&self, platform: Platform, platform_id: &str) -> Result<ProfileResponse>;
}

/// Candidate lookup for free-text aliases. Must not fail; no candidates is
/// an empty list.
#[async_trait]
pub trait CandidateSearch: Send + Sync {
    async fn candidates(&self, alias: &str) -> Vec<SteamCandidate>;
}

/// Multi-platform identity resolution over the stats API.
pub struct Resolver<A, S> {
    api: A,
    search: S,
}

impl<A: ProfileApi, S: CandidateSearch> Resolver<A, S> {
    pub fn new(api: A, search: S) -> Self {
        Self { api, search }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Resolves a plain username on Steam. Misses and dataless identities
    /// yield `None`.
    pub async fn search_user(&self, username: &str) -> Result<Option<PlayerProfile>> {
        self.resolve_and_fetch(Platform::Steam, username).await
    }

    /// Resolve + profile on one platform, with `username` as the literal
    /// platform identifier.
    pub async fn search_user_by_platform(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<Option<PlayerProfile>> {
        self.resolve_and_fetch(platform, username).await
    }

    /// Full fallback cascade: first Steam candidate, PlayStation, Xbox, then
    /// the remaining Steam candidates. Short-circuits on the first profile.
    /// `None` means the identity was not found anywhere; that is a valid
    /// terminal outcome, not an error.
    pub async fn search_user_multi_platform(
        &self,
        username: &str,
    ) -> Result<Option<PlayerProfile>> {
        info!(username, "multi-platform search");
        let candidates = self.search.candidates(username).await;
        debug!(count = candidates.len(), "steam candidates");

        if let Some(first) = candidates.first() {
            debug!(candidate = %first, "trying first steam candidate");
            if let Some(profile) = self.try_candidate(first).await? {
                return Ok(Some(profile));
            }
        }

        for platform in [Platform::Playstation, Platform::Xbox] {
            debug!(%platform, "trying platform");
            if let Some(profile) = self.resolve_and_fetch(platform, username).await? {
                return Ok(Some(profile));
            }
        }

        let max_attempts = MAX_STEAM_ATTEMPTS.min(candidates.len());
        for candidate in candidates.iter().take(max_attempts).skip(1) {
            debug!(candidate = %candidate, "trying steam candidate");
            if let Some(profile) = self.try_candidate(candidate).await? {
                return Ok(Some(profile));
            }
        }

        info!(username, "no profile found on any platform");
        Ok(None)
    }

    /// Match history for a Steam username. `None` when the identity resolves
    /// to nothing or the profile carries no history block.
    pub async fn player_match_history(&self, username: &str) -> Result<Option<Vec<Value>>> {
        let resolved = match self.api.resolve(Platform::Steam, username).await {
            Ok(resolved) => resolved,
            Err(e) => return absorb(e, Platform::Steam, username),
        };
        if !resolved.success {
            return Ok(None);
        }
        let Some(platform_id) = resolved.platform_id else {
            return Ok(None);
        };

        let response = match self.api.profile(Platform::Steam, &platform_id).await {
            Ok(response) => response,
            Err(e) => return absorb(e, Platform::Steam, &platform_id),
        };
        if !response.success {
            return Ok(None);
        }
        Ok(response.match_history.map(|history| history.items))
    }

    /// Numeric candidates go straight to the profile endpoint; vanity names
    /// resolve through their community URL first.
    async fn try_candidate(&self, candidate: &SteamCandidate) -> Result<Option<PlayerProfile>> {
        match candidate {
            SteamCandidate::Profile(id) => self.fetch_profile(Platform::Steam, id).await,
            SteamCandidate::Vanity(name) => {
                let identifier = format!("steamcommunity.com/id/{name}");
                self.resolve_and_fetch(Platform::Steam, &identifier).await
            }
        }
    }

    async fn resolve_and_fetch(
        &self,
        platform: Platform,
        identifier: &str,
    ) -> Result<Option<PlayerProfile>> {
        let resolved = match self.api.resolve(platform, identifier).await {
            Ok(resolved) => resolved,
            Err(e) => return absorb(e, platform, identifier),
        };
        if !resolved.success {
            debug!(%platform, identifier, "resolve reported no match");
            return Ok(None);
        }
        let Some(platform_id) = resolved.platform_id else {
            debug!(%platform, identifier, "resolve succeeded without a platform id");
            return Ok(None);
        };

        self.fetch_profile(platform, &platform_id).await
    }

    async fn fetch_profile(
        &self,
        platform: Platform,
        platform_id: &str,
    ) -> Result<Option<PlayerProfile>> {
        match self.api.profile(platform, platform_id).await {
            Ok(response) => Ok(PlayerProfile::from_response(response)),
            Err(e) => absorb(e, platform, platform_id),
        }
    }
}

/// Folds a per-platform failure into a miss so the cascade can continue.
/// Only fatal service errors (failed extraction, exhausted auth retry) pass
/// through.
fn absorb<T>(error: ClientError, platform: Platform, identifier: &str) -> Result<Option<T>> {
    if error.is_fatal() {
        return Err(error);
    }
    if error.is_dataless_profile() {
        debug!(%platform, identifier, "identity exists but has no tracked data");
    } else {
        warn!(%platform, identifier, error = %error, "platform lookup failed");
    }
    Ok(None)
}
