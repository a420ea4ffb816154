use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, ORIGIN, SET_COOKIE, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::resolver::CandidateSearch;

const SEARCH_PAGE_URL: &str = "https://steamcommunity.com/search/users/";
const SEARCH_AJAX_URL: &str = "https://steamcommunity.com/search/SearchCommunityAjax";

/// Most candidates returned from one alias search.
pub const MAX_CANDIDATES: usize = 10;

static PROFILE_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://steamcommunity\.com/(?:profiles/(\d{17})|id/([a-zA-Z0-9_-]+))").unwrap()
});

/// A profile link pulled out of community search results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SteamCandidate {
    /// 17-digit SteamID64 from a `/profiles/` link; usable directly.
    Profile(String),
    /// Vanity name from an `/id/` link; must be resolved first.
    Vanity(String),
}

impl SteamCandidate {
    pub fn value(&self) -> &str {
        match self {
            SteamCandidate::Profile(id) => id,
            SteamCandidate::Vanity(name) => name,
        }
    }
}

impl fmt::Display for SteamCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SteamCandidate::Profile(id) => write!(f, "{id}"),
            SteamCandidate::Vanity(name) => write!(f, "custom:{name}"),
        }
    }
}

/// Scans a search-result HTML fragment for profile links. First-seen order,
/// deduplicated, capped at [`MAX_CANDIDATES`].
pub fn parse_candidates(html: &str) -> Vec<SteamCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for caps in PROFILE_LINK_REGEX.captures_iter(html) {
        let candidate = if let Some(id) = caps.get(1) {
            SteamCandidate::Profile(id.as_str().to_owned())
        } else if let Some(name) = caps.get(2) {
            SteamCandidate::Vanity(name.as_str().to_owned())
        } else {
            continue;
        };

        if seen.insert(candidate.clone()) {
            candidates.push(candidate);
            if candidates.len() == MAX_CANDIDATES {
                break;
            }
        }
    }

    candidates
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(SET_COOKIE).iter() {
        if let Ok(cookie) = value.to_str()
            && let Some(pair) = cookie.split(';').next()
            && let Some((name, value)) = pair.split_once('=')
            && name.trim() == "sessionid"
        {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}

#[derive(Deserialize)]
struct SearchFragment {
    #[serde(default)]
    html: String,
}

/// Community user search: an unauthenticated page fetch yields a session
/// cookie, which authorizes one AJAX search returning an HTML fragment.
/// Any transport or parse trouble degrades to an empty candidate list.
#[derive(Clone)]
pub struct SteamSearch {
    http: Client,
    user_agent: String,
}

impl SteamSearch {
    pub fn new(http: Client, user_agent: impl Into<String>) -> Self {
        Self {
            http,
            user_agent: user_agent.into(),
        }
    }

    pub async fn search(&self, alias: &str) -> Vec<SteamCandidate> {
        match self.try_search(alias).await {
            Ok(candidates) => {
                debug!(alias, count = candidates.len(), "steam search finished");
                candidates
            }
            Err(e) => {
                warn!(alias, error = %e, "steam search failed");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, alias: &str) -> Result<Vec<SteamCandidate>> {
        let Some(session_id) = self.fetch_session_id().await? else {
            debug!("no sessionid cookie on the search page response");
            return Ok(Vec::new());
        };

        let response = self
            .http
            .get(SEARCH_AJAX_URL)
            .query(&[
                ("text", alias),
                ("filter", "users"),
                ("sessionid", session_id.as_str()),
                ("steamid_user", "false"),
                ("page", "1"),
            ])
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ORIGIN, "https://steamcommunity.com")
            .header(COOKIE, format!("sessionid={session_id}"))
            .send()
            .await?;

        let fragment: SearchFragment = response.json().await?;
        Ok(parse_candidates(&fragment.html))
    }

    async fn fetch_session_id(&self) -> Result<Option<String>> {
        let response = self
            .http
            .get(SEARCH_PAGE_URL)
            .header(USER_AGENT, &self.user_agent)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await?;
        Ok(session_id_from_headers(response.headers()))
    }
}

#[async_trait]
impl CandidateSearch for SteamSearch {
    async fn candidates(&self, alias: &str) -> Vec<SteamCandidate> {
        self.search(alias).await
    }
}
