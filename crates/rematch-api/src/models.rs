//! Wire models for the stats API. Fields default aggressively: the upstream
//! omits blocks freely and absent data must read as "nothing tracked", not a
//! parse failure.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// `POST /scrap/resolve` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub platform_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// `POST /scrap/profile` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub player: Option<PlayerInfo>,
    #[serde(default)]
    pub rank: Option<RankInfo>,
    #[serde(default)]
    pub rank3v3: Option<RankInfo>,
    /// Keyed by playlist; the aggregate lives under `"All"`.
    #[serde(default)]
    pub lifetime_stats: HashMap<String, PlaylistStats>,
    #[serde(default)]
    pub match_history: Option<MatchHistory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInfo {
    pub platform_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RankInfo {
    #[serde(default = "unranked_league")]
    pub current_league: i64,
    #[serde(default = "unranked_division")]
    pub current_division: i64,
}

impl Default for RankInfo {
    fn default() -> Self {
        Self {
            current_league: unranked_league(),
            current_division: unranked_division(),
        }
    }
}

fn unranked_league() -> i64 {
    -1
}

fn unranked_division() -> i64 {
    3
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PlaylistStats {
    #[serde(default)]
    pub goals: u64,
    #[serde(default)]
    pub assists: u64,
    #[serde(default)]
    pub matches_played: u64,
    #[serde(default)]
    pub mvps: u64,
    #[serde(default)]
    pub passes: u64,
    #[serde(default)]
    pub intercepted_passes: u64,
    #[serde(default)]
    pub saves: u64,
    #[serde(default)]
    pub wins: u64,
}

/// Per-player match history, most recent first. Items are kept untyped; the
/// upstream shape varies per game mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchHistory {
    #[serde(default)]
    pub items: Vec<Value>,
}

/// `GET /matches?page=N` envelope: the match list sits two `data` levels deep.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchesEnvelope {
    #[serde(default)]
    pub data: MatchesPage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchesPage {
    #[serde(default)]
    pub data: Vec<Value>,
}
