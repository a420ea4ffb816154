use serde::Serialize;
use serde_json::Value;

use crate::models::{PlaylistStats, ProfileResponse};
use crate::rank::{RankSummary, rank_summary};

/// A resolved player: identity, ranks, lifetime stats and whatever match
/// history the profile carried. Assembled per lookup, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerProfile {
    pub platform_id: String,
    pub display_name: String,
    pub platform: String,
    pub rank: RankSummary,
    pub rank_3v3: RankSummary,
    pub stats: LifetimeStats,
    /// Most recent first; empty when the profile carried no history block.
    pub match_history: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LifetimeStats {
    pub goals: u64,
    pub assists: u64,
    pub matches_played: u64,
    pub mvps: u64,
    pub passes: u64,
    pub interceptions: u64,
    pub saves: u64,
    pub wins: u64,
    pub win_rate: f64,
}

impl From<PlaylistStats> for LifetimeStats {
    fn from(stats: PlaylistStats) -> Self {
        let win_rate = if stats.matches_played > 0 {
            stats.wins as f64 / stats.matches_played as f64
        } else {
            0.0
        };
        Self {
            goals: stats.goals,
            assists: stats.assists,
            matches_played: stats.matches_played,
            mvps: stats.mvps,
            passes: stats.passes,
            interceptions: stats.intercepted_passes,
            saves: stats.saves,
            wins: stats.wins,
            win_rate,
        }
    }
}

impl PlayerProfile {
    /// Builds a profile from an upstream response. `None` when the response
    /// reports failure or carries no player block; the display name falls
    /// back to the platform id.
    pub fn from_response(response: ProfileResponse) -> Option<Self> {
        if !response.success {
            return None;
        }
        let player = response.player?;

        let stats = response
            .lifetime_stats
            .get("All")
            .copied()
            .unwrap_or_default();
        let display_name = player
            .display_name
            .unwrap_or_else(|| player.platform_id.clone());
        let match_history = response
            .match_history
            .map(|history| history.items)
            .unwrap_or_default();

        Some(Self {
            platform_id: player.platform_id,
            display_name,
            platform: player.platform.unwrap_or_default(),
            rank: rank_summary(response.rank.unwrap_or_default()),
            rank_3v3: rank_summary(response.rank3v3.unwrap_or_default()),
            stats: LifetimeStats::from(stats),
            match_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> ProfileResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_profile_round_trip() {
        let profile = PlayerProfile::from_response(response(json!({
            "success": true,
            "player": {
                "platform_id": "76561198000000001",
                "display_name": "Miltu",
                "platform": "steam"
            },
            "rank": { "current_league": 3, "current_division": 1 },
            "rank3v3": { "current_league": -1, "current_division": 3 },
            "lifetime_stats": {
                "All": {
                    "goals": 10,
                    "assists": 4,
                    "matches_played": 20,
                    "mvps": 3,
                    "passes": 50,
                    "intercepted_passes": 7,
                    "saves": 12,
                    "wins": 10
                },
                "Ranked5v5": { "goals": 2 }
            },
            "match_history": { "items": [ { "id": "m1" }, { "id": "m2" } ] }
        })))
        .unwrap();

        assert_eq!(profile.platform_id, "76561198000000001");
        assert_eq!(profile.display_name, "Miltu");
        assert_eq!(profile.platform, "steam");
        assert_eq!(profile.rank.full, "platinum div_1");
        assert_eq!(profile.rank_3v3.full, "unranked");
        assert_eq!(profile.stats.goals, 10);
        assert_eq!(profile.stats.interceptions, 7);
        assert!((profile.stats.win_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(profile.match_history.len(), 2);
    }

    #[test]
    fn failure_response_yields_none() {
        assert!(PlayerProfile::from_response(response(json!({ "success": false }))).is_none());
    }

    #[test]
    fn missing_player_block_yields_none() {
        assert!(PlayerProfile::from_response(response(json!({ "success": true }))).is_none());
    }

    #[test]
    fn sparse_profile_defaults() {
        let profile = PlayerProfile::from_response(response(json!({
            "success": true,
            "player": { "platform_id": "123" }
        })))
        .unwrap();

        assert_eq!(profile.display_name, "123");
        assert_eq!(profile.rank.full, "unranked");
        assert_eq!(profile.stats.matches_played, 0);
        assert_eq!(profile.stats.win_rate, 0.0);
        assert!(profile.match_history.is_empty());
    }
}
