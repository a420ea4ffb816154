use serde::Serialize;

use crate::models::RankInfo;

/// Human-readable rank derived from a league/division pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankSummary {
    /// League name, lowercase (`bronze` .. `elite`, `unranked`, `unknown`).
    pub league: String,
    /// `div_N` for divisions 0..=2; higher divisions are not shown.
    pub division: Option<String>,
    /// `"<league> div_N"`, or the bare league when no division applies.
    pub full: String,
}

pub fn league_name(league: i64) -> &'static str {
    match league {
        0 => "bronze",
        1 => "silver",
        2 => "gold",
        3 => "platinum",
        4 => "diamond",
        5 => "master",
        6 => "elite",
        -1 => "unranked",
        _ => "unknown",
    }
}

pub fn rank_summary(rank: RankInfo) -> RankSummary {
    let league = league_name(rank.current_league).to_owned();
    let division = (rank.current_division <= 2).then(|| format!("div_{}", rank.current_division));
    let full = match &division {
        Some(division) => format!("{league} {division}"),
        None => league.clone(),
    };
    RankSummary {
        league,
        division,
        full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(league: i64, division: i64) -> RankSummary {
        rank_summary(RankInfo {
            current_league: league,
            current_division: division,
        })
    }

    #[test]
    fn platinum_div_1() {
        let rank = summary(3, 1);
        assert_eq!(rank.league, "platinum");
        assert_eq!(rank.division.as_deref(), Some("div_1"));
        assert_eq!(rank.full, "platinum div_1");
    }

    #[test]
    fn unranked_has_no_division() {
        let rank = summary(-1, 3);
        assert_eq!(rank.league, "unranked");
        assert_eq!(rank.division, None);
        assert_eq!(rank.full, "unranked");
    }

    #[test]
    fn division_above_two_is_dropped() {
        let rank = summary(4, 3);
        assert_eq!(rank.division, None);
        assert_eq!(rank.full, "diamond");
    }

    #[test]
    fn unexpected_league_is_unknown() {
        assert_eq!(summary(42, 3).full, "unknown");
    }

    #[test]
    fn all_named_leagues() {
        let names: Vec<&str> = (0..=6).map(league_name).collect();
        assert_eq!(
            names,
            ["bronze", "silver", "gold", "platinum", "diamond", "master", "elite"]
        );
    }
}
