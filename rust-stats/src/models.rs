use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Statistical category scraped from the national ranking page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatCategory {
    WonLost,
    Goals,
    GoalsAllowed,
}

impl StatCategory {
    pub const ALL: [StatCategory; 3] = [
        StatCategory::WonLost,
        StatCategory::Goals,
        StatCategory::GoalsAllowed,
    ];

    /// NCAA `stat_seq` code
    pub fn code(self) -> u32 {
        match self {
            StatCategory::WonLost => 233,
            StatCategory::Goals => 228,
            StatCategory::GoalsAllowed => 229,
        }
    }

    /// Ranking table columns kept from this category
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            StatCategory::WonLost => &["Won", "Lost"],
            StatCategory::Goals => &["Goals"],
            StatCategory::GoalsAllowed => &["Goals Allowed"],
        }
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatCategory::WonLost => "won-lost",
            StatCategory::Goals => "goals",
            StatCategory::GoalsAllowed => "goals-allowed",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// One scraped row, keyed by the team string exactly as the page shows it
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatRow {
    pub team: String,
    /// Raw cell text per kept column
    pub values: HashMap<String, String>,
}

/// One category's table for one season, before canonicalization
#[derive(Debug, Clone)]
pub struct RawStatTable {
    pub category: StatCategory,
    pub year: u16,
    pub rows: Vec<RawStatRow>,
}

/// One team's season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub team: String,
    pub conference: String,
    pub year: u16,
    pub games: u32,
    pub won: u32,
    pub lost: u32,
    pub goals: u32,
    /// Goals per game
    pub gpg: f64,
    pub goals_allowed: u32,
    /// Goals against per game
    pub gapg: f64,
    pub made_playoffs: bool,
}

impl SeasonRecord {
    /// Build a record from raw totals. `None` when no games were played.
    #[allow(clippy::too_many_arguments)]
    pub fn from_totals(
        team: String,
        conference: String,
        year: u16,
        won: u32,
        lost: u32,
        goals: u32,
        goals_allowed: u32,
        made_playoffs: bool,
    ) -> Option<Self> {
        let games = won + lost;
        if games == 0 {
            return None;
        }
        Some(Self {
            team,
            conference,
            year,
            games,
            won,
            lost,
            goals,
            gpg: goals as f64 / games as f64,
            goals_allowed,
            gapg: goals_allowed as f64 / games as f64,
            made_playoffs,
        })
    }

    /// Won / games rounded to four decimals
    pub fn win_pct(&self) -> f64 {
        (self.won as f64 / self.games as f64 * 10_000.0).round() / 10_000.0
    }

    pub fn playoffs_label(&self) -> &'static str {
        if self.made_playoffs {
            "yes"
        } else {
            "no"
        }
    }
}

/// Year -> canonical names of the teams that made the postseason
#[derive(Debug, Clone, Default)]
pub struct PlayoffSet {
    teams: BTreeMap<u16, BTreeSet<String>>,
}

impl PlayoffSet {
    pub fn new(teams: BTreeMap<u16, BTreeSet<String>>) -> Self {
        Self { teams }
    }

    pub fn contains(&self, team: &str, year: u16) -> bool {
        self.teams
            .get(&year)
            .is_some_and(|teams| teams.contains(team))
    }

    /// Whether the season was resolved at all
    pub fn has_year(&self, year: u16) -> bool {
        self.teams.contains_key(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.teams.keys().copied()
    }
}

impl FromIterator<(u16, BTreeSet<String>)> for PlayoffSet {
    fn from_iter<T: IntoIterator<Item = (u16, BTreeSet<String>)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Season record with the derived model inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSeason {
    pub record: SeasonRecord,
    pub win_pct: f64,
    pub win_predictor: f64,
}

/// Evaluation-set prediction for one team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPrediction {
    pub year: u16,
    pub team: String,
    pub conference: String,
    pub won: u32,
    pub predicted: f64,
    pub made_playoffs: bool,
}

impl TeamPrediction {
    /// Actual minus predicted
    pub fn residual(&self) -> f64 {
        self.won as f64 - self.predicted
    }
}
