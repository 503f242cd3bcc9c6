//! Season-stats aggregation
//!
//! Merges the per-category ranking tables into one row per (team, year),
//! cleans out non-competing rows and attaches the postseason flag.

use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::DataQualityError;
use crate::models::{PlayoffSet, RawStatTable, SeasonRecord, StatCategory};
use crate::names::{AliasTable, TeamKeySplitter};

/// Raw cells for one scraped key, merged across categories
type MergedRow = HashMap<String, String>;

/// Counts of rows removed during cleaning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub merged: usize,
    pub excluded: usize,
    pub incomplete: usize,
    pub no_games: usize,
}

/// Builds the season table from raw category tables
pub struct SeasonAggregator<'a> {
    aliases: &'a AliasTable,
    excluded: &'a [String],
    splitter: TeamKeySplitter,
}

impl<'a> SeasonAggregator<'a> {
    pub fn new(aliases: &'a AliasTable, excluded: &'a [String]) -> Self {
        Self {
            aliases,
            excluded,
            splitter: TeamKeySplitter::new(),
        }
    }

    /// Merge, clean and flag. Output is sorted by (year, team).
    pub fn aggregate(
        &self,
        tables: &[RawStatTable],
        playoffs: &PlayoffSet,
    ) -> Result<(Vec<SeasonRecord>, CleaningStats), DataQualityError> {
        let merged = merge_tables(tables);
        let mut stats = CleaningStats {
            merged: merged.len(),
            ..Default::default()
        };

        let mut records = Vec::with_capacity(merged.len());
        let mut seen = HashSet::new();

        for ((year, key), row) in &merged {
            if self.is_excluded(key) {
                debug!("{} - dropping non-competing row {:?}", year, key);
                stats.excluded += 1;
                continue;
            }

            let Some(totals) = self.parse_totals(key, *year, row)? else {
                debug!("{} - dropping incomplete row {:?}", year, key);
                stats.incomplete += 1;
                continue;
            };

            let (team, conference) = self.splitter.split(key, self.aliases);
            if !seen.insert((*year, team.clone())) {
                return Err(DataQualityError::DuplicateTeam { team, year: *year });
            }

            let made_playoffs = playoffs.contains(&team, *year);
            let [won, lost, goals, goals_allowed] = totals;
            match SeasonRecord::from_totals(
                team,
                conference,
                *year,
                won,
                lost,
                goals,
                goals_allowed,
                made_playoffs,
            ) {
                Some(record) => records.push(record),
                None => {
                    warn!("{} - {} played no games, excluded", year, key);
                    stats.no_games += 1;
                }
            }
        }

        if records.is_empty() {
            return Err(DataQualityError::Empty);
        }

        records.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.team.cmp(&b.team)));

        let mut unresolved: Vec<u16> = records
            .iter()
            .map(|r| r.year)
            .filter(|year| !playoffs.has_year(*year))
            .collect();
        unresolved.dedup();
        for year in unresolved {
            warn!("No playoff field for {}, all teams flagged 'no'", year);
        }

        info!(
            "Aggregated {} season rows ({} merged, {} excluded, {} incomplete, {} without games)",
            records.len(),
            stats.merged,
            stats.excluded,
            stats.incomplete,
            stats.no_games
        );

        Ok((records, stats))
    }

    /// Whole key, team part or conference group names an excluded designation
    fn is_excluded(&self, key: &str) -> bool {
        let team = self.splitter.team(key);
        let conference = self.splitter.conference(key);
        self.excluded
            .iter()
            .map(String::as_str)
            .any(|d| key.trim() == d || team == d || conference == d)
    }

    /// Won, lost, goals, goals allowed. `None` if any cell is absent or blank.
    fn parse_totals(
        &self,
        key: &str,
        year: u16,
        row: &MergedRow,
    ) -> Result<Option<[u32; 4]>, DataQualityError> {
        let mut totals = [0u32; 4];
        let columns = StatCategory::ALL.iter().flat_map(|c| c.columns().iter());

        for (slot, column) in totals.iter_mut().zip(columns) {
            let Some(raw) = row.get(*column).filter(|v| !is_blank(v)) else {
                return Ok(None);
            };
            *slot = parse_count(raw).ok_or_else(|| DataQualityError::Malformed {
                team: key.to_string(),
                year,
                column: column.to_string(),
                value: raw.clone(),
            })?;
        }

        Ok(Some(totals))
    }
}

/// Outer join of all tables on (year, scraped team key)
pub fn merge_tables(tables: &[RawStatTable]) -> BTreeMap<(u16, String), MergedRow> {
    let mut merged: BTreeMap<(u16, String), MergedRow> = BTreeMap::new();

    for table in tables {
        for row in &table.rows {
            let entry = merged.entry((table.year, row.team.clone())).or_default();
            for (column, value) in &row.values {
                if entry.insert(column.clone(), value.clone()).is_some() {
                    warn!(
                        "{} - {} listed twice in {}, keeping the later row",
                        table.year, row.team, table.category
                    );
                }
            }
        }
    }

    merged
}

fn is_blank(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == "-"
}

/// Non-negative count with optional thousands separators
fn parse_count(value: &str) -> Option<u32> {
    let cleaned: String = value
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse::<u32>().ok()
}
