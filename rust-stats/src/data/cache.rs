//! Season cache: the aggregated table as a flat CSV file

use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

use crate::error::CacheError;
use crate::models::SeasonRecord;

/// Column order of the season table
pub const SEASON_COLUMNS: [&str; 11] = [
    "Team",
    "Conference",
    "Year",
    "Games",
    "Won",
    "Lost",
    "Goals",
    "GPG",
    "Goals Allowed",
    "GAPG",
    "Playoffs",
];

/// Per-season totals for the `list` overview
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSummary {
    pub year: u16,
    pub teams: usize,
    pub playoff_teams: usize,
    pub mean_gpg: f64,
}

/// Build the season DataFrame in the stable column order
pub fn records_to_dataframe(records: &[SeasonRecord]) -> PolarsResult<DataFrame> {
    let teams: Vec<&str> = records.iter().map(|r| r.team.as_str()).collect();
    let conferences: Vec<&str> = records.iter().map(|r| r.conference.as_str()).collect();
    let years: Vec<i64> = records.iter().map(|r| r.year as i64).collect();
    let games: Vec<i64> = records.iter().map(|r| r.games as i64).collect();
    let won: Vec<i64> = records.iter().map(|r| r.won as i64).collect();
    let lost: Vec<i64> = records.iter().map(|r| r.lost as i64).collect();
    let goals: Vec<i64> = records.iter().map(|r| r.goals as i64).collect();
    let gpg: Vec<f64> = records.iter().map(|r| r.gpg).collect();
    let allowed: Vec<i64> = records.iter().map(|r| r.goals_allowed as i64).collect();
    let gapg: Vec<f64> = records.iter().map(|r| r.gapg).collect();
    let playoffs: Vec<&str> = records.iter().map(|r| r.playoffs_label()).collect();

    DataFrame::new(vec![
        Series::new(SEASON_COLUMNS[0], teams),
        Series::new(SEASON_COLUMNS[1], conferences),
        Series::new(SEASON_COLUMNS[2], years),
        Series::new(SEASON_COLUMNS[3], games),
        Series::new(SEASON_COLUMNS[4], won),
        Series::new(SEASON_COLUMNS[5], lost),
        Series::new(SEASON_COLUMNS[6], goals),
        Series::new(SEASON_COLUMNS[7], gpg),
        Series::new(SEASON_COLUMNS[8], allowed),
        Series::new(SEASON_COLUMNS[9], gapg),
        Series::new(SEASON_COLUMNS[10], playoffs),
    ])
}

/// Write the season table, creating parent directories as needed
pub fn save_records<P: AsRef<Path>>(path: P, records: &[SeasonRecord]) -> Result<(), CacheError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut df = records_to_dataframe(records)?;
    let mut file = File::create(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    info!("Saved {} season rows to {}", records.len(), path.display());
    Ok(())
}

/// Read the season table back. Derived columns are recomputed from the totals.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<SeasonRecord>, CacheError> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let records = dataframe_to_records(&df)?;
    info!("Loaded {} season rows from {}", records.len(), path.display());
    Ok(records)
}

/// Convert a season DataFrame into records
pub fn dataframe_to_records(df: &DataFrame) -> Result<Vec<SeasonRecord>, CacheError> {
    let found: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
    if found != SEASON_COLUMNS {
        return Err(CacheError::Schema { found });
    }

    // Casts cover all-empty columns, which CSV inference reads as null
    let team_series = df.column("Team")?.cast(&DataType::String)?;
    let conf_series = df.column("Conference")?.cast(&DataType::String)?;
    let playoff_series = df.column("Playoffs")?.cast(&DataType::String)?;
    let year_series = df.column("Year")?.cast(&DataType::Int64)?;
    let games_series = df.column("Games")?.cast(&DataType::Int64)?;
    let won_series = df.column("Won")?.cast(&DataType::Int64)?;
    let lost_series = df.column("Lost")?.cast(&DataType::Int64)?;
    let goals_series = df.column("Goals")?.cast(&DataType::Int64)?;
    let allowed_series = df.column("Goals Allowed")?.cast(&DataType::Int64)?;

    let team_col = team_series.str()?;
    let conf_col = conf_series.str()?;
    let playoff_col = playoff_series.str()?;
    let year_col = year_series.i64()?;
    let games_col = games_series.i64()?;
    let won_col = won_series.i64()?;
    let lost_col = lost_series.i64()?;
    let goals_col = goals_series.i64()?;
    let allowed_col = allowed_series.i64()?;

    let count = |col: &Int64Chunked, name: &'static str, row: usize| -> Result<u32, CacheError> {
        let value = col
            .get(row)
            .ok_or(CacheError::MissingValue { column: name, row })?;
        u32::try_from(value).map_err(|_| CacheError::Inconsistent {
            row,
            message: format!("{} = {} is out of range", name, value),
        })
    };

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let team = team_col
            .get(i)
            .ok_or(CacheError::MissingValue {
                column: "Team",
                row: i,
            })?
            .to_string();
        let conference = conf_col.get(i).unwrap_or("").to_string();
        let year = u16::try_from(count(year_col, "Year", i)?).map_err(|_| {
            CacheError::Inconsistent {
                row: i,
                message: "Year is out of range".to_string(),
            }
        })?;
        let made_playoffs = match playoff_col.get(i) {
            Some("yes") => true,
            Some("no") => false,
            other => {
                return Err(CacheError::Inconsistent {
                    row: i,
                    message: format!("Playoffs must be yes/no, got {:?}", other),
                })
            }
        };

        let games = count(games_col, "Games", i)?;
        let record = SeasonRecord::from_totals(
            team,
            conference,
            year,
            count(won_col, "Won", i)?,
            count(lost_col, "Lost", i)?,
            count(goals_col, "Goals", i)?,
            count(allowed_col, "Goals Allowed", i)?,
            made_playoffs,
        )
        .ok_or_else(|| CacheError::Inconsistent {
            row: i,
            message: "season with no games".to_string(),
        })?;

        if record.games != games {
            return Err(CacheError::Inconsistent {
                row: i,
                message: format!(
                    "Games = {} but Won + Lost = {}",
                    games, record.games
                ),
            });
        }
        records.push(record);
    }

    Ok(records)
}

/// Team count, playoff count and mean GPG per season
pub fn season_summaries<P: AsRef<Path>>(path: P) -> Result<Vec<SeasonSummary>, CacheError> {
    let df = LazyCsvReader::new(path.as_ref())
        .finish()?
        .group_by([col("Year")])
        .agg([
            col("Team").count().cast(DataType::Int64).alias("teams"),
            col("Playoffs")
                .eq(lit("yes"))
                .cast(DataType::Int64)
                .sum()
                .alias("playoff_teams"),
            col("GPG").mean().alias("mean_gpg"),
        ])
        .sort(["Year"], SortMultipleOptions::default())
        .collect()?;

    let year_series = df.column("Year")?.cast(&DataType::Int64)?;
    let year_col = year_series.i64()?;
    let teams_col = df.column("teams")?.i64()?;
    let playoff_col = df.column("playoff_teams")?.i64()?;
    let gpg_col = df.column("mean_gpg")?.f64()?;

    let mut result = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        if let (Some(y), Some(t), Some(p), Some(g)) = (
            year_col.get(i),
            teams_col.get(i),
            playoff_col.get(i),
            gpg_col.get(i),
        ) {
            result.push(SeasonSummary {
                year: y as u16,
                teams: t as usize,
                playoff_teams: p as usize,
                mean_gpg: g,
            });
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_csv(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("lacrosse-cache-{}-{}", std::process::id(), name))
            .join("teams.csv")
    }

    fn sample_records() -> Vec<SeasonRecord> {
        vec![
            SeasonRecord::from_totals(
                "Army".to_string(),
                "Patriot".to_string(),
                2016,
                10,
                6,
                160,
                128,
                false,
            )
            .unwrap(),
            SeasonRecord::from_totals(
                "Duke".to_string(),
                "ACC".to_string(),
                2016,
                12,
                5,
                215,
                151,
                true,
            )
            .unwrap(),
            SeasonRecord::from_totals(
                "Mount St. Mary's, Md.".to_string(),
                "NEC".to_string(),
                2017,
                3,
                11,
                101,
                170,
                false,
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_dataframe_column_order() {
        let df = records_to_dataframe(&sample_records()).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, SEASON_COLUMNS);
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_csv("roundtrip");
        let records = sample_records();

        save_records(&path, &records).unwrap();
        let loaded = load_records(&path).unwrap();

        // Team name with a comma survives quoting
        assert_eq!(loaded, records);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_schema_mismatch() {
        let df = DataFrame::new(vec![
            Series::new("Team", vec!["Duke"]),
            Series::new("Year", vec![2016i64]),
        ])
        .unwrap();

        let err = dataframe_to_records(&df).unwrap_err();
        assert!(matches!(err, CacheError::Schema { .. }));
    }

    #[test]
    fn test_inconsistent_games() {
        let mut df = records_to_dataframe(&sample_records()).unwrap();
        df.replace("Games", Series::new("Games", vec![16i64, 99, 14]))
            .unwrap();

        let err = dataframe_to_records(&df).unwrap_err();
        assert!(matches!(err, CacheError::Inconsistent { row: 1, .. }));
    }

    #[test]
    fn test_season_summaries() {
        let path = temp_csv("summary");
        save_records(&path, &sample_records()).unwrap();

        let summaries = season_summaries(&path).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].year, 2016);
        assert_eq!(summaries[0].teams, 2);
        assert_eq!(summaries[0].playoff_teams, 1);
        assert_eq!(summaries[1].playoff_teams, 0);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
