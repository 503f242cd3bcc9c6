//! Year-threshold train/evaluation split

use tracing::warn;

use crate::models::ScoredSeason;

/// Seasons before the split year train the model; the rest evaluate it
#[derive(Debug, Clone, Default)]
pub struct SeasonSplit {
    pub train: Vec<ScoredSeason>,
    pub eval: Vec<ScoredSeason>,
}

impl SeasonSplit {
    pub fn train_years(&self) -> Vec<u16> {
        distinct_years(&self.train)
    }

    pub fn eval_years(&self) -> Vec<u16> {
        distinct_years(&self.eval)
    }
}

/// Partition on `year < split_year`
pub fn split_by_year(seasons: Vec<ScoredSeason>, split_year: u16) -> SeasonSplit {
    let (train, eval): (Vec<_>, Vec<_>) = seasons
        .into_iter()
        .partition(|s| s.record.year < split_year);

    if train.is_empty() {
        warn!("No training seasons before {}", split_year);
    }
    if eval.is_empty() {
        warn!("No evaluation seasons from {} on", split_year);
    }

    SeasonSplit { train, eval }
}

fn distinct_years(seasons: &[ScoredSeason]) -> Vec<u16> {
    let mut years: Vec<u16> = seasons.iter().map(|s| s.record.year).collect();
    years.sort_unstable();
    years.dedup();
    years
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WinPredictor;
    use crate::models::SeasonRecord;

    fn seasons(years: &[u16]) -> Vec<ScoredSeason> {
        let records: Vec<SeasonRecord> = years
            .iter()
            .map(|&year| {
                SeasonRecord::from_totals(
                    format!("Team {}", year),
                    "ACC".to_string(),
                    year,
                    8,
                    6,
                    150,
                    140,
                    false,
                )
                .unwrap()
            })
            .collect();
        WinPredictor::default().score(&records)
    }

    #[test]
    fn test_split_is_partition() {
        let all_years: Vec<u16> = (2011..=2019).collect();
        let split = split_by_year(seasons(&all_years), 2017);

        assert_eq!(split.train.len() + split.eval.len(), all_years.len());
        assert_eq!(split.train_years(), (2011..=2016).collect::<Vec<_>>());
        assert_eq!(split.eval_years(), vec![2017, 2018, 2019]);

        // Every evaluation year is strictly later than every training year
        let last_train = *split.train_years().last().unwrap();
        assert!(split.eval_years().iter().all(|&y| y > last_train));
    }

    #[test]
    fn test_split_edges() {
        let split = split_by_year(seasons(&[2015, 2016]), 2011);
        assert!(split.train.is_empty());
        assert_eq!(split.eval.len(), 2);

        let split = split_by_year(seasons(&[2015, 2016]), 2020);
        assert_eq!(split.train.len(), 2);
        assert!(split.eval.is_empty());
    }
}
