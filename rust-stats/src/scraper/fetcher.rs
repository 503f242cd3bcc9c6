//! Stat-table fetcher for the national ranking page
//!
//! For every season: pick the year in the `acadyr` selector, expand the
//! DataTables page length to "All", and read the rendered results table.
//! The page keeps its selections between seasons, so a missing option is an
//! error rather than a no-op: reading on would return the previous season.

use std::time::Duration;
use tracing::{info, warn};

use super::{
    parse_html_table, ranking_url, select_required, step, BrowserSession, Control, OptionMatch,
    RANKINGS_TABLE_ID,
};
use crate::config::ScraperConfig;
use crate::error::FetchError;
use crate::models::{RawStatTable, StatCategory};

/// Reads one category's rankings table for a range of seasons
pub struct StatTableFetcher<'a, S> {
    session: &'a mut S,
    config: &'a ScraperConfig,
}

impl<'a, S: BrowserSession> StatTableFetcher<'a, S> {
    pub fn new(session: &'a mut S, config: &'a ScraperConfig) -> Self {
        Self { session, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.step_timeout_secs)
    }

    async fn settle(&self) {
        if self.config.settle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_ms)).await;
        }
    }

    /// Fetch `category` for each year. One result per year, in order.
    pub async fn fetch_category(
        &mut self,
        category: StatCategory,
        years: &[u16],
    ) -> Vec<(u16, Result<RawStatTable, FetchError>)> {
        let mut results = Vec::with_capacity(years.len());
        let Some(&first_year) = years.first() else {
            return results;
        };
        let url = ranking_url(first_year, category.code());
        let mut page_loaded = false;

        for &year in years {
            let mut attempt = 0;
            let result = loop {
                let outcome = if page_loaded {
                    self.fetch_season(category, year).await
                } else {
                    match self.load(&url).await {
                        Ok(()) => {
                            page_loaded = true;
                            self.fetch_season(category, year).await
                        }
                        Err(e) => Err(e),
                    }
                };

                match outcome {
                    Ok(table) => break Ok(table),
                    Err(e) => {
                        attempt += 1;
                        // Page state is unknown after a failure
                        page_loaded = false;
                        if !e.is_retryable() || attempt >= self.config.max_attempts {
                            break Err(e);
                        }
                        warn!(
                            "{} - {} failed (attempt {}/{}): {}",
                            year, category, attempt, self.config.max_attempts, e
                        );
                        let backoff = Duration::from_millis(self.config.delay_ms * attempt as u64);
                        tokio::time::sleep(backoff).await;
                    }
                }
            };

            if let Err(ref e) = result {
                warn!("Skipping {} - {}: {}", year, category, e);
            }
            results.push((year, result));
        }

        results
    }

    async fn load(&mut self, url: &str) -> Result<(), FetchError> {
        let timeout = self.timeout();
        step("navigate", timeout, self.session.navigate(url)).await
    }

    /// Select one season and read its full table
    async fn fetch_season(
        &mut self,
        category: StatCategory,
        year: u16,
    ) -> Result<RawStatTable, FetchError> {
        let timeout = self.timeout();

        select_required(
            &mut *self.session,
            Control::AcademicYear,
            &OptionMatch::season(year),
            timeout,
        )
        .await?;
        self.settle().await;

        select_required(
            &mut *self.session,
            Control::PageLength,
            &OptionMatch::all_rows(),
            timeout,
        )
        .await?;
        self.settle().await;

        let html = step(
            "read rankings table",
            timeout,
            self.session.element_html(RANKINGS_TABLE_ID),
        )
        .await?;

        let table = parse_html_table(&html)?;
        let rows = table.to_raw_rows(category.columns())?;
        info!("{} - {} - rows: {}", year, category.code(), rows.len());

        Ok(RawStatTable {
            category,
            year,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake::{rankings_html, FakeRankingSite};
    use super::*;

    fn test_config() -> ScraperConfig {
        ScraperConfig {
            settle_ms: 0,
            delay_ms: 0,
            max_attempts: 3,
            step_timeout_secs: 5,
            ..Default::default()
        }
    }

    fn goals_table(rows: &[(&str, u32)]) -> String {
        let rows: Vec<Vec<String>> = rows
            .iter()
            .enumerate()
            .map(|(i, (team, goals))| vec![(i + 1).to_string(), team.to_string(), goals.to_string()])
            .collect();
        rankings_html(&["Rank", "Team", "Goals"], &rows)
    }

    #[tokio::test]
    async fn test_fetch_each_season() {
        let mut site = FakeRankingSite::new(&[2011, 2012])
            .with_table(228, 2011, false, goals_table(&[("Duke (ACC)", 250)]))
            .with_table(
                228,
                2012,
                false,
                goals_table(&[("Duke (ACC)", 240), ("Army (Patriot)", 150)]),
            );
        let config = test_config();

        let results = StatTableFetcher::new(&mut site, &config)
            .fetch_category(StatCategory::Goals, &[2011, 2012])
            .await;

        assert_eq!(results.len(), 2);
        let (year, table) = &results[1];
        let table = table.as_ref().unwrap();
        assert_eq!(*year, 2012);
        assert_eq!(table.year, 2012);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].values["Goals"], "150");

        // One page load for the whole range
        assert_eq!(site.navigations.len(), 1);
        assert!(site.navigations[0].contains("academic_year=2011.0"));
        assert!(site.navigations[0].contains("stat_seq=228.0"));
    }

    #[tokio::test]
    async fn test_missing_year_skips_unit() {
        let mut site = FakeRankingSite::new(&[2011])
            .with_table(228, 2011, false, goals_table(&[("Duke (ACC)", 250)]));
        let config = test_config();

        let results = StatTableFetcher::new(&mut site, &config)
            .fetch_category(StatCategory::Goals, &[2011, 2012])
            .await;

        assert!(results[0].1.is_ok());
        assert!(matches!(
            results[1].1,
            Err(FetchError::OptionMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_page_length_is_error() {
        let mut site = FakeRankingSite::new(&[2011])
            .with_table(228, 2011, false, goals_table(&[("Duke (ACC)", 250)]));
        site.has_all_rows = false;
        let config = test_config();

        let results = StatTableFetcher::new(&mut site, &config)
            .fetch_category(StatCategory::Goals, &[2011])
            .await;

        match &results[0].1 {
            Err(FetchError::OptionMissing { control, .. }) => assert_eq!(*control, "page length"),
            other => panic!("expected OptionMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_after_flaky_read() {
        let mut site = FakeRankingSite::new(&[2011])
            .with_table(228, 2011, false, goals_table(&[("Duke (ACC)", 250)]));
        site.flaky_reads = 2;
        let config = test_config();

        let results = StatTableFetcher::new(&mut site, &config)
            .fetch_category(StatCategory::Goals, &[2011])
            .await;

        assert!(results[0].1.is_ok());
        // Initial load plus one reload per failed attempt
        assert_eq!(site.navigations.len(), 3);
    }

    #[tokio::test]
    async fn test_attempts_exhausted() {
        let mut site = FakeRankingSite::new(&[2011])
            .with_table(228, 2011, false, goals_table(&[("Duke (ACC)", 250)]));
        site.flaky_reads = 5;
        let config = test_config();

        let results = StatTableFetcher::new(&mut site, &config)
            .fetch_category(StatCategory::Goals, &[2011])
            .await;

        assert!(matches!(results[0].1, Err(FetchError::Driver { .. })));
    }

    #[tokio::test]
    async fn test_navigation_timeout_retried() {
        let mut site = FakeRankingSite::new(&[2011])
            .with_table(228, 2011, false, goals_table(&[("Duke (ACC)", 250)]));
        site.failed_navigations = 2;
        let config = test_config();

        let results = StatTableFetcher::new(&mut site, &config)
            .fetch_category(StatCategory::Goals, &[2011])
            .await;

        assert!(results[0].1.is_ok());
        assert_eq!(site.navigations.len(), 3);
    }

    #[tokio::test]
    async fn test_navigation_failures_exhaust_attempts() {
        let mut site = FakeRankingSite::new(&[2011])
            .with_table(228, 2011, false, goals_table(&[("Duke (ACC)", 250)]));
        site.failed_navigations = 3;
        let config = test_config();

        let results = StatTableFetcher::new(&mut site, &config)
            .fetch_category(StatCategory::Goals, &[2011])
            .await;

        assert!(matches!(results[0].1, Err(FetchError::Timeout { .. })));
        assert_eq!(site.navigations.len(), 3);
    }

    #[tokio::test]
    async fn test_wrong_category_columns() {
        let mut site = FakeRankingSite::new(&[2011])
            .with_table(233, 2011, false, goals_table(&[("Duke (ACC)", 250)]));
        let config = test_config();

        let results = StatTableFetcher::new(&mut site, &config)
            .fetch_category(StatCategory::WonLost, &[2011])
            .await;

        assert!(matches!(results[0].1, Err(FetchError::MissingColumn(_))));
    }
}
