//! Scrape-and-reconcile run over one browser session
//!
//! Fetches every category for every season, resolves the postseason field
//! per season, then hands everything to the [`SeasonAggregator`]. Failed
//! units are collected into a [`FailureSummary`] instead of aborting.

use std::fmt;
use tracing::{info, warn};

use crate::config::{ScraperConfig, SeasonConfig};
use crate::data::{CleaningStats, SeasonAggregator};
use crate::error::DataQualityError;
use crate::models::{PlayoffSet, RawStatTable, SeasonRecord, StatCategory};
use crate::names::AliasTable;
use crate::scraper::{
    ArchiveSource, BrowserSession, PlayoffResolver, ScrapeFailure, StatTableFetcher,
};

/// One step of a collection run, reported for progress display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Category(StatCategory),
    Playoffs,
}

impl Stage {
    /// Number of stages in a run
    pub const COUNT: usize = StatCategory::ALL.len() + 1;
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Category(category) => write!(f, "{}", category),
            Stage::Playoffs => write!(f, "playoff fields"),
        }
    }
}

/// Units that could not be scraped
#[derive(Debug, Clone, Default)]
pub struct FailureSummary {
    failures: Vec<ScrapeFailure>,
}

impl FailureSummary {
    pub fn push(&mut self, failure: ScrapeFailure) {
        self.failures.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScrapeFailure> {
        self.failures.iter()
    }
}

impl Extend<ScrapeFailure> for FailureSummary {
    fn extend<T: IntoIterator<Item = ScrapeFailure>>(&mut self, iter: T) {
        self.failures.extend(iter);
    }
}

impl fmt::Display for FailureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "all units scraped");
        }
        writeln!(f, "{} unit(s) failed:", self.failures.len())?;
        for failure in &self.failures {
            writeln!(f, "  {}", failure)?;
        }
        Ok(())
    }
}

/// Output of a collection run
#[derive(Debug, Clone)]
pub struct CollectedSeasons {
    pub records: Vec<SeasonRecord>,
    pub playoffs: PlayoffSet,
    pub stats: CleaningStats,
    pub failures: FailureSummary,
}

/// Drives the fetcher and the playoff resolver over one session
pub struct Collector<'a, S, A> {
    session: &'a mut S,
    archive: &'a A,
    seasons: &'a SeasonConfig,
    scraper: &'a ScraperConfig,
    aliases: &'a AliasTable,
}

impl<'a, S: BrowserSession, A: ArchiveSource> Collector<'a, S, A> {
    pub fn new(
        session: &'a mut S,
        archive: &'a A,
        seasons: &'a SeasonConfig,
        scraper: &'a ScraperConfig,
        aliases: &'a AliasTable,
    ) -> Self {
        Self {
            session,
            archive,
            seasons,
            scraper,
            aliases,
        }
    }

    pub async fn collect(&mut self) -> Result<CollectedSeasons, DataQualityError> {
        self.collect_with(|_| {}).await
    }

    /// Run every stage, calling `on_stage` as each one starts
    pub async fn collect_with<F: FnMut(Stage)>(
        &mut self,
        mut on_stage: F,
    ) -> Result<CollectedSeasons, DataQualityError> {
        let years: Vec<u16> = self.seasons.years().collect();
        let mut tables: Vec<RawStatTable> = Vec::new();
        let mut failures = FailureSummary::default();

        for category in StatCategory::ALL {
            on_stage(Stage::Category(category));
            let results = StatTableFetcher::new(&mut *self.session, self.scraper)
                .fetch_category(category, &years)
                .await;

            for (year, result) in results {
                match result {
                    Ok(table) => tables.push(table),
                    Err(e) => failures.push(ScrapeFailure {
                        unit: category.to_string(),
                        year,
                        message: e.to_string(),
                    }),
                }
            }
        }

        on_stage(Stage::Playoffs);
        let (playoffs, playoff_failures) = PlayoffResolver::new(
            &mut *self.session,
            self.archive,
            self.scraper,
            self.aliases,
            self.seasons.playoff_layout_year,
        )
        .resolve_all(&years)
        .await;
        failures.extend(playoff_failures);

        info!(
            "Collected {} tables for {} seasons",
            tables.len(),
            years.len()
        );
        if !failures.is_empty() {
            warn!("{}", failures.to_string().trim_end());
        }

        let aggregator = SeasonAggregator::new(self.aliases, &self.seasons.excluded_designations);
        let (records, stats) = aggregator.aggregate(&tables, &playoffs)?;

        Ok(CollectedSeasons {
            records,
            playoffs,
            stats,
            failures,
        })
    }
}
