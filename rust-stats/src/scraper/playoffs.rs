//! Playoff-qualification resolver
//!
//! Before 2017 the postseason field is read from the static championship
//! archive (`confstat.htm`); from 2017 on it comes from the ranking page with
//! the ranking period switched to the Division I championship.

use scraper::{Html, Selector};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{info, warn};

use super::table::cell_text;
use super::{
    parse_html_table, ranking_url, select_required, step, ArchiveSource, BrowserSession, Control,
    OptionMatch, ScrapeFailure, RANKINGS_TABLE_ID,
};
use crate::config::ScraperConfig;
use crate::error::{FetchError, ResolverError};
use crate::models::{PlayoffSet, StatCategory};
use crate::names::{strip_conference, AliasTable};

/// Links at the top of the archive page that are not teams
pub const ARCHIVE_HEADER_LINKS: usize = 4;
/// Link text pointing at a game, not a team
pub const BOX_SCORE: &str = "Box score";
/// Ranking-period option text for the postseason
pub const POSTSEASON_LABEL: &str = "DI";

/// How a season's postseason field is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayoffStrategy {
    /// Static archive page
    Legacy,
    /// Interactive ranking table
    Current,
}

impl PlayoffStrategy {
    pub fn for_year(year: u16, layout_year: u16) -> Self {
        if year < layout_year {
            PlayoffStrategy::Legacy
        } else {
            PlayoffStrategy::Current
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayoffStrategy::Legacy => "playoffs (archive)",
            PlayoffStrategy::Current => "playoffs (rankings)",
        }
    }
}

/// Teams linked from a championship archive page.
///
/// Drops the header links and box-score links, then canonicalizes.
pub fn parse_archive_page(html: &str, aliases: &AliasTable) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    let Ok(link_selector) = Selector::parse("a") else {
        return BTreeSet::new();
    };

    document
        .select(&link_selector)
        .map(cell_text)
        .skip(ARCHIVE_HEADER_LINKS)
        .filter(|text| text != BOX_SCORE)
        .map(|text| aliases.canonicalize(&text))
        .filter(|team| !team.is_empty())
        .collect()
}

/// Teams listed in the postseason rankings table
pub fn parse_postseason_table(
    html: &str,
    aliases: &AliasTable,
) -> Result<BTreeSet<String>, FetchError> {
    let table = parse_html_table(html)?;
    Ok(table
        .column("Team")?
        .into_iter()
        .map(|key| aliases.canonicalize(strip_conference(key)))
        .filter(|team| !team.is_empty())
        .collect())
}

/// Resolves pre-2017 seasons from the archive
pub struct LegacyResolver<'a, A> {
    source: &'a A,
    aliases: &'a AliasTable,
}

impl<'a, A: ArchiveSource> LegacyResolver<'a, A> {
    pub fn new(source: &'a A, aliases: &'a AliasTable) -> Self {
        Self { source, aliases }
    }

    pub async fn resolve(&self, year: u16) -> Result<BTreeSet<String>, ResolverError> {
        let html = self.source.fetch_archive(year).await?;
        let teams = parse_archive_page(&html, self.aliases);
        if teams.is_empty() {
            return Err(ResolverError::NoTeams { year });
        }
        Ok(teams)
    }
}

/// Resolves 2017+ seasons from the ranking page
pub struct CurrentResolver<'a, S> {
    session: &'a mut S,
    config: &'a ScraperConfig,
    aliases: &'a AliasTable,
}

impl<'a, S: BrowserSession> CurrentResolver<'a, S> {
    pub fn new(session: &'a mut S, config: &'a ScraperConfig, aliases: &'a AliasTable) -> Self {
        Self {
            session,
            config,
            aliases,
        }
    }

    pub async fn resolve(&mut self, year: u16) -> Result<BTreeSet<String>, ResolverError> {
        let mut attempt = 0;
        let teams = loop {
            match self.read_postseason(year).await {
                Ok(teams) => break teams,
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() || attempt >= self.config.max_attempts {
                        return Err(e.into());
                    }
                    warn!(
                        "{} postseason read failed (attempt {}/{}): {}",
                        year, attempt, self.config.max_attempts, e
                    );
                    tokio::time::sleep(Duration::from_millis(
                        self.config.delay_ms * attempt as u64,
                    ))
                    .await;
                }
            }
        };

        if teams.is_empty() {
            return Err(ResolverError::NoTeams { year });
        }
        Ok(teams)
    }

    async fn read_postseason(&mut self, year: u16) -> Result<BTreeSet<String>, FetchError> {
        let timeout = Duration::from_secs(self.config.step_timeout_secs);
        let settle = Duration::from_millis(self.config.settle_ms);

        let url = ranking_url(year, StatCategory::WonLost.code());
        step("navigate", timeout, self.session.navigate(&url)).await?;

        select_required(
            &mut *self.session,
            Control::AcademicYear,
            &OptionMatch::season(year),
            timeout,
        )
        .await?;
        tokio::time::sleep(settle).await;

        select_required(
            &mut *self.session,
            Control::RankingPeriod,
            &OptionMatch::TextContains(POSTSEASON_LABEL.to_string()),
            timeout,
        )
        .await?;
        tokio::time::sleep(settle).await;

        let html = step(
            "read postseason table",
            timeout,
            self.session.element_html(RANKINGS_TABLE_ID),
        )
        .await?;

        parse_postseason_table(&html, self.aliases)
    }
}

/// Picks the strategy per season and collects the [`PlayoffSet`]
pub struct PlayoffResolver<'a, S, A> {
    session: &'a mut S,
    archive: &'a A,
    config: &'a ScraperConfig,
    aliases: &'a AliasTable,
    layout_year: u16,
}

impl<'a, S: BrowserSession, A: ArchiveSource> PlayoffResolver<'a, S, A> {
    pub fn new(
        session: &'a mut S,
        archive: &'a A,
        config: &'a ScraperConfig,
        aliases: &'a AliasTable,
        layout_year: u16,
    ) -> Self {
        Self {
            session,
            archive,
            config,
            aliases,
            layout_year,
        }
    }

    pub async fn resolve(&mut self, year: u16) -> Result<BTreeSet<String>, ResolverError> {
        match PlayoffStrategy::for_year(year, self.layout_year) {
            PlayoffStrategy::Legacy => {
                LegacyResolver::new(self.archive, self.aliases)
                    .resolve(year)
                    .await
            }
            PlayoffStrategy::Current => {
                CurrentResolver::new(&mut *self.session, self.config, self.aliases)
                    .resolve(year)
                    .await
            }
        }
    }

    /// Resolve every season; failed seasons are reported, not fatal
    pub async fn resolve_all(&mut self, years: &[u16]) -> (PlayoffSet, Vec<ScrapeFailure>) {
        let mut teams = BTreeMap::new();
        let mut failures = Vec::new();

        for &year in years {
            let strategy = PlayoffStrategy::for_year(year, self.layout_year);
            match self.resolve(year).await {
                Ok(set) => {
                    info!("{} - {} teams via {}", year, set.len(), strategy.label());
                    teams.insert(year, set);
                }
                Err(e) => {
                    warn!("Skipping {} for {}: {}", strategy.label(), year, e);
                    failures.push(ScrapeFailure {
                        unit: strategy.label().to_string(),
                        year,
                        message: e.to_string(),
                    });
                }
            }
        }

        (PlayoffSet::new(teams), failures)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake::{archive_page, rankings_html, FakeArchive, FakeRankingSite};
    use super::*;
    use std::collections::HashMap;

    fn test_config() -> ScraperConfig {
        ScraperConfig {
            settle_ms: 0,
            delay_ms: 0,
            step_timeout_secs: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_strategy_for_year() {
        assert_eq!(PlayoffStrategy::for_year(2011, 2017), PlayoffStrategy::Legacy);
        assert_eq!(PlayoffStrategy::for_year(2016, 2017), PlayoffStrategy::Legacy);
        assert_eq!(PlayoffStrategy::for_year(2017, 2017), PlayoffStrategy::Current);
        assert_eq!(PlayoffStrategy::for_year(2019, 2017), PlayoffStrategy::Current);
    }

    #[test]
    fn test_parse_archive_page_counts() {
        let links = [
            "Home", "Records", "Championships", "Stats",
            "Duke", "Box score", "Notre Dame", "Box score", "Maryland", "Denver",
        ];
        let teams = parse_archive_page(&archive_page(&links), &AliasTable::default());

        // 10 links - 4 header - 2 box scores
        assert_eq!(teams.len(), 4);
        assert!(teams.contains("Duke"));
        assert!(!teams.contains("Home"));
        assert!(!teams.contains(BOX_SCORE));
    }

    #[test]
    fn test_parse_archive_page_aliases() {
        let links = [
            "Home", "Records", "Championships", "Stats",
            "UAlbany", "Albany (NY)", "OSU", "YALE", "Yale",
        ];
        let teams = parse_archive_page(&archive_page(&links), &AliasTable::default());

        let expected: BTreeSet<String> = ["Albany", "Ohio St.", "Yale"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(teams, expected);
    }

    #[test]
    fn test_parse_archive_page_wrapped_links() {
        let html = r#"<html><body>
            <a href="/">Home</a><a href="/r">Records</a>
            <a href="/c">Championships</a><a href="/s">Stats</a>
            <a href="/t/1">Notre
                Dame</a>
            <a href="/b/1">  Box
                score </a>
            <a href="/t/2"> Duke </a>
        </body></html>"#;

        let teams = parse_archive_page(html, &AliasTable::default());

        let expected: BTreeSet<String> = ["Duke", "Notre Dame"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(teams, expected);
    }

    #[test]
    fn test_parse_archive_page_header_only() {
        let teams = parse_archive_page(
            &archive_page(&["Home", "Records"]),
            &AliasTable::default(),
        );
        assert!(teams.is_empty());
    }

    #[test]
    fn test_parse_postseason_table() {
        let html = rankings_html(
            &["Rank", "Team", "W-L"],
            &[
                vec!["1".into(), "Yale (Ivy)".into(), "17-3".into()],
                vec!["2".into(), "Duke (ACC)".into(), "16-4".into()],
                vec!["3".into(), "UAlbany (America East)".into(), "18-2".into()],
            ],
        );
        let teams = parse_postseason_table(&html, &AliasTable::default()).unwrap();
        let expected: BTreeSet<String> = ["Albany", "Duke", "Yale"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(teams, expected);
    }

    #[tokio::test]
    async fn test_legacy_resolver_empty_is_error() {
        let archive = FakeArchive {
            pages: HashMap::from([(2012, archive_page(&["Home", "Records", "A", "B"]))]),
        };
        let aliases = AliasTable::default();
        let result = LegacyResolver::new(&archive, &aliases).resolve(2012).await;
        assert!(matches!(result, Err(ResolverError::NoTeams { year: 2012 })));
    }

    #[tokio::test]
    async fn test_current_resolver() {
        let html = rankings_html(
            &["Rank", "Team"],
            &[
                vec!["1".into(), "Yale (Ivy)".into()],
                vec!["2".into(), "Duke (ACC)".into()],
            ],
        );
        let mut site = FakeRankingSite::new(&[2018]).with_table(233, 2018, true, html);
        let config = test_config();
        let aliases = AliasTable::default();

        let teams = CurrentResolver::new(&mut site, &config, &aliases)
            .resolve(2018)
            .await
            .unwrap();
        assert_eq!(teams.len(), 2);
        assert!(teams.contains("Yale"));
    }

    #[tokio::test]
    async fn test_current_resolver_missing_postseason_option() {
        let mut site = FakeRankingSite::new(&[2018]);
        site.has_postseason = false;
        let config = test_config();
        let aliases = AliasTable::default();

        let result = CurrentResolver::new(&mut site, &config, &aliases)
            .resolve(2018)
            .await;
        assert!(matches!(
            result,
            Err(ResolverError::Fetch(FetchError::OptionMissing { .. }))
        ));
        // Not retried
        assert_eq!(site.navigations.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_all_dispatches_and_reports() {
        let archive = FakeArchive {
            pages: HashMap::from([(
                2016,
                archive_page(&["Home", "Records", "Championships", "Stats", "Denver", "Box score"]),
            )]),
        };
        let postseason = rankings_html(&["Rank", "Team"], &[vec!["1".into(), "Maryland (Big Ten)".into()]]);
        let mut site = FakeRankingSite::new(&[2017]).with_table(233, 2017, true, postseason);
        let config = test_config();
        let aliases = AliasTable::default();

        let (playoffs, failures) = PlayoffResolver::new(&mut site, &archive, &config, &aliases, 2017)
            .resolve_all(&[2015, 2016, 2017])
            .await;

        assert!(playoffs.contains("Denver", 2016));
        assert!(playoffs.contains("Maryland", 2017));
        assert!(!playoffs.has_year(2015));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].year, 2015);
        assert_eq!(failures[0].unit, "playoffs (archive)");
        // The archive seasons never touch the browser
        assert_eq!(site.navigations.len(), 1);
    }
}
