//! Scrapers for stats.ncaa.org and the NCAA championship archive
//!
//! The interactive national ranking page is driven through a
//! [`BrowserSession`]; the static per-year archive page is fetched through an
//! [`ArchiveSource`]. All page parsing is done by plain functions over HTML
//! strings, so a layout change only touches this module.
//!
//! # Example
//!
//! ```no_run
//! use lacrosse::config::ScraperConfig;
//! use lacrosse::models::StatCategory;
//! use lacrosse::scraper::{StatTableFetcher, WebDriverSession};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScraperConfig::default();
//!     let mut session = WebDriverSession::connect(&config).await?;
//!
//!     let results = StatTableFetcher::new(&mut session, &config)
//!         .fetch_category(StatCategory::Goals, &[2018, 2019])
//!         .await;
//!     for (year, table) in results {
//!         println!("{}: {} rows", year, table?.rows.len());
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

#[cfg(feature = "live")]
mod client;
mod fetcher;
mod playoffs;
#[cfg(feature = "live")]
mod session;
mod table;

#[cfg(feature = "live")]
pub use client::ArchiveClient;
pub use fetcher::StatTableFetcher;
pub use playoffs::{
    parse_archive_page, parse_postseason_table, CurrentResolver, LegacyResolver,
    PlayoffResolver, PlayoffStrategy,
};
#[cfg(feature = "live")]
pub use session::WebDriverSession;
pub use table::{parse_html_table, HtmlTable};

use crate::error::{FetchError, ResolverError};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// National ranking page
const RANKING_URL: &str = "http://stats.ncaa.org/rankings/national_ranking";
/// Championship records archive
const ARCHIVE_URL: &str = "http://fs.ncaa.org/Docs/stats/m_lacrosse_champs_records";

/// Element id of the DataTables results table
pub const RANKINGS_TABLE_ID: &str = "rankings_table";

/// Ranking page URL for a season and stat code
pub fn ranking_url(year: u16, stat_code: u32) -> String {
    format!(
        "{}?division=1.0&ranking_period=15.0&sport_code=MLA&academic_year={}.0&stat_seq={}.0",
        RANKING_URL, year, stat_code
    )
}

/// Archive page listing the postseason field for a season
pub fn archive_url(year: u16) -> String {
    format!("{}/{}/d1/html/confstat.htm", ARCHIVE_URL, year)
}

/// Selectors on the ranking page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    AcademicYear,
    PageLength,
    RankingPeriod,
}

impl Control {
    pub fn label(self) -> &'static str {
        match self {
            Control::AcademicYear => "academic year",
            Control::PageLength => "page length",
            Control::RankingPeriod => "ranking period",
        }
    }

    /// CSS selector of the `<select>` element
    pub fn css(self) -> &'static str {
        match self {
            Control::AcademicYear => "#acadyr",
            Control::PageLength => {
                "#rankings_table_length > label:nth-child(1) > select:nth-child(1)"
            }
            Control::RankingPeriod => "#rp",
        }
    }
}

/// Which `<option>` to pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionMatch {
    /// `value` attribute equals
    Value(String),
    /// Visible text contains
    TextContains(String),
}

impl OptionMatch {
    pub fn season(year: u16) -> Self {
        OptionMatch::Value(format!("{}.0", year))
    }

    /// DataTables "All" entry
    pub fn all_rows() -> Self {
        OptionMatch::Value("-1".to_string())
    }

    pub fn matches(&self, value: Option<&str>, text: &str) -> bool {
        match self {
            OptionMatch::Value(wanted) => value == Some(wanted.as_str()),
            OptionMatch::TextContains(wanted) => text.contains(wanted.as_str()),
        }
    }
}

impl fmt::Display for OptionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionMatch::Value(v) => write!(f, "value={}", v),
            OptionMatch::TextContains(t) => write!(f, "text~{}", t),
        }
    }
}

/// A stateful browser window. Selections persist until changed.
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    /// Load `url`
    async fn navigate(&mut self, url: &str) -> Result<(), FetchError>;

    /// Click the first option of `control` accepted by `matcher`.
    /// `Ok(false)` when no option matched.
    async fn select_option(
        &mut self,
        control: Control,
        matcher: &OptionMatch,
    ) -> Result<bool, FetchError>;

    /// Outer HTML of the element with the given id
    async fn element_html(&mut self, element_id: &str) -> Result<String, FetchError>;
}

/// Source of the static archive pages
#[allow(async_fn_in_trait)]
pub trait ArchiveSource {
    async fn fetch_archive(&self, year: u16) -> Result<String, ResolverError>;
}

/// One unit of scraping that was skipped
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeFailure {
    pub unit: String,
    pub year: u16,
    pub message: String,
}

impl fmt::Display for ScrapeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.unit, self.year, self.message)
    }
}

/// Run one page interaction under a timeout
pub(crate) async fn step<T, F>(name: &str, timeout: Duration, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            step: name.to_string(),
            timeout,
        }),
    }
}

/// Select an option that must exist
pub(crate) async fn select_required<S: BrowserSession>(
    session: &mut S,
    control: Control,
    matcher: &OptionMatch,
    timeout: Duration,
) -> Result<(), FetchError> {
    let found = step(
        control.label(),
        timeout,
        session.select_option(control, matcher),
    )
    .await?;

    if !found {
        return Err(FetchError::OptionMissing {
            control: control.label(),
            wanted: matcher.to_string(),
        });
    }
    Ok(())
}

/// In-memory ranking site used by the scraper tests
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;

    /// Serves one table per (stat code, year, ranking period) and tracks
    /// the selections like the live page does.
    #[derive(Default)]
    pub struct FakeRankingSite {
        pub tables: HashMap<(u32, u16, bool), String>,
        pub years: Vec<u16>,
        pub has_all_rows: bool,
        pub has_postseason: bool,
        /// Number of `element_html` calls that fail before succeeding
        pub flaky_reads: u32,
        /// Number of page loads that time out before succeeding
        pub failed_navigations: u32,
        stat_code: u32,
        year: Option<u16>,
        postseason: bool,
        pub navigations: Vec<String>,
    }

    impl FakeRankingSite {
        pub fn new(years: &[u16]) -> Self {
            Self {
                years: years.to_vec(),
                has_all_rows: true,
                has_postseason: true,
                ..Default::default()
            }
        }

        pub fn with_table(mut self, code: u32, year: u16, postseason: bool, html: String) -> Self {
            self.tables.insert((code, year, postseason), html);
            self
        }
    }

    impl BrowserSession for FakeRankingSite {
        async fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
            self.navigations.push(url.to_string());
            if self.failed_navigations > 0 {
                self.failed_navigations -= 1;
                return Err(FetchError::Timeout {
                    step: "navigate".to_string(),
                    timeout: std::time::Duration::from_secs(1),
                });
            }
            let code = url
                .split("stat_seq=")
                .nth(1)
                .and_then(|rest| rest.split('.').next())
                .and_then(|c| c.parse().ok())
                .unwrap_or(0);
            self.stat_code = code;
            self.year = None;
            self.postseason = false;
            Ok(())
        }

        async fn select_option(
            &mut self,
            control: Control,
            matcher: &OptionMatch,
        ) -> Result<bool, FetchError> {
            match control {
                Control::AcademicYear => {
                    for year in &self.years {
                        let value = format!("{}.0", year);
                        if matcher.matches(Some(value.as_str()), &year.to_string()) {
                            self.year = Some(*year);
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                Control::PageLength => {
                    Ok(self.has_all_rows && matcher.matches(Some("-1"), "All"))
                }
                Control::RankingPeriod => {
                    if self.has_postseason && matcher.matches(Some("99.0"), "DI Championship") {
                        self.postseason = true;
                        return Ok(true);
                    }
                    Ok(false)
                }
            }
        }

        async fn element_html(&mut self, element_id: &str) -> Result<String, FetchError> {
            if self.flaky_reads > 0 {
                self.flaky_reads -= 1;
                return Err(FetchError::Driver {
                    step: "read".to_string(),
                    message: "stale element".to_string(),
                });
            }
            let year = self
                .year
                .ok_or_else(|| FetchError::ElementNotFound(element_id.to_string()))?;
            self.tables
                .get(&(self.stat_code, year, self.postseason))
                .cloned()
                .ok_or_else(|| FetchError::ElementNotFound(element_id.to_string()))
        }
    }

    /// Archive pages keyed by season
    pub struct FakeArchive {
        pub pages: HashMap<u16, String>,
    }

    impl ArchiveSource for FakeArchive {
        async fn fetch_archive(&self, year: u16) -> Result<String, ResolverError> {
            self.pages.get(&year).cloned().ok_or(ResolverError::Status {
                year,
                status: 404,
            })
        }
    }

    /// Championship archive page: one link per entry
    pub fn archive_page(links: &[&str]) -> String {
        let mut html = String::from("<html><body>");
        for link in links {
            html.push_str(&format!("<p><a href=\"#\">{}</a></p>", link));
        }
        html.push_str("</body></html>");
        html
    }

    /// Render a DataTables-style rankings table
    pub fn rankings_html(headers: &[&str], rows: &[Vec<String>]) -> String {
        let mut html = String::from("<table id=\"rankings_table\"><thead><tr>");
        for h in headers {
            html.push_str(&format!("<th>{}</th>", h));
        }
        html.push_str("</tr></thead><tbody>");
        for row in rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{}</td>", cell));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        html
    }
}
