//! Lacrosse CLI - scrape NCAA season stats and report projected vs. actual wins

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use lacrosse::data::{load_records, season_summaries};
use lacrosse::model::{
    run_analysis, AnalysisOptions, DimensionAnalysis, FitSummary, WinAnalysis, WinPredictor,
    DEFAULT_BASE_RATE, DEFAULT_EXPONENT, DEFAULT_WEIGHT,
};
use lacrosse::report::{build_model_plots, write_model_plots};
use lacrosse::{AliasTable, OutputConfig, ScraperConfig, SeasonConfig, SeasonRecord};

#[cfg(feature = "live")]
use lacrosse::collect::{Collector, Stage};
#[cfg(feature = "live")]
use lacrosse::data::save_records;
#[cfg(feature = "live")]
use lacrosse::scraper::{ArchiveClient, WebDriverSession};

#[derive(Parser)]
#[command(name = "lacrosse")]
#[command(author, version, about = "NCAA lacrosse win predictor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Season cache CSV
    #[arg(long, default_value_os_t = OutputConfig::default().cache_path, global = true)]
    cache: PathBuf,

    /// Output directory for plot artifacts
    #[arg(long, default_value_os_t = OutputConfig::default().plots_dir, global = true)]
    plots_dir: PathBuf,

    /// Alias table JSON ({"aliases": {"UAlbany": "Albany"}}) replacing the built-in one
    #[arg(long, global = true)]
    aliases: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every season into the cache (requires live feature)
    #[cfg(feature = "live")]
    Scrape {
        /// Re-scrape even if the cache exists
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        scrape: ScrapeArgs,
    },

    /// Fit the win model and write the plots (scrapes first if the cache is missing)
    Report {
        /// Use the Pythagorean expectation predictor
        #[arg(long)]
        pythagorean: bool,

        /// Pythagorean exponent
        #[arg(long, default_value_t = DEFAULT_EXPONENT)]
        exponent: f64,

        /// Linear predictor base win rate
        #[arg(long, default_value_t = DEFAULT_BASE_RATE)]
        base_rate: f64,

        /// Linear predictor weight on GPG - GAPG
        #[arg(long, default_value_t = DEFAULT_WEIGHT)]
        weight: f64,

        /// First evaluation season; earlier seasons train the model
        #[arg(long, default_value_t = SeasonConfig::default().split_year)]
        split_year: u16,

        /// Fit without an intercept
        #[arg(long)]
        no_intercept: bool,

        /// Skip writing plot artifacts
        #[arg(long)]
        no_plots: bool,

        #[cfg(feature = "live")]
        #[command(flatten)]
        scrape: ScrapeArgs,
    },

    /// Show the cached seasons
    List {
        /// Show the teams of one season
        #[arg(short, long)]
        year: Option<u16>,
    },
}

#[cfg_attr(not(feature = "live"), allow(dead_code))]
#[derive(Args, Clone)]
struct ScrapeArgs {
    /// First season
    #[arg(long, default_value_t = SeasonConfig::default().start_year)]
    start_year: u16,

    /// Last season
    #[arg(long, default_value_t = SeasonConfig::default().end_year)]
    end_year: u16,

    /// WebDriver endpoint
    #[arg(long, env = "WEBDRIVER_URL", default_value_t = ScraperConfig::default().webdriver_url)]
    webdriver_url: String,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Timeout per page interaction in seconds
    #[arg(long, default_value_t = ScraperConfig::default().step_timeout_secs)]
    timeout: u64,

    /// Pause after each selection in milliseconds
    #[arg(long, default_value_t = ScraperConfig::default().settle_ms)]
    settle_ms: u64,

    /// Delay between archive requests in milliseconds
    #[arg(long, default_value_t = ScraperConfig::default().delay_ms)]
    delay: u64,

    /// Attempts per season and category, the first one included
    #[arg(long, default_value_t = ScraperConfig::default().max_attempts)]
    attempts: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    println!("{}", "Lacrosse Moneyball v0.1.0".cyan().bold());
    println!();

    let output = OutputConfig {
        cache_path: cli.cache.clone(),
        plots_dir: cli.plots_dir.clone(),
    };
    let aliases = load_aliases(cli.aliases.as_deref())?;

    match cli.command {
        #[cfg(feature = "live")]
        Commands::Scrape { force, scrape } => {
            if output.cache_path.exists() && !force {
                println!(
                    "{}: {:?} already exists (use --force to re-scrape)",
                    "Cached".yellow(),
                    output.cache_path
                );
                return Ok(());
            }
            let records = scrape_seasons(&scrape, &aliases, &output.cache_path)?;
            print_season_overview(&records);
        }
        Commands::Report {
            pythagorean,
            exponent,
            base_rate,
            weight,
            split_year,
            no_intercept,
            no_plots,
            #[cfg(feature = "live")]
            scrape,
        } => {
            let predictor = if pythagorean {
                WinPredictor::pythagorean(exponent)
            } else {
                WinPredictor::Linear { base_rate, weight }
            };
            let options = AnalysisOptions {
                predictor,
                split_year,
                with_intercept: !no_intercept,
            };

            #[cfg(feature = "live")]
            let records = if output.cache_path.exists() {
                load_cache(&output.cache_path)?
            } else {
                scrape_seasons(&scrape, &aliases, &output.cache_path)?
            };
            #[cfg(not(feature = "live"))]
            let records = load_cache(&output.cache_path)?;

            run_report(&records, &options, (!no_plots).then_some(output.plots_dir.as_path()))?;
        }
        Commands::List { year } => run_list(&output.cache_path, year)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_aliases(path: Option<&Path>) -> Result<AliasTable> {
    match path {
        Some(path) => AliasTable::from_json_file(path)
            .with_context(|| format!("Failed to load alias table from {:?}", path)),
        None => Ok(AliasTable::default()),
    }
}

fn load_cache(path: &Path) -> Result<Vec<SeasonRecord>> {
    if !path.exists() {
        anyhow::bail!(
            "Season cache {:?} not found; run `lacrosse scrape` first",
            path
        );
    }
    load_records(path).with_context(|| format!("Failed to load season cache {:?}", path))
}

#[cfg(feature = "live")]
fn scrape_seasons(args: &ScrapeArgs, aliases: &AliasTable, cache: &Path) -> Result<Vec<SeasonRecord>> {
    let seasons = SeasonConfig {
        start_year: args.start_year,
        end_year: args.end_year,
        ..Default::default()
    };
    seasons.validate()?;

    let scraper = ScraperConfig {
        webdriver_url: args.webdriver_url.clone(),
        headless: !args.headful,
        step_timeout_secs: args.timeout,
        settle_ms: args.settle_ms,
        delay_ms: args.delay,
        max_attempts: args.attempts.max(1),
        ..Default::default()
    };

    println!(
        "{}: seasons {}-{} via {}",
        "Scraping".green(),
        seasons.start_year,
        seasons.end_year,
        scraper.webdriver_url
    );
    println!();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let archive = ArchiveClient::new(scraper.clone()).context("Failed to build HTTP client")?;

    let pb = ProgressBar::new(Stage::COUNT as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let collected = rt.block_on(async {
        let mut session = WebDriverSession::connect(&scraper)
            .await
            .context("Failed to start browser session")?;

        let mut started = 0;
        let result = Collector::new(&mut session, &archive, &seasons, &scraper, aliases)
            .collect_with(|stage| {
                if started > 0 {
                    pb.inc(1);
                }
                started += 1;
                pb.set_message(stage.to_string());
            })
            .await;

        // Release the browser before reporting any aggregation error
        if let Err(e) = session.close().await {
            pb.println(format!("{}: {}", "Warning".yellow(), e));
        }
        result.context("Failed to build season table")
    });

    pb.finish_and_clear();
    let collected = collected?;

    if collected.failures.is_empty() {
        println!("{}: all units scraped", "Complete".green());
    } else {
        println!(
            "{}: {} unit(s) failed",
            "Warning".yellow(),
            collected.failures.len()
        );
        for failure in collected.failures.iter() {
            println!("  {}", failure.to_string().dimmed());
        }
    }

    save_records(cache, &collected.records)
        .with_context(|| format!("Failed to write season cache {:?}", cache))?;
    println!(
        "{}: {} season rows to {:?}",
        "Saved".green(),
        collected.records.len(),
        cache
    );
    println!();

    Ok(collected.records)
}

#[cfg_attr(not(feature = "live"), allow(dead_code))]
fn print_season_overview(records: &[SeasonRecord]) {
    let mut years: Vec<u16> = records.iter().map(|r| r.year).collect();
    years.dedup();
    println!("{:>6} {:>6} {:>9}", "Year", "Teams", "Playoffs");
    println!("{}", "-".repeat(23));
    for year in years {
        let season: Vec<&SeasonRecord> = records.iter().filter(|r| r.year == year).collect();
        let playoffs = season.iter().filter(|r| r.made_playoffs).count();
        println!("{:>6} {:>6} {:>9}", year, season.len(), playoffs);
    }
}

fn run_report(
    records: &[SeasonRecord],
    options: &AnalysisOptions,
    plots_dir: Option<&Path>,
) -> Result<()> {
    println!(
        "{}: {} seasons, predictor {}",
        "Analyzing".green(),
        records.len(),
        options.predictor
    );
    println!();

    let analysis = run_analysis(records, options).context("Failed to fit win model")?;

    println!("{}", "Wins ~ WinPredictor (training seasons):".yellow().bold());
    print_fit_summary(analysis.wins_model.summary());

    for (rate, model) in &analysis.rate_models {
        println!(
            "\n{}",
            format!("WinPct ~ {} (training seasons):", rate).yellow().bold()
        );
        print_fit_summary(model.summary());
    }
    for (rate, e) in &analysis.rate_failures {
        println!(
            "\n{}: WinPct ~ {} not fit: {}",
            "Warning".yellow(),
            rate,
            e
        );
    }

    print_predictions(&analysis);

    if let Some(dir) = plots_dir {
        let plots = build_model_plots(&analysis);
        let written = write_model_plots(&plots, dir, Utc::now())
            .with_context(|| format!("Failed to write plots to {:?}", dir))?;
        println!(
            "\n{}: {} files in {:?}",
            "Plots".green(),
            written.len(),
            dir
        );
    }

    Ok(())
}

fn print_fit_summary(summary: &FitSummary) {
    println!(
        "{:<12} {:>10} {:>10} {:>8}",
        "", "coef", "std err", "t"
    );
    println!("{}", "-".repeat(43));
    if let Some(c) = &summary.intercept {
        println!(
            "{:<12} {:>10.4} {:>10.4} {:>8.3}",
            "intercept", c.estimate, c.std_error, c.t_value
        );
    }
    let c = &summary.slope;
    println!(
        "{:<12} {:>10.4} {:>10.4} {:>8.3}",
        "slope", c.estimate, c.std_error, c.t_value
    );
    println!(
        "n = {}, R² = {:.4}, residual std err = {:.4} on {} df",
        summary.n, summary.r_squared, summary.residual_std_error, summary.degrees_of_freedom
    );
}

fn print_predictions(analysis: &WinAnalysis) {
    if analysis.predictions.is_empty() {
        println!(
            "\n{}",
            format!(
                "No evaluation seasons from {} on.",
                analysis.options.split_year
            )
            .yellow()
        );
        return;
    }

    println!("\n{}", "Evaluation predictions:".yellow().bold());
    println!(
        "{:>6} {:<28} {:>5} {:>7} {:>8} {:>9}",
        "Year", "Team", "Won", "Pred", "Resid", "Playoffs"
    );
    println!("{}", "-".repeat(68));

    for p in &analysis.predictions {
        let residual = format!("{:+.2}", p.residual());
        let residual = if p.residual().abs() >= 3.0 {
            residual.red()
        } else {
            residual.normal()
        };
        println!(
            "{:>6} {:<28} {:>5} {:>7.2} {:>8} {:>9}",
            p.year,
            p.team,
            p.won,
            p.predicted,
            residual,
            if p.made_playoffs { "yes" } else { "no" }
        );
    }

    let m = &analysis.metrics;
    println!();
    println!(
        "{}: R² {:.4}  MAE {:.3}  RMSE {:.3}  bias {:+.3}  (n = {})",
        "Evaluation".green(),
        m.r2,
        m.mae,
        m.rmse,
        m.bias,
        m.n
    );

    print_dimension("Analysis by Playoffs:", &analysis.by_playoffs);
    print_dimension("Analysis by Conference:", &analysis.by_conference);
}

fn print_dimension(title: &str, rows: &[DimensionAnalysis]) {
    println!("\n{}", title.yellow().bold());
    println!(
        "{:<20} {:>6} {:>9} {:>9} {:>7}",
        "Key", "Teams", "Mean Won", "Mean Pred", "MAE"
    );
    println!("{}", "-".repeat(55));
    for a in rows {
        println!(
            "{:<20} {:>6} {:>9.2} {:>9.2} {:>7.3}",
            a.key, a.teams, a.mean_won, a.mean_predicted, a.mae
        );
    }
}

fn run_list(cache: &Path, year: Option<u16>) -> Result<()> {
    if !cache.exists() {
        println!("{}: {:?}", "No season cache".yellow(), cache);
        return Ok(());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message("Loading season cache...");

    match year {
        None => {
            let summaries = season_summaries(cache)
                .with_context(|| format!("Failed to summarize {:?}", cache))?;
            pb.finish_and_clear();

            println!("{:>6} {:>6} {:>9} {:>9}", "Year", "Teams", "Playoffs", "Mean GPG");
            println!("{}", "-".repeat(33));
            for s in &summaries {
                println!(
                    "{:>6} {:>6} {:>9} {:>9.2}",
                    s.year, s.teams, s.playoff_teams, s.mean_gpg
                );
            }
            println!();
            println!(
                "Total: {} seasons, {} team-seasons",
                summaries.len(),
                summaries.iter().map(|s| s.teams).sum::<usize>()
            );
        }
        Some(year) => {
            let records = load_cache(cache)?;
            pb.finish_and_clear();

            let season: Vec<&SeasonRecord> = records.iter().filter(|r| r.year == year).collect();
            if season.is_empty() {
                println!("{}", format!("No teams cached for {}.", year).yellow());
                return Ok(());
            }

            println!(
                "{:<28} {:<16} {:>5} {:>5} {:>6} {:>6} {:>9}",
                "Team", "Conference", "Won", "Lost", "GPG", "GAPG", "Playoffs"
            );
            println!("{}", "-".repeat(83));
            for r in &season {
                let playoffs = if r.made_playoffs {
                    "yes".green()
                } else {
                    "no".normal()
                };
                println!(
                    "{:<28} {:<16} {:>5} {:>5} {:>6.2} {:>6.2} {:>9}",
                    r.team, r.conference, r.won, r.lost, r.gpg, r.gapg, playoffs
                );
            }
            println!();
            println!("Total: {} teams in {}", season.len(), year);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_come_from_config() {
        let cli = Cli::try_parse_from(["lacrosse", "report"]).unwrap();
        let output = OutputConfig::default();
        assert_eq!(cli.cache, output.cache_path);
        assert_eq!(cli.plots_dir, output.plots_dir);

        match cli.command {
            Commands::Report { split_year, .. } => {
                assert_eq!(split_year, SeasonConfig::default().split_year);
                assert_eq!(split_year, AnalysisOptions::default().split_year);
            }
            _ => panic!("expected report"),
        }
    }

    #[cfg(feature = "live")]
    #[test]
    fn test_scrape_attempts_flag() {
        let cli = Cli::try_parse_from(["lacrosse", "scrape", "--attempts", "5"]).unwrap();
        match cli.command {
            Commands::Scrape { scrape, .. } => {
                assert_eq!(scrape.attempts, 5);
                assert_eq!(scrape.start_year, SeasonConfig::default().start_year);
            }
            _ => panic!("expected scrape"),
        }
    }
}
