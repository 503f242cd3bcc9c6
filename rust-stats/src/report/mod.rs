//! Plot artifacts for a finished analysis
//!
//! Four figures per run, each written as `<name>.json` and `<name>.html`:
//! - `model_plot_train`: wins vs. predictor on the training seasons
//! - `model_plot_test`: wins vs. predictor on the evaluation seasons
//! - `model_plot_gpg_train`, `model_plot_gapg_train`: win percentage vs. rate

pub mod plot;

pub use plot::{render_html, ModelPlot, ScatterPoint};

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::RenderError;
use crate::model::{OlsModel, RateRegressor, WinAnalysis};
use crate::models::ScoredSeason;

/// Build every figure of the analysis. The test plot is left out when
/// there are no evaluation seasons.
pub fn build_model_plots(analysis: &WinAnalysis) -> Vec<ModelPlot> {
    let train = &analysis.split.train;
    let eval = &analysis.split.eval;
    let train_span = year_span(&analysis.split.train_years());

    let mut plots = vec![wins_plot(
        "model_plot_train",
        format!("Actual Wins vs. Projected Wins [{}]", train_span),
        train,
        &analysis.wins_model,
    )];

    if eval.is_empty() {
        warn!("No evaluation seasons, skipping model_plot_test");
    } else {
        plots.push(wins_plot(
            "model_plot_test",
            format!(
                "Actual Wins vs. Projected Wins {}",
                year_span(&analysis.split.eval_years())
            ),
            eval,
            &analysis.wins_model,
        ));
    }

    for (rate, model) in &analysis.rate_models {
        let title = match rate {
            RateRegressor::Gpg => "Goals Per Game vs. Win Percentage",
            RateRegressor::Gapg => "Goals Against Per Game vs. Win Percentage",
        };
        plots.push(ModelPlot {
            name: format!("model_plot_{}_train", rate.slug()),
            title: format!("{} [{}]", title, train_span),
            x_label: rate.to_string(),
            y_label: "WinPct".to_string(),
            points: train
                .iter()
                .map(|s| point(s, rate.value(s), s.win_pct, model))
                .collect(),
        });
    }

    plots
}

fn wins_plot(name: &str, title: String, seasons: &[ScoredSeason], model: &OlsModel) -> ModelPlot {
    ModelPlot {
        name: name.to_string(),
        title,
        x_label: "WinPredictor".to_string(),
        y_label: "Won".to_string(),
        points: seasons
            .iter()
            .map(|s| point(s, s.win_predictor, s.record.won as f64, model))
            .collect(),
    }
}

fn point(season: &ScoredSeason, x: f64, y: f64, model: &OlsModel) -> ScatterPoint {
    ScatterPoint {
        x,
        y,
        team: season.record.team.clone(),
        year: season.record.year,
        made_playoffs: season.record.made_playoffs,
        fitted: model.predict(x),
    }
}

/// `2011-2016`, or a single year
fn year_span(years: &[u16]) -> String {
    match (years.first(), years.last()) {
        (Some(first), Some(last)) if first != last => format!("{}-{}", first, last),
        (Some(first), _) => first.to_string(),
        _ => String::new(),
    }
}

/// Write `<name>.json` and `<name>.html` for each plot into `dir`
pub fn write_model_plots<P: AsRef<Path>>(
    plots: &[ModelPlot],
    dir: P,
    generated_at: DateTime<Utc>,
) -> Result<Vec<PathBuf>, RenderError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(plots.len() * 2);
    for plot in plots {
        let figure = plot.to_figure(generated_at);

        let json_path = dir.join(format!("{}.json", plot.name));
        write_file(&json_path, &serde_json::to_string_pretty(&figure)?)?;
        written.push(json_path);

        let html_path = dir.join(format!("{}.html", plot.name));
        write_file(&html_path, &render_html(&plot.title, &figure)?)?;
        written.push(html_path);

        info!("Wrote {} ({} points)", plot.name, plot.points.len());
    }

    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<(), RenderError> {
    fs::write(path, contents).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{run_analysis, AnalysisOptions};
    use crate::models::SeasonRecord;

    fn records() -> Vec<SeasonRecord> {
        let mut records = Vec::new();
        for year in [2015u16, 2016, 2017] {
            for t in 0..5u32 {
                records.push(
                    SeasonRecord::from_totals(
                        format!("Team {}", t),
                        "ACC".to_string(),
                        year,
                        3 + 2 * t,
                        13 - 2 * t,
                        140 + 15 * t,
                        160 - 5 * t,
                        t >= 3,
                    )
                    .unwrap(),
                );
            }
        }
        records
    }

    #[test]
    fn test_build_model_plots() {
        let analysis = run_analysis(&records(), &AnalysisOptions::default()).unwrap();
        let plots = build_model_plots(&analysis);

        let names: Vec<&str> = plots.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "model_plot_train",
                "model_plot_test",
                "model_plot_gpg_train",
                "model_plot_gapg_train"
            ]
        );
        assert_eq!(plots[0].title, "Actual Wins vs. Projected Wins [2015-2016]");
        assert_eq!(plots[1].title, "Actual Wins vs. Projected Wins 2017");
        assert_eq!(plots[0].points.len(), 10);
        assert_eq!(plots[1].points.len(), 5);
        assert_eq!(plots[2].x_label, "GPG");
        assert_eq!(plots[3].y_label, "WinPct");
    }

    #[test]
    fn test_fitted_values_follow_model() {
        let analysis = run_analysis(&records(), &AnalysisOptions::default()).unwrap();
        let plots = build_model_plots(&analysis);

        for p in &plots[1].points {
            assert!((p.fitted - analysis.wins_model.predict(p.x)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_failed_rate_model_has_no_plot() {
        let records: Vec<SeasonRecord> = records()
            .into_iter()
            .map(|r| {
                SeasonRecord::from_totals(
                    r.team, r.conference, r.year, r.won, r.lost, r.goals, 160, r.made_playoffs,
                )
                .unwrap()
            })
            .collect();
        let analysis = run_analysis(&records, &AnalysisOptions::default()).unwrap();
        let plots = build_model_plots(&analysis);

        let names: Vec<&str> = plots.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["model_plot_train", "model_plot_test", "model_plot_gpg_train"]
        );
    }

    #[test]
    fn test_year_span() {
        assert_eq!(year_span(&[2011, 2012, 2016]), "2011-2016");
        assert_eq!(year_span(&[2019]), "2019");
        assert_eq!(year_span(&[]), "");
    }

    #[test]
    fn test_write_model_plots() {
        let analysis = run_analysis(&records(), &AnalysisOptions::default()).unwrap();
        let plots = build_model_plots(&analysis);
        let dir = std::env::temp_dir().join(format!("lacrosse-plots-{}", std::process::id()));

        let written = write_model_plots(&plots, &dir, Utc::now()).unwrap();

        assert_eq!(written.len(), 8);
        assert!(dir.join("model_plot_test.json").exists());
        let json = fs::read_to_string(dir.join("model_plot_gpg_train.json")).unwrap();
        let figure: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(figure["data"].as_array().unwrap().len(), 3);
        let _ = fs::remove_dir_all(&dir);
    }
}
