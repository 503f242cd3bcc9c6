//! Plotly scatter figures with an OLS line
//!
//! Figures are plain Plotly JSON (`{"data": [...], "layout": {...}}`), so they
//! load with `plotly.io.read_json` or `Plotly.newPlot` without a Rust
//! plotting dependency. The HTML page embeds the same JSON.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Trace colors per playoff status, from the Plotly default sequence
const COLOR_NO: &str = "#636efa";
const COLOR_YES: &str = "#EF553B";
const COLOR_OLS: &str = "#00cc96";

/// One team-season on a scatter plot
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub team: String,
    pub year: u16,
    pub made_playoffs: bool,
    /// Model value at `x`
    pub fitted: f64,
}

impl ScatterPoint {
    pub fn hover_text(&self) -> String {
        format!("{} ({})", self.team, self.year)
    }
}

/// A scatter plot of one model
#[derive(Debug, Clone)]
pub struct ModelPlot {
    /// File stem of the artifacts
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ScatterPoint>,
}

impl ModelPlot {
    /// Plotly figure: one marker trace per playoff status plus the OLS line
    pub fn to_figure(&self, generated_at: DateTime<Utc>) -> Value {
        let mut data = Vec::with_capacity(3);
        for (made_playoffs, label, color) in [(false, "no", COLOR_NO), (true, "yes", COLOR_YES)] {
            let group: Vec<&ScatterPoint> = self
                .points
                .iter()
                .filter(|p| p.made_playoffs == made_playoffs)
                .collect();
            if group.is_empty() {
                continue;
            }
            data.push(json!({
                "type": "scatter",
                "mode": "markers",
                "name": label,
                "legendgroup": label,
                "x": group.iter().map(|p| p.x).collect::<Vec<_>>(),
                "y": group.iter().map(|p| p.y).collect::<Vec<_>>(),
                "text": group.iter().map(|p| p.hover_text()).collect::<Vec<_>>(),
                "hovertemplate": format!(
                    "<b>%{{text}}</b><br>{}=%{{x}}<br>{}=%{{y}}<extra></extra>",
                    self.x_label, self.y_label
                ),
                "marker": { "color": color },
            }));
        }

        // Line drawn in x order
        let mut line: Vec<(f64, f64)> = self.points.iter().map(|p| (p.x, p.fitted)).collect();
        line.sort_by(|a, b| a.0.total_cmp(&b.0));
        data.push(json!({
            "type": "scatter",
            "mode": "lines",
            "name": "OLS",
            "x": line.iter().map(|(x, _)| *x).collect::<Vec<_>>(),
            "y": line.iter().map(|(_, y)| *y).collect::<Vec<_>>(),
            "line": { "color": COLOR_OLS },
        }));

        json!({
            "data": data,
            "layout": {
                "title": { "text": self.title },
                "xaxis": { "title": { "text": self.x_label } },
                "yaxis": { "title": { "text": self.y_label } },
                "legend": { "title": { "text": "Playoffs" } },
                "template": dark_template(),
                "meta": { "generated_at": generated_at.to_rfc3339() },
            },
        })
    }
}

/// Minimal stand-in for the `plotly_dark` template
fn dark_template() -> Value {
    json!({
        "layout": {
            "paper_bgcolor": "rgb(17,17,17)",
            "plot_bgcolor": "rgb(17,17,17)",
            "font": { "color": "#f2f5fa" },
            "xaxis": { "gridcolor": "#283442", "zerolinecolor": "#283442" },
            "yaxis": { "gridcolor": "#283442", "zerolinecolor": "#283442" },
        }
    })
}

/// Standalone page rendering `figure` with plotly.js
pub fn render_html(title: &str, figure: &Value) -> Result<String, serde_json::Error> {
    let figure = serde_json::to_string(figure)?;
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
</head>
<body style="background-color: rgb(17,17,17); margin: 0">
<div id="plot" style="width: 100%; height: 100vh"></div>
<script>
const figure = {figure};
Plotly.newPlot("plot", figure.data, figure.layout);
</script>
</body>
</html>
"#,
        title = escape_html(title),
        cdn = PLOTLY_CDN,
        figure = figure.replace("</", "<\\/"),
    ))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
