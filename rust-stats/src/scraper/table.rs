//! Rankings table HTML parser

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

use crate::error::FetchError;
use crate::models::RawStatRow;

/// Column holding the `"Team (Conference)"` key
pub const TEAM_COLUMN: &str = "Team";

/// Header cells and body rows of an HTML table, text only
#[derive(Debug, Clone, Default)]
pub struct HtmlTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of one column
    pub fn column(&self, name: &str) -> Result<Vec<&str>, FetchError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| FetchError::MissingColumn(name.to_string()))?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(idx).map(String::as_str))
            .collect())
    }

    /// Rows keyed by the team cell, keeping only `columns`
    pub fn to_raw_rows(&self, columns: &[&str]) -> Result<Vec<RawStatRow>, FetchError> {
        let team_idx = self
            .column_index(TEAM_COLUMN)
            .ok_or_else(|| FetchError::MissingColumn(TEAM_COLUMN.to_string()))?;

        let mut indices = Vec::with_capacity(columns.len());
        for column in columns {
            let idx = self
                .column_index(column)
                .ok_or_else(|| FetchError::MissingColumn(column.to_string()))?;
            indices.push((column.to_string(), idx));
        }

        Ok(self
            .rows
            .iter()
            .filter_map(|row| {
                let team = row.get(team_idx)?.clone();
                let values: HashMap<String, String> = indices
                    .iter()
                    .filter_map(|(name, idx)| row.get(*idx).map(|v| (name.clone(), v.clone())))
                    .collect();
                Some(RawStatRow { team, values })
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse the first `<table>` in `html`.
///
/// Header cells come from `<thead>`; if there is none, the first row's `<th>`
/// cells are used. Body rows with fewer cells than headers (DataTables'
/// "No data available" placeholder) are dropped.
pub fn parse_html_table(html: &str) -> Result<HtmlTable, FetchError> {
    let document = Html::parse_fragment(html);

    let table_selector = selector("table")?;
    let header_selector = selector("thead tr th")?;
    let row_selector = selector("tr")?;
    let th_selector = selector("th")?;
    let td_selector = selector("td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| FetchError::ParseError("Could not find table".to_string()))?;

    let mut headers: Vec<String> = table.select(&header_selector).map(cell_text).collect();
    if headers.is_empty() {
        if let Some(first) = table.select(&row_selector).next() {
            headers = first.select(&th_selector).map(cell_text).collect();
        }
    }
    if headers.is_empty() {
        return Err(FetchError::ParseError(
            "Could not find table header".to_string(),
        ));
    }

    let rows = table
        .select(&row_selector)
        .map(|tr| tr.select(&td_selector).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .filter(|cells| {
            if cells.len() < headers.len() {
                tracing::debug!("Skipping short row: {:?}", cells);
                false
            } else {
                true
            }
        })
        .collect();

    Ok(HtmlTable { headers, rows })
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::ParseError(e.to_string()))
}

/// Element text with whitespace runs collapsed
/// Element text with whitespace runs collapsed to single spaces
pub(crate) fn cell_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
