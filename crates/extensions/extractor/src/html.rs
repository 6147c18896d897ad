//! Selector-driven HTML queries.
//!
//! `scraper::Html` is not `Send`, so every function here parses and
//! queries in one synchronous call and hands back owned data.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};

use crate::csv;
use crate::error::ExtractError;

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::InvalidSelector(format!("{}: {}", css, e)))
}

/// Concatenated text of an element with whitespace runs collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Attribute values, or inner HTML, of every match.
pub(crate) fn select_html(
    html: &str,
    css: &str,
    attribute: Option<&str>,
) -> Result<Vec<String>, ExtractError> {
    let doc = Html::parse_document(html);
    let sel = selector(css)?;
    let matches: Vec<ElementRef<'_>> = doc.select(&sel).collect();
    if matches.is_empty() {
        return Err(ExtractError::NotFound(format!(
            "Could not find element with selector: {}",
            css
        )));
    }
    Ok(match attribute {
        Some(name) => matches
            .iter()
            .filter_map(|el| el.value().attr(name).map(str::to_string))
            .collect(),
        None => matches.iter().map(|el| el.inner_html()).collect(),
    })
}

/// Text of every match, one per line.
pub(crate) fn select_text(html: &str, css: &str) -> Result<String, ExtractError> {
    let doc = Html::parse_document(html);
    let sel = selector(css)?;
    let texts: Vec<String> = doc.select(&sel).map(element_text).collect();
    if texts.is_empty() {
        return Err(ExtractError::NotFound(format!(
            "Could not find element with selector: {}",
            css
        )));
    }
    Ok(texts.join("\n"))
}

/// A table read as a header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Header for column `i`, falling back to `column_{i}` when the header
    /// row is short or the cell is blank.
    pub fn header(&self, i: usize) -> String {
        match self.headers.get(i) {
            Some(h) if !h.is_empty() => h.clone(),
            _ => format!("column_{}", i),
        }
    }

    /// Rows as objects keyed by header.
    pub fn to_json(&self) -> Value {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = row
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| (self.header(i), Value::String(cell.clone())))
                    .collect();
                Value::Object(obj)
            })
            .collect();
        Value::Array(records)
    }

    /// Headers for every column of the widest row.
    pub fn columns(&self) -> Vec<String> {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        (0..width).map(|i| self.header(i)).collect()
    }

    pub fn to_csv(&self) -> String {
        csv::to_csv(Some(&self.columns()[..]), &self.rows)
    }
}

/// The first table matching `css`.
pub(crate) fn select_table(html: &str, css: &str) -> Result<TableData, ExtractError> {
    let doc = Html::parse_document(html);
    let sel = selector(css)?;
    let table = doc.select(&sel).next().ok_or_else(|| {
        ExtractError::NotFound(format!("Could not find table with selector: {}", css))
    })?;

    let tr = selector("tr")?;
    let head_tr = selector("thead tr")?;
    let header_cells = selector("th, td")?;
    let data_cells = selector("td")?;

    let header_row = table
        .select(&head_tr)
        .next()
        .or_else(|| table.select(&tr).next());

    let mut data = TableData::default();
    if let Some(header_row) = header_row {
        data.headers = header_row.select(&header_cells).map(element_text).collect();
    }
    let header_id = header_row.map(|row| row.id());

    for row in table.select(&tr) {
        if Some(row.id()) == header_id {
            continue;
        }
        let cells: Vec<String> = row.select(&data_cells).map(element_text).collect();
        if !cells.is_empty() {
            data.rows.push(cells);
        }
    }
    Ok(data)
}

/// `li` texts of the first list matching `css`.
pub(crate) fn select_list(html: &str, css: &str) -> Result<Vec<String>, ExtractError> {
    let doc = Html::parse_document(html);
    let sel = selector(css)?;
    let list = doc.select(&sel).next().ok_or_else(|| {
        ExtractError::NotFound(format!("Could not find list with selector: {}", css))
    })?;
    let li = selector("li")?;
    Ok(list.select(&li).map(element_text).collect())
}

/// `src` of the first image matching `css`.
pub(crate) fn select_image_src(html: &str, css: &str) -> Result<String, ExtractError> {
    let doc = Html::parse_document(html);
    let sel = selector(css)?;
    let img = doc.select(&sel).next().ok_or_else(|| {
        ExtractError::NotFound(format!("Could not find image with selector: {}", css))
    })?;
    img.value()
        .attr("src")
        .filter(|src| !src.trim().is_empty())
        .map(|src| src.trim().to_string())
        .ok_or_else(|| ExtractError::NotFound("Image does not have a src attribute".to_string()))
}

#[cfg(test)]
#[path = "html_tests.rs"]
mod tests;
