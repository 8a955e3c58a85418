pub mod table;

use serde::Serialize;

use crate::service::CustomerRecord;

pub use table::{paginate, render_page_strip, render_table, Page, COLUMNS};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" | "table" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PageRecord<'a> {
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub records: &'a [CustomerRecord],
}

pub fn render_json(
    page: &Page<'_, CustomerRecord>,
    total_rows: usize,
) -> Result<Vec<u8>, serde_json::Error> {
    let doc = PageRecord {
        page: page.number,
        total_pages: page.total_pages,
        total_rows,
        records: page.rows,
    };
    let mut out = serde_json::to_vec_pretty(&doc)?;
    out.push(b'\n');
    Ok(out)
}

pub fn render_text(page: &Page<'_, CustomerRecord>) -> Vec<u8> {
    let mut out = render_table(page);
    let strip = render_page_strip(page);
    if !strip.is_empty() {
        out.push('\n');
        out.push_str(&strip);
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_suggestions(items: &[String]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}\n", i + 1, item));
    }
    out
}
