use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::service::CustomerRecord;

pub const COLUMNS: [&str; 7] = [
    "Region",
    "Category",
    "CompanyName",
    "ExtraRegionCode",
    "BranchName",
    "BranchHandling",
    "CustomerID",
];

/// One page of rows. Pages are 1-based; an empty result has zero pages and
/// page number 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub number: usize,
    pub total_pages: usize,
    pub rows: &'a [T],
}

/// Out-of-range page numbers clamp to the first or last page.
pub fn paginate<T>(rows: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = rows.len().div_ceil(per_page);
    if total_pages == 0 {
        return Page {
            number: 0,
            total_pages: 0,
            rows: &rows[..0],
        };
    }
    let number = page.clamp(1, total_pages);
    let start = (number - 1) * per_page;
    let end = (start + per_page).min(rows.len());
    Page {
        number,
        total_pages,
        rows: &rows[start..end],
    }
}

fn display_width(value: &str) -> usize {
    UnicodeWidthStr::width(value)
}

fn pad(value: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(value));
    format!("{value}{}", " ".repeat(fill))
}

pub fn render_table(page: &Page<'_, CustomerRecord>) -> String {
    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| display_width(c)).collect();
    for row in page.rows {
        for (i, cell) in row.cells().iter().enumerate() {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let mut out = String::new();
    let header = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| pad(c, widths[i]))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&header.trim_end().bold().to_string());
    out.push('\n');
    let rule = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&rule);
    out.push('\n');
    for row in page.rows {
        let line = row
            .cells()
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths[i]))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Page numbers with the current one highlighted, e.g. `1 [2] 3`.
pub fn render_page_strip<T>(page: &Page<'_, T>) -> String {
    if page.total_pages <= 1 {
        return String::new();
    }
    (1..=page.total_pages)
        .map(|n| {
            if n == page.number {
                format!("[{}]", n).bold().to_string()
            } else {
                n.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
