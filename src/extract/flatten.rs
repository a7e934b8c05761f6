// src/extract/flatten.rs
//
// Resolves an HTML change-history table, rowspans/colspans and all, into a
// dense 2D matrix of plain-text cell values. Row 0 is the header row.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{Error, Result};

/// Dense text grid produced from one table. Spans that would write outside
/// the grid are truncated, not errors; the source pages are not ours to fix.
pub type Matrix = Vec<Vec<Option<String>>>;

static TR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid tr selector"));
static A_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid a selector"));
static ANY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("*").expect("valid selector"));
static CITATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

/// One table cell before span resolution.
struct RawCell {
    text: String,
    rowspan: usize,
    colspan: usize,
}

/// Flatten `table` into a matrix. `doc` is the owning document, needed to
/// chase citation anchors to their footnote's outbound links. A `None`
/// table (page had no changes section) yields an empty matrix.
pub fn flatten_table(doc: &Html, table: Option<ElementRef>) -> Result<Matrix> {
    let table = match table {
        Some(t) => t,
        None => return Ok(Vec::new()),
    };
    if table.value().name() != "table" {
        return Err(Error::MalformedTable(table.value().name().to_string()));
    }

    let rows: Vec<Vec<RawCell>> = table
        .select(&TR_SEL)
        .enumerate()
        .map(|(r, tr)| {
            tr.children()
                .filter_map(ElementRef::wrap)
                .filter(|el| matches!(el.value().name(), "td" | "th"))
                .map(|cell| extract_cell(doc, cell, r == 0))
                .collect()
        })
        .filter(|cells: &Vec<RawCell>| !cells.is_empty())
        .collect();

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let n_rows = rows.len();
    let n_cols = column_count(&rows);

    // Fill pass: walk rows top to bottom, skip columns claimed by spans
    // from above, write each cell's text into every position it covers.
    let mut matrix: Matrix = vec![vec![None; n_cols]; n_rows];
    let mut claimed = vec![vec![false; n_cols]; n_rows];

    for (r, cells) in rows.iter().enumerate() {
        let mut c = 0usize;
        let last = cells.len().saturating_sub(1);
        for (i, cell) in cells.iter().enumerate() {
            while c < n_cols && claimed[r][c] {
                c += 1;
            }
            if c >= n_cols {
                break;
            }
            // colspan 0 spans to the end of the row, honored only on the
            // trailing cell; interior zeros would fabricate phantom columns.
            let cs = match cell.colspan {
                0 if i == last => n_cols - c,
                0 => 1,
                n => n,
            };
            // rowspan 0 spans to the bottom of the table.
            let rs = match cell.rowspan {
                0 => n_rows - r,
                n => n,
            };
            for dr in 0..rs {
                for dc in 0..cs {
                    let (rr, cc) = (r + dr, c + dc);
                    if rr < n_rows && cc < n_cols {
                        matrix[rr][cc] = Some(cell.text.clone());
                        claimed[rr][cc] = true;
                    }
                }
            }
            c += cs.max(1);
        }
    }

    Ok(matrix)
}

/// Column-count pass: per row, sum colspans of all cells but the last
/// (clamped to 1) plus the rowspans still pending from rows above. The
/// table is as wide as its widest row.
fn column_count(rows: &[Vec<RawCell>]) -> usize {
    let n_rows = rows.len();
    let mut pending: Vec<usize> = Vec::new();
    let mut max_cols = 0usize;

    for (r, cells) in rows.iter().enumerate() {
        if r > 0 {
            for p in pending.iter_mut() {
                *p -= 1;
            }
            pending.retain(|&p| p > 0);
        }
        let mut width = pending.len();
        let last = cells.len().saturating_sub(1);
        for (i, cell) in cells.iter().enumerate() {
            width += if i == last { 1 } else { cell.colspan.max(1) };
            let rs = if cell.rowspan == 0 {
                n_rows - r
            } else {
                cell.rowspan
            };
            if rs > 1 {
                pending.push(rs);
            }
        }
        max_cols = max_cols.max(width);
    }

    max_cols
}

fn span_attr(el: ElementRef, name: &str) -> usize {
    el.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
}

/// Pull the text out of one `<td>`/`<th>` and normalize it, in order:
/// line-break substitution, whitespace collapse, citation-marker strip,
/// duplicated-punctuation fix, trailing period (data cells only), at most
/// one resolved external hyperlink, paren balancing.
fn extract_cell(doc: &Html, cell: ElementRef, is_header: bool) -> RawCell {
    let mut buf = String::new();
    let mut link: Option<String> = None;
    let mut footnotes: Vec<String> = Vec::new();
    walk(cell, &mut buf, &mut link, &mut footnotes);

    // Inline anchors beat citation footnotes, but a citation's footnote is
    // consulted when the cell itself carried no external link.
    if link.is_none() {
        link = footnotes.iter().find_map(|id| footnote_link(doc, id));
    }

    let stripped = CITATION_RE.replace_all(&buf, "");
    let mut text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    while text.contains(". .") {
        text = text.replace(". .", ".");
    }
    if !is_header && !text.is_empty() && !text.ends_with('.') {
        text.push('.');
    }
    if let Some(href) = link {
        if !text.is_empty() {
            text.push_str(" - ");
        }
        text.push_str(&href);
    }
    let opens = text.matches('(').count();
    let closes = text.matches(')').count();
    for _ in closes..opens {
        text.push(')');
    }

    RawCell {
        text,
        rowspan: span_attr(cell, "rowspan"),
        colspan: span_attr(cell, "colspan"),
    }
}

/// Depth-first text accumulation. `<br>` becomes a sentence break unless
/// the preceding text ends in a colon or period, where a plain space reads
/// better. Citation superscripts contribute no text, only footnote ids.
fn walk(el: ElementRef, buf: &mut String, link: &mut Option<String>, footnotes: &mut Vec<String>) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            buf.push_str(text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        match child_el.value().name() {
            "br" => {
                let trimmed = buf.trim_end();
                if trimmed.is_empty() {
                    continue;
                }
                let soft_break = trimmed.ends_with(':') || trimmed.ends_with('.');
                let keep = trimmed.len();
                buf.truncate(keep);
                if soft_break {
                    buf.push(' ');
                } else {
                    buf.push_str(". ");
                }
            }
            "sup" if child_el.value().classes().any(|c| c == "reference") => {
                for a in child_el.select(&A_SEL) {
                    if let Some(id) = a.value().attr("href").and_then(|h| h.strip_prefix('#')) {
                        footnotes.push(id.to_string());
                    }
                }
            }
            "a" => {
                if link.is_none() {
                    if let Some(href) = child_el.value().attr("href") {
                        if is_external(href) {
                            *link = Some(href.to_string());
                        }
                    }
                }
                walk(child_el, buf, link, footnotes);
            }
            _ => walk(child_el, buf, link, footnotes),
        }
    }
}

/// Intra-site links (fragments, relative paths, anything on the wiki
/// itself) never make it into a cell; only genuine outbound links do.
fn is_external(href: &str) -> bool {
    match Url::parse(href) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && !url
                    .host_str()
                    .is_some_and(|h| h.ends_with("wikipedia.org") || h.ends_with("wikimedia.org"))
        }
        Err(_) => false,
    }
}

/// Find the footnote element `id` points at and return its first outbound
/// link, if any.
fn footnote_link(doc: &Html, id: &str) -> Option<String> {
    let note = doc
        .select(&ANY_SEL)
        .find(|el| el.value().attr("id") == Some(id))?;
    note.select(&A_SEL)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| is_external(href))
        .map(str::to_string)
}
