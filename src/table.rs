//! Read-only view over a scraped card-list table.
//!
//! The row parser only needs rows of cells, and from each cell its text and
//! the labels of the links it contains. [`HtmlTable`] provides that over
//! `scraper`; [`PlainCell`] does so for data that is already extracted.

use cardlist_scraping_utils::{regex, selector};
use scraper::{ElementRef, Html};

pub trait TableCell {
    /// All text below the cell, as is.
    fn text(&self) -> String;
    /// Trimmed, non-empty labels of the link-like elements in the cell.
    fn link_labels(&self) -> Vec<String>;
}

pub trait TableRow {
    type Cell: TableCell;
    /// Data cells only; header cells are not included.
    fn cells(&self) -> Vec<Self::Cell>;
}

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct PlainCell {
    pub text: String,
    pub links: Vec<String>,
}

impl PlainCell {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            links: vec![],
        }
    }

    pub fn from_links<S: Into<String>>(links: impl IntoIterator<Item = S>) -> Self {
        let links: Vec<String> = links.into_iter().map(Into::into).collect();
        Self {
            text: links.join(" "),
            links,
        }
    }
}

impl TableCell for PlainCell {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn link_labels(&self) -> Vec<String> {
        self.links
            .iter()
            .map(|link| link.trim())
            .filter(|link| !link.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

impl TableRow for Vec<PlainCell> {
    type Cell = PlainCell;
    fn cells(&self) -> Vec<PlainCell> {
        self.clone()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HtmlCell<'a>(ElementRef<'a>);

impl TableCell for HtmlCell<'_> {
    fn text(&self) -> String {
        self.0.text().collect()
    }

    fn link_labels(&self) -> Vec<String> {
        self.0
            .select(selector!("a"))
            .map(|a| a.text().collect::<String>().trim().to_owned())
            .filter(|label| !label.is_empty())
            .collect()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct HtmlRow<'a>(ElementRef<'a>);

impl<'a> TableRow for HtmlRow<'a> {
    type Cell = HtmlCell<'a>;
    fn cells(&self) -> Vec<HtmlCell<'a>> {
        self.0
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "td")
            .map(HtmlCell)
            .collect()
    }
}

pub struct HtmlTable {
    document: Html,
}

impl HtmlTable {
    /// Accepts a whole page or a bare `<tbody>` / `<tr>` fragment.
    pub fn parse(html: &str) -> Self {
        let trimmed = html.trim();
        // A fragment outside of <table> would lose its row structure.
        let document = if regex!(r"(?i)^<(tbody|tr)[\s>]").is_match(trimmed) {
            Html::parse_document(&format!("<table>{trimmed}</table>"))
        } else {
            Html::parse_document(trimmed)
        };
        Self { document }
    }

    /// Rows of the first table body in the document.
    pub fn rows(&self) -> Vec<HtmlRow<'_>> {
        self.document
            .select(selector!("tbody"))
            .next()
            .map(|tbody| tbody.select(selector!("tr")).map(HtmlRow).collect())
            .unwrap_or_default()
    }
}
