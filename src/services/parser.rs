// src/services/parser.rs

//! Register book result page parser.
//!
//! The result table body is located by its id and every row is read by column
//! position:
//!
//! | # | content                                                |
//! |---|--------------------------------------------------------|
//! | 0 | `<img title="...">` carrying the flag                  |
//! | 1 | primary name as leading text, secondary name in `<div>` |
//! | 2 | home port                                              |
//! | 3 | call sign                                              |
//! | 4 | register number                                        |
//! | 5 | IMO number                                             |
//!
//! A row that breaks this layout fails the whole page with a parse error.
//! Rows without any `<td>` are not data rows and are ignored.

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{AppError, Result};
use crate::models::{ParserConfig, Record, RecordMap};

const COLUMN_COUNT: usize = 6;

/// Outcome of parsing one result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPage {
    /// Empty response body
    Empty,
    /// The server refused the query as too broad
    CapacityExceeded,
    /// Records found on the page, possibly none
    Records(RecordMap),
}

impl ParsedPage {
    pub fn into_records(self) -> RecordMap {
        match self {
            Self::Records(records) => records,
            Self::Empty | Self::CapacityExceeded => RecordMap::new(),
        }
    }
}

/// Parser for register book result pages.
#[derive(Debug)]
pub struct ResponseParser {
    table: Selector,
    image: Selector,
    secondary: Selector,
    capacity_marker: String,
}

impl ResponseParser {
    /// Create a parser from the configured selectors.
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            table: Self::parse_selector(&config.table_selector)?,
            image: Self::parse_selector("img")?,
            secondary: Self::parse_selector("div")?,
            capacity_marker: config.capacity_marker.clone(),
        })
    }

    /// Parse a page into records keyed by identifier.
    ///
    /// Empty and over-capacity pages yield an empty map.
    pub fn parse(&self, html: &str) -> Result<RecordMap> {
        Ok(self.parse_page(html)?.into_records())
    }

    /// Parse a page, telling empty and over-capacity pages apart.
    pub fn parse_page(&self, html: &str) -> Result<ParsedPage> {
        if html.trim().is_empty() {
            log::warn!("Got empty HTML response");
            return Ok(ParsedPage::Empty);
        }

        if html.contains(&self.capacity_marker) {
            log::warn!("Result set over the server limit, page ignored");
            return Ok(ParsedPage::CapacityExceeded);
        }

        let document = Html::parse_document(html);
        let mut records = RecordMap::new();

        let Some(table) = document.select(&self.table).next() else {
            log::debug!("No result table on page");
            return Ok(ParsedPage::Records(records));
        };

        for (index, row) in child_elements(table, "tr").enumerate() {
            if let Some(record) = self.parse_row(index, row)? {
                // Later rows win on duplicate identifiers.
                records.insert(record.identifier.clone(), record);
            }
        }

        Ok(ParsedPage::Records(records))
    }

    fn parse_row(&self, index: usize, row: ElementRef<'_>) -> Result<Option<Record>> {
        let cells: Vec<ElementRef<'_>> = child_elements(row, "td").collect();
        if cells.is_empty() {
            return Ok(None);
        }
        if cells.len() < COLUMN_COUNT {
            return Err(AppError::parse(
                index,
                format!("expected {COLUMN_COUNT} cells, found {}", cells.len()),
            ));
        }

        let flag = cells[0]
            .select(&self.image)
            .next()
            .ok_or_else(|| AppError::parse(index, "flag cell has no <img>"))?
            .value()
            .attr("title")
            .ok_or_else(|| AppError::parse(index, "flag <img> has no title"))?
            .trim()
            .to_string();

        let primary_name = leading_text(cells[1])
            .ok_or_else(|| AppError::parse(index, "name cell has no leading text"))?;

        let secondary_name = cells[1]
            .select(&self.secondary)
            .next()
            .map(text_of)
            .ok_or_else(|| AppError::parse(index, "name cell has no secondary name <div>"))?;

        let identifier = text_of(cells[5]);
        if identifier.is_empty() {
            return Err(AppError::parse(index, "identifier cell is blank"));
        }

        Ok(Some(Record {
            flag,
            primary_name,
            secondary_name,
            home_port: text_of(cells[2]),
            call_sign: text_of(cells[3]),
            registry_number: text_of(cells[4]),
            identifier,
        }))
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Direct element children with the given tag name.
fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == name)
}

/// Trimmed text content of an element.
fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed first child of the cell when it is a non-blank text node.
fn leading_text(cell: ElementRef<'_>) -> Option<String> {
    match cell.first_child()?.value() {
        Node::Text(text) => Some(text.trim())
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
