//! Typed structural queries over a parsed page.
//!
//! Extractors describe what they need as [`Locator`]s (a tag plus the class
//! tokens it must carry) and get back `Option`s for fields that may be
//! absent, or a page-shape [`ErrorKind`] through [`Node::require`] for the
//! anchors that must exist.

use crate::core::ErrorKind;
use scraper::{ElementRef, Html};
use std::fmt::Display;

/// Element of `tag` carrying every class token in `class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    tag: &'static str,
    class: Option<&'static str>,
}

impl Locator {
    pub const fn tag(tag: &'static str) -> Self {
        Locator { tag, class: None }
    }

    /// `class` may list several space-separated tokens; all must match.
    pub const fn class(tag: &'static str, class: &'static str) -> Self {
        Locator {
            tag,
            class: Some(class),
        }
    }

    fn matches(&self, element: &ElementRef<'_>) -> bool {
        let value = element.value();
        if !value.name().eq_ignore_ascii_case(self.tag) {
            return false;
        }
        match self.class {
            None => true,
            Some(wanted) => wanted
                .split_whitespace()
                .all(|token| value.classes().any(|c| c == token)),
        }
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.class {
            None => write!(f, "{}", self.tag),
            Some(class) => {
                let tokens: Vec<&str> = class.split_whitespace().collect();
                write!(f, "{}.{}", self.tag, tokens.join("."))
            }
        }
    }
}

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Document {
            html: Html::parse_document(text),
        }
    }

    fn root(&self) -> Node<'_> {
        Node(self.html.root_element())
    }

    pub fn find_one(&self, locator: Locator) -> Option<Node<'_>> {
        self.root().find_within(locator, true).next()
    }

    pub fn find_all(&self, locator: Locator) -> Vec<Node<'_>> {
        self.root().find_within(locator, true).collect()
    }

    pub fn require(&self, locator: Locator) -> Result<Node<'_>, ErrorKind> {
        self.find_one(locator)
            .ok_or_else(|| ErrorKind::page_shape(format!("missing {locator}")))
    }
}

/// A located element.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    fn find_within(
        self,
        locator: Locator,
        include_self: bool,
    ) -> impl Iterator<Item = Node<'a>> + 'a {
        let skip = if include_self { 0 } else { 1 };
        self.0
            .descendants()
            .skip(skip)
            .filter_map(ElementRef::wrap)
            .filter(move |el| locator.matches(el))
            .map(Node)
    }

    /// First matching descendant.
    pub fn find_one(&self, locator: Locator) -> Option<Node<'a>> {
        self.find_within(locator, false).next()
    }

    /// Every matching descendant, in document order.
    pub fn find_all(&self, locator: Locator) -> Vec<Node<'a>> {
        self.find_within(locator, false).collect()
    }

    pub fn require(&self, locator: Locator) -> Result<Node<'a>, ErrorKind> {
        self.find_one(locator)
            .ok_or_else(|| ErrorKind::page_shape(format!("missing {locator}")))
    }

    /// Concatenated text content, trimmed.
    pub fn text(&self) -> String {
        self.0.text().collect::<String>().trim().to_string()
    }

    /// Row/column grid of the first table at or below this node.
    ///
    /// A leading row made of `<th>` cells becomes the header. Rows of nested
    /// tables are not mixed into the grid.
    pub fn as_table(&self) -> Result<Table, ErrorKind> {
        const TABLE: Locator = Locator::tag("table");
        let table = if TABLE.matches(&self.0) {
            *self
        } else {
            self.require(TABLE)?
        };

        let mut header = Vec::new();
        let mut rows = Vec::new();
        for row in table.find_all(Locator::tag("tr")) {
            if row.enclosing_table().map(|t| t.id()) != Some(table.0.id()) {
                continue;
            }
            let cells: Vec<ElementRef<'_>> = row
                .0
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "td" | "th"))
                .collect();
            let texts: Vec<String> = cells.iter().map(|c| Node(*c).text()).collect();

            let is_header_row = !cells.is_empty() && cells.iter().all(|c| c.value().name() == "th");
            if is_header_row && header.is_empty() && rows.is_empty() {
                header = texts;
            } else {
                rows.push(texts);
            }
        }

        Ok(Table { header, rows })
    }

    fn enclosing_table(&self) -> Option<ElementRef<'a>> {
        self.0
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "table")
    }
}

/// Cell texts of one HTML table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Header-aware lookup of a column index.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cell of `row` under the column headed `name`.
    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        self.cell(row, self.column(name)?)
    }

    /// Data rows carrying a cell for every header column.
    pub fn complete_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        let width = self.header.len();
        self.rows.iter().filter(move |r| r.len() >= width)
    }

    /// First cell whose text satisfies `pred`.
    pub fn find_cell(&self, pred: impl Fn(&str) -> bool) -> Option<&str> {
        self.rows
            .iter()
            .flatten()
            .map(String::as_str)
            .find(|text| pred(text))
    }

    pub fn cell_required(&self, row: usize, col: usize) -> Result<&str, ErrorKind> {
        self.cell(row, col)
            .ok_or_else(|| ErrorKind::page_shape(format!("table has no cell ({row}, {col})")))
    }
}
