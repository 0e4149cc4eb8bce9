//! Column layout of the catalog's result table and the parser for its
//! shared title column.
//!
//! The result table has one row per catalog entry. Most fields own a cell,
//! but the series link, the title link, the edition and the ISBN list all
//! live in the third cell and can only be told apart by their markup:
//!
//! ```html
//! <td width="500">
//!   <a href="search.php?req=Foundation&column=series"><font><i>Foundation</i></font></a><br>
//!   <a href="book/index.php?md5=..." id="1042">Second Foundation
//!     <font color="green"><i>[2nd ed.]</i></font>
//!     <br><font color="green"><i>978-0-553-29336-8, 0-553-29336-5</i></font>
//!   </a>
//! </td>
//! ```
//!
//! [`fragments`] walks that cell once and tags every relevant element as a
//! [`ColumnFragment`]; [`TitleColumn`] folds the fragments into fields.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

/// Semantic fields of a result row and the cell each one is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Authors,
    Title,
    Serie,
    Isbns,
    Edition,
    Publisher,
    Year,
    Pages,
    Lang,
    Size,
    Ext,
}

impl Column {
    /// Zero-based cell index of this field.
    pub const fn index(self) -> usize {
        match self {
            Column::Id => 0,
            Column::Authors => 1,
            Column::Title | Column::Serie | Column::Isbns | Column::Edition => 2,
            Column::Publisher => 3,
            Column::Year => 4,
            Column::Pages => 5,
            Column::Lang => 6,
            Column::Size => 7,
            Column::Ext => 8,
        }
    }
}

/// Cells holding the three mirror links, in resolution order.
pub const MIRROR_COLUMNS: [usize; 3] = [9, 10, 11];

/// Markup that leaks ISBN and edition text into the title when left in.
const TITLE_NOISE: [&str; 2] = ["br", "font"];

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit pattern"));

/// One tagged sub-fragment of the shared title column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFragment {
    /// The title element, recognised by its numeric `id` attribute.
    Title(String),
    /// The series name, taken from the `req` parameter of the column's
    /// first link.
    Series(String),
    /// The italic fragment following a line break inside the title element.
    Isbns(Vec<String>),
    /// A bracketed italic fragment such as `[7th Revised Edition]`; `None`
    /// when the brackets hold no usable number.
    Edition(Option<u32>),
    /// A link or italic fragment carrying none of the above.
    Unknown,
}

/// Tags the links and italic fragments of the shared column, in document
/// order.
///
/// The title is the first element with a numeric `id`, whatever its tag.
/// Only the column's first link may be a series link. An italic fragment
/// whose text starts with `[` is an edition wherever it sits; otherwise the
/// first italic fragment after a `br` nested in the title element holds the
/// ISBNs. A `br` outside the title element, such as the one after the
/// series link, never starts the ISBN line.
pub fn fragments(cell: ElementRef) -> Vec<ColumnFragment> {
    let mut tagged = Vec::new();
    let mut seen_link = false;
    let mut title_element: Option<ElementRef> = None;
    let mut after_break = false;

    for element in cell.descendants().filter_map(ElementRef::wrap) {
        let name = element.value().name();
        let first_link = name == "a" && !seen_link;
        if name == "a" {
            seen_link = true;
        }

        if title_element.is_none() && has_numeric_id(element) {
            title_element = Some(element);
            tagged.push(
                title_text(element)
                    .map(ColumnFragment::Title)
                    .unwrap_or(ColumnFragment::Unknown),
            );
            continue;
        }

        match name {
            "a" => {
                if first_link {
                    tagged.push(
                        element
                            .value()
                            .attr("href")
                            .and_then(|href| query_param(href, "req"))
                            .map(ColumnFragment::Series)
                            .unwrap_or(ColumnFragment::Unknown),
                    );
                } else {
                    tagged.push(ColumnFragment::Unknown);
                }
            }
            "br" => {
                if title_element.is_some_and(|title| within(element, title)) {
                    after_break = true;
                }
            }
            "i" => {
                let text = element.text().collect::<String>();
                let text = text.trim();

                if text.starts_with('[') {
                    tagged.push(ColumnFragment::Edition(first_number(text)));
                } else if after_break && title_element.is_some_and(|title| within(element, title)) {
                    after_break = false;
                    tagged.push(
                        split_isbns(text)
                            .map(ColumnFragment::Isbns)
                            .unwrap_or(ColumnFragment::Unknown),
                    );
                } else {
                    tagged.push(ColumnFragment::Unknown);
                }
            }
            _ => {}
        }
    }

    tagged
}

/// Fields recovered from the shared title column.
///
/// `title` is the text of the title element without its `br`/`font`
/// children. Runs of whitespace inside it, including the line breaks of the
/// page source, collapse to a single space, so `"Second\n  Foundation"`
/// reads `"Second Foundation"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleColumn {
    pub title: Option<String>,
    pub serie: Option<String>,
    pub isbns: Option<Vec<String>>,
    pub edition: Option<u32>,
}

impl TitleColumn {
    /// Parses the shared column cell.
    pub fn parse(cell: ElementRef) -> Self {
        Self::from_fragments(fragments(cell))
    }

    /// Keeps the first fragment of each kind.
    ///
    /// The first edition fragment decides the edition: when its brackets hold
    /// no number, the edition is absent even if a later fragment has one.
    pub fn from_fragments(fragments: Vec<ColumnFragment>) -> Self {
        let mut column = TitleColumn::default();
        let mut edition_seen = false;

        for fragment in fragments {
            match fragment {
                ColumnFragment::Title(title) if column.title.is_none() => {
                    column.title = Some(title)
                }
                ColumnFragment::Series(serie) if column.serie.is_none() => {
                    column.serie = Some(serie)
                }
                ColumnFragment::Isbns(isbns) if column.isbns.is_none() => {
                    column.isbns = Some(isbns)
                }
                ColumnFragment::Edition(edition) if !edition_seen => {
                    edition_seen = true;
                    column.edition = edition;
                }
                _ => {}
            }
        }

        column
    }
}

/// Whether `element` sits inside `ancestor`.
fn within(element: ElementRef, ancestor: ElementRef) -> bool {
    element.ancestors().any(|node| node.id() == ancestor.id())
}

fn has_numeric_id(element: ElementRef) -> bool {
    element
        .value()
        .attr("id")
        .is_some_and(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
}

/// Text of the title element without its `br`/`font` subtrees, with
/// whitespace runs collapsed.
fn title_text(element: ElementRef) -> Option<String> {
    let mut text = String::new();
    collect_text(element, &mut text);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !TITLE_NOISE.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}

/// Value of query parameter `key` in a possibly site-relative link.
pub(crate) fn query_param(href: &str, key: &str) -> Option<String> {
    let base = url::Url::parse("http://localhost/").ok()?;
    let url = base.join(href).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses the first run of digits in `text`.
///
/// ```rust
/// use bookwyrm::column::first_number;
///
/// assert_eq!(first_number("[7th Revised Edition]"), Some(7));
/// assert_eq!(first_number("[6ed.]"), Some(6));
/// assert_eq!(first_number("[Revised]"), None);
/// ```
pub fn first_number(text: &str) -> Option<u32> {
    DIGITS.find(text)?.as_str().parse().ok()
}

fn split_isbns(text: &str) -> Option<Vec<String>> {
    let isbns: Vec<String> = text
        .split(", ")
        .map(str::trim)
        .filter(|isbn| !isbn.is_empty())
        .map(String::from)
        .collect();
    (!isbns.is_empty()).then_some(isbns)
}
