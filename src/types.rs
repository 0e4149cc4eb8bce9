//! Core data types for catalog records and search parameters.
//!
//! - [`Item`] - One normalized catalog entry built from a result-table row
//! - [`Exacts`] - The structured attributes of an item (year, language, ...)
//! - [`SearchParams`] - Parameters for querying the catalog
//! - [`SearchColumn`] - Which catalog field the query is matched against
//! - [`RowPolicy`] - What happens to rows that fail extraction
//!
//! # Examples
//!
//! ```rust
//! use bookwyrm::types::*;
//!
//! let item = Item {
//!     title: "The C Programming Language".to_string(),
//!     authors: vec!["Kernighan, B.".to_string(), "Ritchie, D.".to_string()],
//!     serie: None,
//!     publisher: Some("Prentice Hall".to_string()),
//!     isbns: Some(vec!["0131103628".to_string()]),
//!     mirrors: vec![],
//!     exacts: Exacts {
//!         year: Some(1988),
//!         lang: Some("english".to_string()),
//!         edition: Some(2),
//!         ext: Some("pdf".to_string()),
//!         ..Default::default()
//!     },
//! };
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// One normalized catalog entry.
///
/// Built once per result-table row by the [`extract`](crate::extract) module
/// and never mutated afterwards, except for `mirrors`, which is replaced by
/// the resolved URIs once [`MirrorResolver`](crate::mirror::MirrorResolver)
/// has run.
///
/// Optional fields are `None` when the row has no usable value; they never
/// hold empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Main title
    pub title: String,

    /// Authors in row order, empty when the column is blank
    #[serde(default)]
    pub authors: Vec<String>,

    /// Series name
    pub serie: Option<String>,

    /// Publisher
    pub publisher: Option<String>,

    /// ISBN numbers, `None` when the row carries no ISBN markup
    pub isbns: Option<Vec<String>>,

    /// Mirror links: raw site links after extraction, directly fetchable
    /// URIs (HTTP URLs or magnet links) after resolution
    #[serde(default)]
    pub mirrors: Vec<String>,

    /// Structured attributes
    #[serde(default)]
    pub exacts: Exacts,
}

/// The precise, structured subset of an item's attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exacts {
    pub year: Option<u32>,
    /// Lower-cased language name
    pub lang: Option<String>,
    pub edition: Option<u32>,
    /// File extension, e.g. `pdf` or `epub`
    pub ext: Option<String>,
    pub pages: Option<u32>,
    /// File size in bytes
    pub size: Option<u64>,
}

/// The catalog field a search query is matched against.
///
/// Maps onto the `column` parameter of the catalog's `search.php`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchColumn {
    /// Title, author, series, publisher, year, ISBN, language and MD5 at once
    #[default]
    Default,
    Title,
    Author,
    Series,
    Publisher,
    Year,
    Isbn,
    Language,
    Md5,
    Tags,
    Extension,
}

impl SearchColumn {
    /// The value the catalog expects in the `column` query parameter.
    ///
    /// ```rust
    /// use bookwyrm::types::SearchColumn;
    ///
    /// assert_eq!(SearchColumn::Isbn.as_query_value(), "identifier");
    /// assert_eq!(SearchColumn::Default.as_query_value(), "def");
    /// ```
    pub fn as_query_value(&self) -> &'static str {
        match self {
            SearchColumn::Default => "def",
            SearchColumn::Title => "title",
            SearchColumn::Author => "author",
            SearchColumn::Series => "series",
            SearchColumn::Publisher => "publisher",
            SearchColumn::Year => "year",
            SearchColumn::Isbn => "identifier",
            SearchColumn::Language => "language",
            SearchColumn::Md5 => "md5",
            SearchColumn::Tags => "tags",
            SearchColumn::Extension => "extension",
        }
    }
}

impl std::str::FromStr for SearchColumn {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "def" | "default" => Ok(SearchColumn::Default),
            "title" => Ok(SearchColumn::Title),
            "author" => Ok(SearchColumn::Author),
            "series" | "serie" => Ok(SearchColumn::Series),
            "publisher" => Ok(SearchColumn::Publisher),
            "year" => Ok(SearchColumn::Year),
            "isbn" | "identifier" => Ok(SearchColumn::Isbn),
            "language" | "lang" => Ok(SearchColumn::Language),
            "md5" => Ok(SearchColumn::Md5),
            "tags" => Ok(SearchColumn::Tags),
            "extension" | "ext" => Ok(SearchColumn::Extension),
            other => Err(crate::Error::parse(format!("unknown search column '{}'", other))),
        }
    }
}

/// What a search does with a row whose required fields cannot be extracted.
///
/// A row fails extraction when its title fragment is missing or one of its
/// three mirror columns has no link. Mirror URLs are never fabricated for
/// such rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Drop the row, log a warning and keep going.
    #[default]
    Skip,
    /// Fail the whole search with the row's [`Error::Extract`](crate::Error::Extract).
    Strict,
}

/// Search parameters for querying the catalog.
///
/// ```rust
/// use bookwyrm::types::{SearchColumn, SearchParamsBuilder};
///
/// let params = SearchParamsBuilder::default()
///     .query("structure and interpretation".to_string())
///     .column(SearchColumn::Title)
///     .limit(Some(10))
///     .build()
///     .unwrap();
/// ```
///
/// * `query` - The search term (`req` parameter)
/// * `column` - The field to match against
/// * `page` - Result page of the catalog, 1-based
/// * `limit` - Maximum number of rows to turn into items
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into))]
pub struct SearchParams {
    pub query: String,
    #[builder(default)]
    pub column: SearchColumn,
    #[builder(default)]
    pub page: Option<u32>,
    #[builder(default)]
    pub limit: Option<usize>,
}

impl SearchParams {
    /// Query string pairs for the catalog's `search.php`, in a fixed order.
    ///
    /// ```rust
    /// use bookwyrm::types::SearchParams;
    ///
    /// let params: SearchParams = "dune".into();
    /// assert_eq!(
    ///     params.query_pairs(),
    ///     vec![("req", "dune".to_string()), ("column", "def".to_string())]
    /// );
    /// ```
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("req", self.query.clone()),
            ("column", self.column.as_query_value().to_string()),
        ];
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

impl From<String> for SearchParams {
    fn from(query: String) -> Self {
        SearchParams {
            query,
            ..Default::default()
        }
    }
}

impl From<&str> for SearchParams {
    fn from(query: &str) -> Self {
        SearchParams {
            query: query.to_string(),
            ..Default::default()
        }
    }
}
