//! Search functionality and fluent search builder.
//!
//! This module provides a fluent search API that builds [`SearchParams`] and
//! runs them against a [`Catalog`], plus post-processing helpers for the
//! returned items.
//!
//! # Examples
//!
//! ```rust
//! use bookwyrm::prelude::*;
//! # use bookwyrm::error::Result;
//!
//! # async fn example() -> Result<()> {
//! let catalog = Catalog::new(CatalogConfig::default());
//!
//! let results = catalog
//!     .search("sicp")
//!     .limit(20)
//!     .execute()
//!     .await?
//!     .filter_ext("pdf")
//!     .dedupe_by_title()
//!     .sort_by_year();
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;

use crate::{
    catalog::Catalog,
    error::Result,
    types::{Item, RowPolicy, SearchColumn, SearchParams},
};

/// A fluent search builder that can build search parameters and execute a
/// search.
///
/// Obtained from [`Catalog::search`]. The row policy starts out as the
/// catalog's configured one.
///
/// # Examples
///
/// ```rust
/// use bookwyrm::prelude::*;
/// use bookwyrm::error::Result;
///
/// # async fn example() -> Result<()> {
/// let catalog = Catalog::new(CatalogConfig::default());
///
/// let items = catalog
///     .search("9780262510875")
///     .column(SearchColumn::Isbn)
///     .strict()
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SearchBuilder<'a> {
    catalog: &'a Catalog,
    params: SearchParams,
    policy: RowPolicy,
}

impl<'a> SearchBuilder<'a> {
    pub(crate) fn new(catalog: &'a Catalog, query: impl Into<String>, policy: RowPolicy) -> Self {
        Self {
            catalog,
            params: SearchParams {
                query: query.into(),
                ..Default::default()
            },
            policy,
        }
    }

    /// Sets the catalog field the query is matched against.
    pub fn column(mut self, column: SearchColumn) -> Self {
        self.params.column = column;
        self
    }

    /// Sets the result page to fetch (1-based).
    pub fn page(mut self, page: u32) -> Self {
        self.params.page = Some(page);
        self
    }

    /// Sets the maximum number of result rows to turn into items.
    ///
    /// Rows are cut before extraction, so with [`RowPolicy::Skip`] fewer
    /// items than `limit` may come back.
    pub fn limit(mut self, limit: usize) -> Self {
        self.params.limit = Some(limit);
        self
    }

    pub fn row_policy(mut self, policy: RowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fails the search on the first row that cannot be extracted.
    pub fn strict(self) -> Self {
        self.row_policy(RowPolicy::Strict)
    }

    /// Executes the search.
    ///
    /// # Errors
    ///
    /// * [`Error::AllMirrorsFailed`](crate::Error::AllMirrorsFailed) when no
    ///   catalog mirror answers
    /// * [`Error::Extract`](crate::Error::Extract) for a broken row under
    ///   [`RowPolicy::Strict`]
    pub async fn execute(self) -> Result<Vec<Item>> {
        self.catalog.search_with(&self.params, self.policy).await
    }

    /// Builds and returns just the search parameters without executing the
    /// search.
    pub fn build(self) -> SearchParams {
        self.params
    }
}

/// Extension trait providing post-processing methods for search results.
///
/// ```rust
/// use bookwyrm::prelude::*;
///
/// let items: Vec<Item> = Vec::new();
/// let epubs = items.filter_ext("epub").filter_lang("english").sort_by_year();
/// assert!(epubs.is_empty());
/// ```
pub trait SearchResultExt {
    /// Removes duplicate items based on title.
    ///
    /// Keeps the first occurrence of each title (case-insensitive). The
    /// catalog lists every file separately, so one book in three formats
    /// appears three times.
    fn dedupe_by_title(self) -> Self;

    /// Keeps items with the given file extension (case-insensitive).
    fn filter_ext(self, ext: &str) -> Self;

    /// Keeps items in the given language (case-insensitive).
    fn filter_lang(self, lang: &str) -> Self;

    /// Sorts by publication year, newest first; items without a year go
    /// last. The sort is stable.
    fn sort_by_year(self) -> Self;
}

impl SearchResultExt for Vec<Item> {
    fn dedupe_by_title(mut self) -> Self {
        let mut seen = HashSet::new();
        self.retain(|item| seen.insert(item.title.to_lowercase()));
        self
    }

    fn filter_ext(mut self, ext: &str) -> Self {
        self.retain(|item| {
            item.exacts
                .ext
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        });
        self
    }

    fn filter_lang(mut self, lang: &str) -> Self {
        let lang = lang.to_lowercase();
        self.retain(|item| item.exacts.lang.as_deref() == Some(lang.as_str()));
        self
    }

    fn sort_by_year(mut self) -> Self {
        self.sort_by(|a, b| b.exacts.year.cmp(&a.exacts.year));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CatalogConfig, types::Exacts};

    fn item(title: &str, year: Option<u32>, ext: &str, lang: &str) -> Item {
        Item {
            title: title.to_string(),
            authors: vec![],
            serie: None,
            publisher: None,
            isbns: None,
            mirrors: vec![],
            exacts: Exacts {
                year,
                lang: Some(lang.to_string()),
                ext: Some(ext.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_builder_collects_params() {
        let catalog = Catalog::new(CatalogConfig::default());
        let params = catalog
            .search("tao te ching")
            .column(SearchColumn::Title)
            .page(2)
            .limit(5)
            .build();

        assert_eq!(params.query, "tao te ching");
        assert_eq!(params.column, SearchColumn::Title);
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(5));
    }

    #[test]
    fn test_builder_policy_defaults_to_config() {
        let catalog = Catalog::new(CatalogConfig::default().with_row_policy(RowPolicy::Strict));
        assert_eq!(catalog.search("x").policy, RowPolicy::Strict);
        assert_eq!(
            catalog.search("x").row_policy(RowPolicy::Skip).policy,
            RowPolicy::Skip
        );
    }

    #[test]
    fn test_dedupe_by_title_keeps_first() {
        let items = vec![
            item("Dune", Some(1965), "pdf", "english"),
            item("DUNE", Some(1990), "epub", "english"),
            item("Dune Messiah", None, "pdf", "english"),
        ]
        .dedupe_by_title();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].exacts.year, Some(1965));
    }

    #[test]
    fn test_filters() {
        let items = vec![
            item("A", None, "PDF", "english"),
            item("B", None, "epub", "english"),
            item("C", None, "pdf", "german"),
        ];

        let pdfs = items.clone().filter_ext("pdf");
        assert_eq!(pdfs.len(), 2);

        let english_pdfs = items.filter_ext("pdf").filter_lang("English");
        assert_eq!(english_pdfs.len(), 1);
        assert_eq!(english_pdfs[0].title, "A");
    }

    #[test]
    fn test_sort_by_year_newest_first_unknown_last() {
        let sorted = vec![
            item("old", Some(1970), "pdf", "english"),
            item("unknown", None, "pdf", "english"),
            item("new", Some(2016), "pdf", "english"),
        ]
        .sort_by_year();

        let titles: Vec<_> = sorted.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "unknown"]);
    }
}
