//! The catalog: table fetch with mirror failover, row extraction and mirror
//! resolution.
//!
//! A search runs in three stages:
//!
//! 1. [`Catalog::fetch_rows`] asks each configured mirror host for
//!    `search.php` in turn and keeps the result rows of the first one that
//!    answers with success.
//! 2. [`extract_rows`] turns the rows into [`Item`]s in parallel, applying the
//!    [`RowPolicy`] to rows that fail extraction.
//! 3. [`Catalog::resolve`] replaces each item's raw mirror links with
//!    directly usable URIs.
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
//! let items = catalog
//!     .search("the art of computer programming")
//!     .column(SearchColumn::Title)
//!     .limit(10)
//!     .execute()
//!     .await?;
//!
//! for item in &items {
//!     println!("{} ({:?}): {} mirrors", item.title, item.exacts.year, item.mirrors.len());
//! }
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info, warn};

use crate::{
    config::CatalogConfig,
    error::{Error, Result},
    extract::extract_row,
    mirror::MirrorResolver,
    net::{Fetch, html},
    search::SearchBuilder,
    types::{Item, RowPolicy, SearchParams},
};

/// Entry point for searching the catalog.
///
/// Owns the configuration and the outbound fetcher. [`Catalog::new`] uses
/// the [`HttpClient`](crate::net::HttpClient) described by the
/// configuration; [`Catalog::with_fetcher`] plugs in any other [`Fetch`]
/// implementation.
pub struct Catalog {
    config: CatalogConfig,
    fetcher: Box<dyn Fetch>,
}

impl Catalog {
    pub fn new(config: CatalogConfig) -> Self {
        let client = config.http_client();
        Self::with_fetcher(config, client)
    }

    pub fn with_fetcher(config: CatalogConfig, fetcher: impl Fetch + 'static) -> Self {
        Self {
            config,
            fetcher: Box::new(fetcher),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Starts a fluent search.
    ///
    /// ```rust
    /// use bookwyrm::prelude::*;
    ///
    /// let catalog = Catalog::new(CatalogConfig::default());
    /// let params = catalog.search("dune").page(2).limit(25).build();
    ///
    /// assert_eq!(params.page, Some(2));
    /// assert_eq!(params.limit, Some(25));
    /// ```
    pub fn search(&self, query: impl Into<String>) -> SearchBuilder<'_> {
        SearchBuilder::new(self, query, self.config.row_policy)
    }

    /// Runs a complete search: table fetch, extraction and resolution.
    pub async fn search_with(&self, params: &SearchParams, policy: RowPolicy) -> Result<Vec<Item>> {
        let (base, mut rows) = self.fetch_rows(params).await?;

        if let Some(limit) = params.limit {
            rows.truncate(limit);
        }

        let items = extract_rows(rows, policy)?;
        info!(mirror = %base, items = items.len(), "extracted result rows");

        Ok(self.resolve(&base, items).await)
    }

    /// Fetches the result table, trying each mirror host in order.
    ///
    /// Returns the base URL of the host that answered together with the
    /// outer HTML of its result rows (rows whose first cell is a numeric
    /// catalog id), in document order. A success status ends the failover
    /// even when the page holds no rows.
    ///
    /// # Errors
    ///
    /// [`Error::AllMirrorsFailed`] with one entry per attempted host when no
    /// host answers with success.
    pub async fn fetch_rows(&self, params: &SearchParams) -> Result<(String, Vec<String>)> {
        let mut attempts = Vec::with_capacity(self.config.mirrors.len());

        for base in &self.config.mirrors {
            let outcome = match search_url(base, params) {
                Ok(url) => {
                    debug!(%url, "fetching result table");
                    self.fetcher.fetch_text(&url).await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(page) => {
                    let rows = table_rows(&page);
                    debug!(mirror = %base, rows = rows.len(), "result table fetched");
                    return Ok((base.clone(), rows));
                }
                Err(e) => {
                    warn!(mirror = %base, error = %e, "catalog mirror failed");
                    attempts.push(format!("{}: {}", base, e));
                }
            }
        }

        Err(Error::AllMirrorsFailed(attempts))
    }

    /// Replaces each item's raw mirror links with resolved URIs.
    ///
    /// `base` is the catalog mirror that served the rows. Items are resolved
    /// one after another.
    pub async fn resolve(&self, base: &str, mut items: Vec<Item>) -> Vec<Item> {
        let resolver = self.resolver(base);
        for item in &mut items {
            item.mirrors = resolver.resolve_all(&item.mirrors).await;
        }
        items
    }

    /// A mirror resolver sharing this catalog's fetcher and configuration.
    pub fn resolver<'a>(&'a self, base: &'a str) -> MirrorResolver<'a> {
        MirrorResolver::new(self.fetcher.as_ref(), &self.config, base)
    }
}

/// Builds `<base>/search.php?req=..&column=..[&page=..]`.
///
/// ```rust
/// use bookwyrm::catalog::search_url;
/// use bookwyrm::types::SearchParams;
///
/// let url = search_url("http://libgen.io", &SearchParams::from("dune messiah")).unwrap();
/// assert_eq!(url, "http://libgen.io/search.php?req=dune+messiah&column=def");
/// ```
pub fn search_url(base: &str, params: &SearchParams) -> Result<String> {
    let mut url = url::Url::parse(&format!("{}/search.php", base.trim_end_matches('/')))
        .map_err(|e| Error::parse(format!("invalid mirror base '{}': {}", base, e)))?;
    url.query_pairs_mut().extend_pairs(params.query_pairs());
    Ok(url.into())
}

/// Result rows of a catalog page.
fn table_rows(page: &str) -> Vec<String> {
    html::numeric_id_rows(&html::parse(page))
}

/// Extracts items from result rows in parallel, keeping row order.
///
/// With [`RowPolicy::Skip`] a failing row is logged and left out; with
/// [`RowPolicy::Strict`] the first failing row (in row order) is returned as
/// the error.
pub fn extract_rows(rows: Vec<String>, policy: RowPolicy) -> Result<Vec<Item>> {
    let extracted = html::parse_rows(rows, extract_row);
    let mut items = Vec::with_capacity(extracted.len());

    for result in extracted {
        match (result, policy) {
            (Ok(item), _) => items.push(item),
            (Err(e), RowPolicy::Skip) => warn!(error = %e, "row skipped"),
            (Err(e), RowPolicy::Strict) => return Err(e),
        }
    }

    Ok(items)
}
