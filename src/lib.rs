//! # bookwyrm - search a library-catalog mirror network
//!
//! bookwyrm queries a Library Genesis style catalog, parses its HTML result
//! table into structured [`Item`]s and resolves each item's mirror links into
//! URIs that can be fetched directly: plain HTTP downloads, reconstructed
//! download-form requests and magnet links decoded from torrent files.
//!
//! ## Features
//!
//! - **Mirror Failover**: the result table is fetched from the first catalog
//!   host that answers
//! - **Fluent Builder Pattern**: chain search parameters and run the search
//! - **Parallel Parsing**: result rows are extracted on rayon, in row order
//! - **Mirror Resolution**: form-trigger, direct-host and torrent mirrors
//! - **Row Policy**: drop or reject rows that lack required fields
//! - **Downloads**: fetch an item from the first working mirror
//!
//! ## Quick Start
//!
//! ```rust
//! use bookwyrm::prelude::*;
//! use bookwyrm::error::Result;
//!
//! # async fn example() -> Result<()> {
//! let catalog = Catalog::new(CatalogConfig::default());
//!
//! let items = catalog
//!     .search("gödel escher bach")
//!     .limit(20)
//!     .execute()
//!     .await?
//!     .dedupe_by_title();
//!
//! for item in &items {
//!     println!("{} - {}", item.authors.join(", "), item.title);
//!     for uri in &item.mirrors {
//!         println!("    {}", uri);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`catalog`]: table fetch across mirror hosts, row policy, orchestration
//! - [`extract`] and [`column`]: one result row to one [`Item`]
//! - [`mirror`]: mirror link classification and resolution
//! - [`search`]: fluent search builder and result processing
//! - [`types`]: items, search parameters and policies
//! - [`config`]: hosts, markers and transport settings
//! - [`net`]: HTTP client, the [`Fetch`](net::Fetch) seam and HTML helpers
//! - [`torrent`] and [`units`]: torrent-to-magnet and size conversion
//! - [`download`]: saving items to disk
//! - [`error`]: error handling

pub mod catalog;
pub mod column;
pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod mirror;
pub mod net;
pub mod search;
pub mod torrent;
pub mod types;
pub mod units;

/// Prelude module for convenient imports.
///
/// ```rust
/// use bookwyrm::prelude::*;
///
/// let catalog = Catalog::new(CatalogConfig::default().with_row_policy(RowPolicy::Strict));
/// let params: SearchParams = catalog.search("dune").column(SearchColumn::Title).build();
/// ```
pub mod prelude {
    pub use crate::{
        catalog::Catalog,
        config::CatalogConfig,
        download::{download_file, download_item, sanitize_filename},
        mirror::{MirrorKind, MirrorResolver},
        net::{Fetch, HttpClient},
        search::{SearchBuilder, SearchResultExt},
        types::{Exacts, Item, RowPolicy, SearchColumn, SearchParams},
    };
}

// Re-export main types at crate root for direct access
pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use error::{Error, Result};
pub use search::{SearchBuilder, SearchResultExt};
pub use types::{Exacts, Item, RowPolicy, SearchColumn, SearchParams};
