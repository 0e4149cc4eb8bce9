//! Error types and result handling for bookwyrm operations.
//!
//! Every fallible operation in the crate returns a [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.
//!
//! # Error Categories
//!
//! - **Network Errors**: connection issues, timeouts, transport failures
//! - **HTTP Status Errors**: a host answered, but not with success
//! - **Extraction Errors**: a result row lacks a field the record cannot do without
//! - **Mirror Errors**: every catalog mirror host failed the table fetch
//! - **Torrent Errors**: a mirror served a body that is not a valid torrent
//! - **IO / JSON Errors**: file system and configuration loading
//!
//! Missing optional metadata (no ISBN, no edition, an unparsable year) is never
//! an error; those fields are simply `None` on the [`Item`](crate::Item).
//!
//! # Examples
//!
//! ```rust
//! use bookwyrm::prelude::*;
//! use bookwyrm::error::{Error, Result};
//!
//! # async fn example() -> Result<()> {
//! let catalog = Catalog::new(CatalogConfig::default());
//!
//! match catalog.search("dune").limit(5).execute().await {
//!     Ok(items) => println!("Found {} items", items.len()),
//!     Err(Error::AllMirrorsFailed(attempts)) => println!("No mirror answered: {:?}", attempts),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Type alias for Results with bookwyrm errors.
///
/// ```rust
/// use bookwyrm::{Result, Error};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::parse("Something went wrong"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all bookwyrm operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport errors from the underlying HTTP client (reqwest), such as
    /// connection timeouts, DNS failures and TLS errors.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Data that could not be parsed as expected, such as malformed markup
    /// on a mirror page or a response body that is not valid UTF-8.
    ///
    /// ```rust
    /// use bookwyrm::Error;
    ///
    /// let error = Error::parse("form 'receive' has no action");
    /// ```
    #[error("Parse error: {0}")]
    Parse(String),

    /// Host-specific errors, most often a non-success HTTP status.
    ///
    /// * `src` - The host or client that produced the error
    /// * `message` - What went wrong
    #[error("Source error [{src}]: {message}")]
    Source { src: String, message: String },

    /// A requested resource could not be found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The host throttled our requests. `retry_after` carries the
    /// `Retry-After` header in seconds when the host sent one.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimit { retry_after: Option<u64> },

    /// A result row is missing a field that cannot be absent: the title
    /// fragment or one of the mirror links.
    ///
    /// Whether this fails the whole search or only drops the row is decided
    /// by [`RowPolicy`](crate::types::RowPolicy).
    ///
    /// ```rust
    /// use bookwyrm::Error;
    ///
    /// let error = Error::extract("1042", "mirror column 10 has no link");
    /// assert!(error.to_string().contains("1042"));
    /// ```
    #[error("Extraction error [row {row}]: {message}")]
    Extract { row: String, message: String },

    /// Every configured catalog mirror failed the table fetch. Holds one
    /// entry per attempted host, in attempt order.
    #[error("All mirrors failed: {}", .0.join(", "))]
    AllMirrorsFailed(Vec<String>),

    /// A torrent body could not be decoded.
    #[error("Torrent error: {0}")]
    Torrent(String),

    /// File system and IO errors (configuration files, downloads).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors from configuration loading or item serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors that fit no other category.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a host-specific error with the host id and a message.
    ///
    /// ```rust
    /// use bookwyrm::Error;
    ///
    /// let error = Error::source("libgen", "HTTP 503 Service Unavailable");
    /// ```
    pub fn source(src: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Source {
            src: src.into(),
            message: msg.into(),
        }
    }

    /// Creates a not found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a rate limit error with optional retry-after time.
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Error::RateLimit { retry_after }
    }

    /// Creates a row extraction error for the row with catalog id `row`.
    pub fn extract(row: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Extract {
            row: row.into(),
            message: msg.into(),
        }
    }

    /// Creates a torrent decoding error.
    pub fn torrent(msg: impl Into<String>) -> Self {
        Error::Torrent(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_mirrors_failed_lists_attempts() {
        let error = Error::AllMirrorsFailed(vec![
            "libgen.io: HTTP 503".to_string(),
            "gen.lib.rus.ec: HTTP 404".to_string(),
        ]);
        let message = error.to_string();

        assert!(message.starts_with("All mirrors failed"));
        assert!(message.contains("libgen.io: HTTP 503"));
        assert!(message.contains("gen.lib.rus.ec: HTTP 404"));
    }

    #[test]
    fn test_extract_error_display() {
        let error = Error::extract("77", "row has no title fragment");
        assert_eq!(
            error.to_string(),
            "Extraction error [row 77]: row has no title fragment"
        );
    }
}
