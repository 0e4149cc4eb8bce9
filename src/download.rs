//! Downloading resolved items to disk.
//!
//! An item's resolved URIs are tried in order and the first one that answers
//! with success wins. Magnet links are left to a torrent client and skipped
//! here. Mirrors refuse downloads that do not look like they come from their
//! own pages, so every request carries a `Referer` of the file's origin.
//!
//! Files are named `"<authors> - <title> (<year>).<ext>"`. When that name is
//! taken, `.1`, `.2`, ... is inserted before the extension until it is not.

use crate::{
    error::{Error, Result},
    net::{HttpClient, origin_of},
    types::Item,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Longest file name stem we produce, in characters.
const MAX_STEM_CHARS: usize = 200;

/// Downloads a single file from a URL to a local path, sending a same-origin
/// `Referer`.
///
/// Returns the number of bytes written. Parent directories are created as
/// needed; nothing is written when the request fails.
///
/// ```rust,no_run
/// use bookwyrm::download::download_file;
/// use bookwyrm::net::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> bookwyrm::Result<()> {
/// let client = HttpClient::new("libgen");
/// let bytes = download_file(
///     &client,
///     "http://bookzz.org/dl/1014779/9a9ab2",
///     Path::new("./Herbert, Frank - Dune (1990).epub"),
/// ).await?;
/// println!("Downloaded {} bytes", bytes);
/// # Ok(())
/// # }
/// ```
pub async fn download_file(client: &HttpClient, url: &str, output_path: &Path) -> Result<u64> {
    let bytes = match origin_of(url) {
        Some(referer) => client.get_with_referer(url, &referer).await?,
        None => client.get(url).await?,
    };

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(output_path).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;

    Ok(bytes.len() as u64)
}

/// Downloads `item` into `dir` from the first of its URIs that works.
///
/// Returns the path of the written file.
///
/// # Errors
///
/// [`Error::NotFound`] when the item has no HTTP URI or none of them
/// succeeds; the individual failures are logged.
pub async fn download_item(client: &HttpClient, item: &Item, dir: &Path) -> Result<PathBuf> {
    let mut candidates = item.mirrors.iter().filter(|uri| is_http(uri)).peekable();

    let Some(first) = candidates.peek() else {
        return Err(Error::not_found(format!(
            "no HTTP mirror for '{}'",
            item.title
        )));
    };

    let ext = item
        .exacts
        .ext
        .clone()
        .or_else(|| extract_extension(first));
    let path = unique_path(dir, &item_file_stem(item), ext.as_deref()).await?;

    for uri in candidates {
        debug!(%uri, path = %path.display(), "downloading");
        match download_file(client, uri, &path).await {
            Ok(bytes) => {
                info!(title = %item.title, bytes, path = %path.display(), "downloaded");
                return Ok(path);
            }
            Err(e) => warn!(%uri, error = %e, "mirror download failed"),
        }
    }

    Err(Error::not_found(format!(
        "no working mirror for '{}'",
        item.title
    )))
}

/// File name stem for an item: `"<authors> - <title> (<year>)"`, sanitized.
///
/// The author part and the year are left out when unknown.
///
/// ```rust
/// use bookwyrm::download::item_file_stem;
/// use bookwyrm::types::{Exacts, Item};
///
/// let item = Item {
///     title: "Dune".to_string(),
///     authors: vec!["Herbert, Frank".to_string()],
///     serie: None,
///     publisher: None,
///     isbns: None,
///     mirrors: vec![],
///     exacts: Exacts { year: Some(1990), ..Default::default() },
/// };
/// assert_eq!(item_file_stem(&item), "Herbert, Frank - Dune (1990)");
/// ```
pub fn item_file_stem(item: &Item) -> String {
    let mut stem = String::new();
    if !item.authors.is_empty() {
        stem.push_str(&item.authors.join(", "));
        stem.push_str(" - ");
    }
    stem.push_str(&item.title);
    if let Some(year) = item.exacts.year {
        stem.push_str(&format!(" ({})", year));
    }
    sanitize_filename(&stem)
}

/// First free path of the chain `stem.ext`, `stem.1.ext`, `stem.2.ext`, ...
/// inside `dir`.
pub async fn unique_path(dir: &Path, stem: &str, ext: Option<&str>) -> Result<PathBuf> {
    let name = |suffix: Option<u32>| {
        let mut name = stem.to_string();
        if let Some(n) = suffix {
            name.push_str(&format!(".{}", n));
        }
        if let Some(ext) = ext {
            name.push('.');
            name.push_str(ext);
        }
        dir.join(name)
    };

    let mut candidate = name(None);
    let mut n = 0;
    while fs::try_exists(&candidate).await? {
        n += 1;
        candidate = name(Some(n));
    }

    Ok(candidate)
}

/// Sanitizes a filename by replacing characters that are not allowed in
/// filenames on most operating systems.
///
/// ```rust
/// use bookwyrm::download::sanitize_filename;
///
/// let clean = sanitize_filename("C++: The Complete Reference?");
/// assert_eq!(clean, "C++_ The Complete Reference_");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if invalid_chars.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .take(MAX_STEM_CHARS)
        .collect();
    let sanitized = sanitized.trim_end();

    if sanitized.is_empty() {
        "untitled".to_string()
    } else {
        sanitized.to_string()
    }
}

/// Extracts the file extension from a URL, ignoring query parameters and
/// fragments.
///
/// ```rust
/// use bookwyrm::download::extract_extension;
///
/// assert_eq!(extract_extension("http://bookzz.org/dl/book.EPUB?x=1"), Some("epub".to_string()));
/// assert_eq!(extract_extension("http://golibgen.io/noleech1.php?hidden0=book.pdf"), Some("php".to_string()));
/// assert_eq!(extract_extension("http://bookzz.org/dl/1014779/9a9ab2"), None);
/// ```
pub fn extract_extension(url: &str) -> Option<String> {
    let clean_url = url.split(['?', '#']).next()?;
    let path = clean_url.rsplit('/').next()?;

    let (_, ext) = path.rsplit_once('.')?;
    (!ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_lowercase())
}

fn is_http(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}
