//! Mirror link classification and resolution.
//!
//! Every result row carries three mirror links. None of them points at the
//! file itself:
//!
//! - the **form-trigger host** serves a page with a `receive` form whose
//!   hidden inputs identify the file; the download is a GET of the form's
//!   action with those inputs as query parameters;
//! - the **direct host** serves a page whose `actionsHolder` block links the
//!   file;
//! - the **torrent path** is a site-relative link whose query string selects
//!   the entry's `.torrent` on the catalog mirror, which we turn into a
//!   magnet link.
//!
//! [`MirrorKind::classify`] decides which of those a link is without any I/O;
//! [`MirrorResolver`] performs the follow-up fetch for each kind.
//!
//! Form-trigger and direct-host downloads need a same-origin `Referer`
//! header; [`download`](crate::download) takes care of it.

use tracing::{debug, warn};

use crate::{
    config::CatalogConfig,
    error::{Error, Result},
    net::{Fetch, html},
    torrent,
};

/// The shape of a raw mirror link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorKind {
    /// Absolute link to the host that needs its download form replayed
    FormTriggerHost,
    /// Absolute link to the host that links the file directly
    DirectHost,
    /// Site-relative link to the catalog's torrent listing
    RelativeTorrentPath,
    /// Anything else; contributes nothing
    Unrecognized,
}

impl MirrorKind {
    /// Classifies a raw mirror link using the markers in `config`.
    ///
    /// ```rust
    /// use bookwyrm::config::CatalogConfig;
    /// use bookwyrm::mirror::MirrorKind;
    ///
    /// let config = CatalogConfig::default();
    /// assert_eq!(
    ///     MirrorKind::classify("http://golibgen.io/view.php?id=1042", &config),
    ///     MirrorKind::FormTriggerHost
    /// );
    /// assert_eq!(
    ///     MirrorKind::classify("/ads.php?md5=0F3E", &config),
    ///     MirrorKind::RelativeTorrentPath
    /// );
    /// ```
    pub fn classify(url: &str, config: &CatalogConfig) -> Self {
        if url.starts_with("http") {
            if url.contains(config.form_trigger_marker.as_str()) {
                return MirrorKind::FormTriggerHost;
            }
            if url.contains(config.direct_host_marker.as_str()) {
                return MirrorKind::DirectHost;
            }
        } else if url.starts_with(config.torrent_path_prefix.as_str()) {
            return MirrorKind::RelativeTorrentPath;
        }
        MirrorKind::Unrecognized
    }
}

/// Resolves raw mirror links into directly usable URIs.
///
/// `catalog_base` is the catalog mirror (scheme and host) that served the
/// result table; site-relative torrent links are resolved against it.
pub struct MirrorResolver<'a> {
    fetcher: &'a dyn Fetch,
    config: &'a CatalogConfig,
    catalog_base: &'a str,
}

impl<'a> MirrorResolver<'a> {
    pub fn new(fetcher: &'a dyn Fetch, config: &'a CatalogConfig, catalog_base: &'a str) -> Self {
        Self {
            fetcher,
            config,
            catalog_base,
        }
    }

    /// Resolves every link in order.
    ///
    /// Each link yields at most one URI. Unrecognized links and links whose
    /// resolution fails are skipped; a failing mirror never affects the
    /// others.
    pub async fn resolve_all(&self, raw: &[String]) -> Vec<String> {
        let mut resolved = Vec::with_capacity(raw.len());

        for url in raw {
            match self.resolve(url).await {
                Ok(Some(uri)) => resolved.push(uri),
                Ok(None) => debug!(url = %url, "unrecognized mirror link skipped"),
                Err(e) => warn!(url = %url, error = %e, "mirror skipped"),
            }
        }

        resolved
    }

    /// Resolves one link. `Ok(None)` means the link is not one we know how
    /// to resolve.
    pub async fn resolve(&self, url: &str) -> Result<Option<String>> {
        match MirrorKind::classify(url, self.config) {
            MirrorKind::FormTriggerHost => {
                let page = self.fetcher.fetch_text(url).await?;
                form_trigger_url(&page, &self.config.form_trigger_host).map(Some)
            }
            MirrorKind::DirectHost => {
                let page = self.fetcher.fetch_text(url).await?;
                direct_link(&page).map(Some)
            }
            MirrorKind::RelativeTorrentPath => {
                let torrent_url = torrent_info_url(self.catalog_base, url)?;
                let body = self.fetcher.fetch(&torrent_url).await?;
                torrent::magnet_from_torrent(&body).map(Some)
            }
            MirrorKind::Unrecognized => Ok(None),
        }
    }
}

/// Rebuilds the download request hidden in the form-trigger host's page.
///
/// The page holds
///
/// ```html
/// <form name="receive" method="GET" action="noleech1.php">
///     <input name="hidden" type="hidden" value="12345">
///     <input name="hidden0" type="hidden" value="book.pdf">
/// </form>
/// ```
///
/// and the download is `http://<host>/noleech1.php?hidden=12345&hidden0=book.pdf`.
/// The action is read from the page each time since its name is not stable.
pub fn form_trigger_url(page: &str, host: &str) -> Result<String> {
    let document = html::parse(page);

    let action = html::select_attr(&document, r#"form[name="receive"]"#, "action")
        .ok_or_else(|| Error::parse("no 'receive' form with an action"))?;
    let uid = html::select_attr(&document, r#"input[name="hidden"]"#, "value")
        .ok_or_else(|| Error::parse("no 'hidden' input in download form"))?;
    let filename = html::select_attr(&document, r#"input[name="hidden0"]"#, "value")
        .ok_or_else(|| Error::parse("no 'hidden0' input in download form"))?;

    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("hidden", &uid)
        .append_pair("hidden0", &filename)
        .finish();

    Ok(format!(
        "http://{}/{}?{}",
        host,
        action.trim().trim_start_matches('/'),
        query
    ))
}

/// Reads the file link out of the direct host's `actionsHolder` block.
///
/// ```html
/// <div class="actionsHolder">
///     <div style="float:left;">
///         <a class="ddownload color2 dnthandler" href="http://bookzz.org/dl/1014779/9a9ab2"></a>
///     </div>
/// </div>
/// ```
pub fn direct_link(page: &str) -> Result<String> {
    let document = html::parse(page);
    html::select_attr(&document, ".actionsHolder > div a", "href")
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .ok_or_else(|| Error::parse("no download link in 'actionsHolder'"))
}

/// The torrent request for a site-relative torrent-listing link.
///
/// The link's query string (the entry's MD5) is passed through verbatim.
///
/// ```rust
/// use bookwyrm::mirror::torrent_info_url;
///
/// assert_eq!(
///     torrent_info_url("http://libgen.io", "/ads.php?md5=0F3E").unwrap(),
///     "http://libgen.io/book/index.php?md5=0F3E&oftorrent="
/// );
/// ```
pub fn torrent_info_url(catalog_base: &str, path: &str) -> Result<String> {
    let query = path
        .split_once('?')
        .map(|(_, query)| query.split('#').next().unwrap_or(query))
        .filter(|query| !query.is_empty())
        .ok_or_else(|| Error::parse(format!("torrent link '{}' has no query", path)))?;

    Ok(format!(
        "{}/book/index.php?{}&oftorrent=",
        catalog_base.trim_end_matches('/'),
        query
    ))
}
