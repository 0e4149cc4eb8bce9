//! Common test utilities and fixtures
//!
//! Shared catalog pages, mirror pages and configuration used across the test
//! modules. Mirror links point back at the mock server with the host marker
//! in the path, so the classifier treats them like the real hosts.

use std::time::Duration;

use bookwyrm::config::CatalogConfig;

#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A form-trigger host page for the file `book.pdf`.
#[allow(dead_code)]
pub const FORM_PAGE: &str = r#"<html><body>
<h2>Second Foundation</h2>
<form name="receive" method="GET" onSubmit="this.submit.disabled=true;" action="noleech1.php">
    <input name="hidden" type="hidden" value="12345">
    <input name="hidden0" type="hidden" value="book.pdf">
    <input type="submit" name="submit" value="Download">
</form>
</body></html>"#;

#[allow(dead_code)]
pub const FORM_TRIGGER_URI: &str = "http://golibgen.io/noleech1.php?hidden=12345&hidden0=book.pdf";

/// Single-file torrent for `book.pdf` with one tracker.
#[allow(dead_code)]
pub const TORRENT: &[u8] = b"d8:announce20:http://t.example/ann4:infod6:lengthi3e4:name8:book.pdf12:piece lengthi16384e6:pieces0:ee";

/// A direct host page linking `href`.
#[allow(dead_code)]
pub fn direct_page(href: &str) -> String {
    format!(
        r#"<html><body>
<div class="actionsHolder">
    <div style="float:left;">
        <a class="ddownload color2 dnthandler" href="{}"><span>Download</span></a>
    </div>
    <div style="float:left;"><a href="/share">Share</a></div>
</div>
</body></html>"#,
        href
    )
}

/// One result row whose mirrors live on the mock server at `server`.
#[allow(dead_code)]
pub fn catalog_row(server: &str, id: u32, title: &str) -> String {
    format!(
        r#"<tr valign="top" bgcolor="">
<td>{id}</td>
<td><a href="search.php?req=Asimov&amp;column=author">Asimov, Isaac</a></td>
<td width="500"><a href="search.php?req=Foundation&amp;column=series"><font face="Times" color="green"><i>Foundation</i></font></a><br><a href="book/index.php?md5=MD5{id}" title="" id="{id}">{title} <font face="Times" color="green"><i>[2nd ed.]</i></font><br><font face="Times" color="green"><i>978-0-553-29336-8, 0-553-29336-5</i></font></a></td>
<td>Spectra</td>
<td nowrap>1991</td>
<td>320</td>
<td>English</td>
<td nowrap>816kb</td>
<td nowrap>pdf</td>
<td><a href="{server}/golibgen/view.php?id={id}" title="Gen.lib.rus.ec">[1]</a></td>
<td><a href="{server}/bookzz/md5/MD5{id}" title="Bookzz.org">[2]</a></td>
<td><a href="/ads.php?md5=MD5{id}" title="Torrent">[3]</a></td>
<td><a href="http://library1.org/_ads/MD5{id}" title="Library1">[4]</a></td>
</tr>"#
    )
}

/// A row whose second mirror column holds no link.
#[allow(dead_code)]
pub fn broken_row(id: u32) -> String {
    format!(
        r#"<tr><td>{id}</td><td>Nobody</td><td><a href="book/index.php?md5=X" id="{id}">Broken Entry</a></td>
<td></td><td></td><td></td><td></td><td></td><td></td>
<td><a href="http://golibgen.io/view.php?id={id}">[1]</a></td><td>[2]</td><td>[3]</td></tr>"#
    )
}

/// A full catalog result page around `rows`, with the header row and
/// decoration the real page carries.
#[allow(dead_code)]
pub fn result_page(rows: &[String]) -> String {
    format!(
        r##"<html><head><title>Library Genesis</title></head><body>
<table width="100%"><tr><td>search form</td></tr></table>
<table width="100%" cellspacing="1" cellpadding="1" rules="rows" class="c" align="center">
<tr valign="top" bgcolor="#C0C0C0">
<td><b>ID</b></td><td><b>Author(s)</b></td><td><b>Title</b></td><td><b>Publisher</b></td>
<td><b>Year</b></td><td><b>Pages</b></td><td><b>Language</b></td><td><b>Size</b></td>
<td><b>Extension</b></td><td colspan="5"><b>Mirrors</b></td>
</tr>
{}
</table>
</body></html>"##,
        rows.join("\n")
    )
}

/// Configuration for the given mock mirrors with no delays or retries.
#[allow(dead_code)]
pub fn test_config(mirrors: &[String]) -> CatalogConfig {
    CatalogConfig::default()
        .with_mirrors(mirrors.iter().cloned())
        .with_rate_limit(0)
        .with_max_retries(0)
}
