//! HTML parsing utilities for catalog and mirror pages.
//!
//! Wraps the `scraper` crate with the handful of queries the crate needs:
//! first-match text and attribute lookups, direct cell access on table rows,
//! and parallel (rayon) processing of result rows.
//!
//! # Examples
//!
//! ```rust
//! use bookwyrm::net::html;
//!
//! let document = html::parse(r#"
//!     <form name="receive" action="noleech1.php">
//!         <input name="hidden" type="hidden" value="12345">
//!     </form>
//! "#);
//!
//! assert_eq!(html::select_attr(&document, r#"form[name="receive"]"#, "action").as_deref(), Some("noleech1.php"));
//! assert_eq!(html::select_attr(&document, r#"input[name="hidden"]"#, "value").as_deref(), Some("12345"));
//! ```

use rayon::prelude::*;
use scraper::{ElementRef, Html, Selector};

/// Parses an HTML document from a string.
pub fn parse(html: &str) -> Html {
    Html::parse_document(html)
}

/// Extracts the trimmed text of the first element matching `selector`.
///
/// Returns `None` when nothing matches or the selector is invalid.
///
/// ```rust
/// use bookwyrm::net::html;
///
/// let document = html::parse(r#"<h1 class="title"> Dune </h1>"#);
/// assert_eq!(html::select_text(&document, ".title"), Some("Dune".to_string()));
/// ```
pub fn select_text(html: &Html, selector: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        html.select(&sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    })
}

/// Extracts an attribute of the first element matching `selector`.
///
/// Returns `None` when nothing matches, the selector is invalid or the
/// element lacks the attribute.
pub fn select_attr(html: &Html, selector: &str, attr: &str) -> Option<String> {
    Selector::parse(selector).ok().and_then(|sel| {
        html.select(&sel)
            .next()
            .and_then(|el| el.value().attr(attr).map(String::from))
    })
}

/// Trimmed text content of an element.
pub fn text_of(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// The `td` cells that are direct children of a table row, in column order.
pub fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

/// Returns the outer HTML of every `tr` whose first cell holds a catalog id,
/// i.e. non-empty text made only of ASCII digits.
///
/// Header rows and decoration rows of the result page fail that test.
///
/// ```rust
/// use bookwyrm::net::html;
///
/// let document = html::parse(r#"
///     <table>
///         <tr><td>ID</td><td>Author(s)</td></tr>
///         <tr><td>1042</td><td>Herbert, F.</td></tr>
///         <tr><td></td><td>spacer</td></tr>
///     </table>
/// "#);
/// let rows = html::numeric_id_rows(&document);
/// assert_eq!(rows.len(), 1);
/// assert!(rows[0].contains("1042"));
/// ```
pub fn numeric_id_rows(html: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse("tr") else {
        return Vec::new();
    };

    html.select(&sel)
        .filter(|row| {
            cells(*row).first().is_some_and(|cell| {
                let id = text_of(*cell);
                !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
            })
        })
        .map(|row| row.html())
        .collect()
}

/// Runs `parser` over table rows in parallel using rayon.
///
/// `rows` holds the outer HTML of `tr` elements, as produced by
/// [`numeric_id_rows`]. Each row is re-parsed inside a `table` so the HTML
/// parser keeps its cells, then handed to `parser`. Output order matches
/// input order.
///
/// ```rust
/// use bookwyrm::net::html;
///
/// let rows = vec!["<tr><td>1</td><td>a</td></tr>".to_string()];
/// let widths = html::parse_rows(rows, |row| html::cells(row).len());
/// assert_eq!(widths, vec![2]);
/// ```
pub fn parse_rows<T, F>(rows: Vec<String>, parser: F) -> Vec<T>
where
    T: Send,
    F: Fn(ElementRef) -> T + Sync,
{
    let Ok(sel) = Selector::parse("tr") else {
        return Vec::new();
    };

    rows.into_par_iter()
        .filter_map(|row_html| {
            let doc = Html::parse_fragment(&format!("<table>{}</table>", row_html));
            doc.select(&sel).next().map(&parser)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_ignores_nested_elements() {
        let rows = vec![
            "<tr><td>7</td><td><a href=\"x\"><i>i</i></a></td><td>2016</td></tr>".to_string(),
        ];
        let texts = parse_rows(rows, |row| {
            cells(row).into_iter().map(text_of).collect::<Vec<_>>()
        });
        assert_eq!(texts, vec![vec!["7", "i", "2016"]]);
    }

    #[test]
    fn test_parse_rows_preserves_order() {
        let rows: Vec<String> = (1..=20)
            .map(|n| format!("<tr><td>{}</td></tr>", n))
            .collect();
        let ids = parse_rows(rows, |row| text_of(cells(row)[0]));
        let expected: Vec<String> = (1..=20).map(|n| n.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_numeric_id_rows_rejects_mixed_text() {
        let document = parse(
            "<table><tr><td>12a</td></tr><tr><td> 99 </td></tr><tr><th>1</th></tr></table>",
        );
        let rows = numeric_id_rows(&document);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("99"));
    }

    #[test]
    fn test_select_missing_returns_none() {
        let document = parse("<div></div>");
        assert_eq!(select_text(&document, ".absent"), None);
        assert_eq!(select_attr(&document, "a", "href"), None);
        assert_eq!(select_attr(&document, "[[invalid", "href"), None);
    }
}
