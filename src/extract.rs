//! Row extraction: one result-table row in, one [`Item`] out.
//!
//! Cells are addressed by position (see [`Column`]). Every optional field
//! degrades to `None` when its cell is blank or malformed; only the title
//! fragment and the three mirror links are required, and their absence is an
//! [`Error::Extract`] for the row.
//!
//! ```rust
//! use bookwyrm::{extract::extract_row, net::html};
//!
//! let row = r#"<tr>
//!     <td>1042</td>
//!     <td><a href="search.php?req=Herbert">Herbert, Frank</a></td>
//!     <td><a href="book/index.php?md5=AB12" id="1042">Dune</a></td>
//!     <td>Ace</td><td>1990</td><td>535</td><td>English</td><td>816kb</td><td>epub</td>
//!     <td><a href="http://golibgen.io/view.php?id=1042">[1]</a></td>
//!     <td><a href="http://bookzz.org/md5/AB12">[2]</a></td>
//!     <td><a href="/ads.php?md5=AB12">[3]</a></td>
//! </tr>"#;
//!
//! let item = html::parse_rows(vec![row.to_string()], extract_row).remove(0).unwrap();
//! assert_eq!(item.title, "Dune");
//! assert_eq!(item.authors, vec!["Herbert", "Frank"]);
//! assert_eq!(item.exacts.lang.as_deref(), Some("english"));
//! assert_eq!(item.exacts.size, Some(102_000));
//! assert_eq!(item.mirrors.len(), 3);
//! ```

use scraper::{ElementRef, Selector};

use crate::{
    column::{Column, MIRROR_COLUMNS, TitleColumn},
    error::{Error, Result},
    net::html,
    types::{Exacts, Item},
    units,
};

/// Builds an [`Item`] from a result-table row.
///
/// `mirrors` holds the raw links of the three mirror columns in column
/// order; they are resolved separately.
pub fn extract_row(row: ElementRef) -> Result<Item> {
    let cells = html::cells(row);
    let text = |column: Column| cells.get(column.index()).map(|cell| html::text_of(*cell));
    let id = text(Column::Id).unwrap_or_default();

    let shared = cells
        .get(Column::Title.index())
        .map(|cell| TitleColumn::parse(*cell))
        .unwrap_or_default();
    let title = shared
        .title
        .ok_or_else(|| Error::extract(id.as_str(), "row has no title fragment"))?;

    let mirrors = MIRROR_COLUMNS
        .iter()
        .map(|&index| {
            cells
                .get(index)
                .and_then(|cell| first_link(*cell))
                .ok_or_else(|| {
                    Error::extract(id.as_str(), format!("mirror column {} has no link", index))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Item {
        title,
        authors: text(Column::Authors)
            .map(|authors| split_authors(&authors))
            .unwrap_or_default(),
        serie: shared.serie,
        publisher: text(Column::Publisher).and_then(non_empty),
        isbns: shared.isbns,
        mirrors,
        exacts: Exacts {
            year: text(Column::Year).and_then(|year| year.parse().ok()),
            lang: text(Column::Lang)
                .and_then(non_empty)
                .map(|lang| lang.to_lowercase()),
            edition: shared.edition,
            ext: text(Column::Ext).and_then(non_empty),
            pages: text(Column::Pages).and_then(|pages| pages.parse().ok()),
            size: text(Column::Size).and_then(|size| units::parse_size(&size)),
        },
    })
}

/// Splits the authors cell into names.
///
/// Names are separated by `;` when the cell has one, otherwise by `,`, so
/// `"Smith, J.; Doe, A"` keeps its "Last, First" pairs together.
///
/// ```rust
/// use bookwyrm::extract::split_authors;
///
/// assert_eq!(split_authors("Smith, J.; Doe, A"), vec!["Smith, J.", "Doe, A"]);
/// assert_eq!(split_authors("Kernighan, Ritchie"), vec!["Kernighan", "Ritchie"]);
/// assert!(split_authors("  ").is_empty());
/// ```
pub fn split_authors(text: &str) -> Vec<String> {
    let separator = if text.contains(';') { ';' } else { ',' };
    text.split(separator)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

fn first_link(cell: ElementRef) -> Option<String> {
    let selector = Selector::parse("a[href]").ok()?;
    cell.select(&selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(String::from)
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
