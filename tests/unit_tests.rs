use bookwyrm::column::{ColumnFragment, TitleColumn, first_number};
use bookwyrm::extract::{extract_row, split_authors};
use bookwyrm::mirror::{form_trigger_url, torrent_info_url};
use bookwyrm::net::html;
use bookwyrm::prelude::*;
use bookwyrm::torrent::magnet_from_torrent;
use bookwyrm::types::SearchParamsBuilder;
use bookwyrm::units::parse_size;
use bookwyrm::Error;

mod common;
use common::{FORM_PAGE, FORM_TRIGGER_URI, TORRENT, broken_row, catalog_row};

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_one(row: String) -> bookwyrm::Result<Item> {
        html::parse_rows(vec![row], extract_row).remove(0)
    }

    #[test]
    fn test_search_params_builder() {
        let params = SearchParamsBuilder::default()
            .query("the pragmatic programmer")
            .column(SearchColumn::Title)
            .page(Some(2))
            .limit(Some(10))
            .build()
            .unwrap();

        assert_eq!(params.query, "the pragmatic programmer");
        assert_eq!(params.column, SearchColumn::Title);
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(10));
    }

    #[test]
    fn test_search_params_validation() {
        let params = SearchParamsBuilder::default()
            .query("test")
            .build()
            .unwrap();

        assert_eq!(params.column, SearchColumn::Default);
        assert_eq!(params.page, None);
        assert_eq!(params.limit, None);

        assert!(SearchParamsBuilder::default().build().is_err());
    }

    #[test]
    fn test_search_params_from_string() {
        let params: SearchParams = "test query".into();
        assert_eq!(params.query, "test query");
        assert!(params.limit.is_none());

        let params: SearchParams = "another query".to_string().into();
        assert_eq!(params.query, "another query");
    }

    #[test]
    fn test_search_column_parsing() {
        assert_eq!("ISBN".parse::<SearchColumn>().unwrap(), SearchColumn::Isbn);
        assert_eq!("ext".parse::<SearchColumn>().unwrap(), SearchColumn::Extension);
        assert!(matches!(
            "colour".parse::<SearchColumn>(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_authors_semicolon_wins_over_comma() {
        assert_eq!(split_authors("Smith, J.; Doe, A"), vec!["Smith, J.", "Doe, A"]);
        assert_eq!(split_authors("Smith, Doe"), vec!["Smith", "Doe"]);
    }

    #[test]
    fn test_edition_values() {
        let edition = |text: &str| {
            TitleColumn::from_fragments(vec![ColumnFragment::Edition(first_number(text))]).edition
        };
        assert_eq!(edition("[7th Revised Edition]"), Some(7));
        assert_eq!(edition("[6ed.]"), Some(6));
        assert_eq!(edition("[Reprint]"), None);
        assert_eq!(TitleColumn::from_fragments(vec![]).edition, None);
    }

    #[test]
    fn test_size_parsing() {
        assert_eq!(parse_size("816kb"), Some(102_000));
        assert_eq!(parse_size("3 Mb"), Some(375_000));
        assert_eq!(parse_size("many"), None);
    }

    #[test]
    fn test_fixture_row_extracts() {
        let item = extract_one(catalog_row("http://127.0.0.1:9", 1042, "Second Foundation")).unwrap();

        assert_eq!(item.title, "Second Foundation");
        assert_eq!(item.publisher.as_deref(), Some("Spectra"));
        assert_eq!(
            item.isbns,
            Some(vec![
                "978-0-553-29336-8".to_string(),
                "0-553-29336-5".to_string()
            ])
        );
        assert_eq!(item.exacts.pages, Some(320));
        assert_eq!(item.exacts.ext.as_deref(), Some("pdf"));
        assert_eq!(item.mirrors[2], "/ads.php?md5=MD51042");
    }

    #[test]
    fn test_broken_row_is_extract_error() {
        assert!(matches!(
            extract_one(broken_row(3)),
            Err(Error::Extract { .. })
        ));
    }

    #[test]
    fn test_mirror_classification() {
        let config = CatalogConfig::default();
        assert_eq!(
            MirrorKind::classify("http://golibgen.io/view.php?id=1", &config),
            MirrorKind::FormTriggerHost
        );
        assert_eq!(
            MirrorKind::classify("http://bookzz.org/md5/AB", &config),
            MirrorKind::DirectHost
        );
        assert_eq!(
            MirrorKind::classify("/ads.php?md5=AB", &config),
            MirrorKind::RelativeTorrentPath
        );
        assert_eq!(
            MirrorKind::classify("http://library1.org/_ads/AB", &config),
            MirrorKind::Unrecognized
        );
    }

    #[test]
    fn test_classification_follows_config_markers() {
        let config = CatalogConfig::from_json_str(
            r#"{ "form_trigger_marker": "getbook", "direct_host_marker": "b-ok" }"#,
        )
        .unwrap();
        assert_eq!(
            MirrorKind::classify("http://getbook.example/x", &config),
            MirrorKind::FormTriggerHost
        );
        assert_eq!(
            MirrorKind::classify("http://golibgen.io/x", &config),
            MirrorKind::Unrecognized
        );
    }

    #[test]
    fn test_form_trigger_reconstruction() {
        assert_eq!(form_trigger_url(FORM_PAGE, "golibgen.io").unwrap(), FORM_TRIGGER_URI);
    }

    #[test]
    fn test_torrent_request_and_magnet() {
        assert_eq!(
            torrent_info_url("http://gen.lib.rus.ec", "/ads.php?md5=AB").unwrap(),
            "http://gen.lib.rus.ec/book/index.php?md5=AB&oftorrent="
        );

        let magnet = magnet_from_torrent(TORRENT).unwrap();
        assert!(magnet.starts_with("magnet:?xt=urn:btih:"));
        assert!(magnet.ends_with("&tr=http%3A%2F%2Ft.example%2Fann"));
        assert!(matches!(magnet_from_torrent(b"not bencode"), Err(Error::Torrent(_))));
    }

    #[test]
    fn test_error_handling() {
        let error = Error::parse("Test parse error");
        assert!(error.to_string().contains("Test parse error"));

        let error = Error::not_found("Test not found error");
        assert!(error.to_string().contains("Test not found error"));
    }
}
