//! bookwyrm - search the catalog from the command line
//!
//! Prints one block per item with its resolved mirrors, or the items as
//! JSON. With `--download DIR` every item is also saved into `DIR`.

use std::path::PathBuf;

use bookwyrm::prelude::*;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{debug, info, warn};

/// Search a library-catalog mirror network and resolve download links.
#[derive(Parser, Debug)]
#[command(name = "bookwyrm")]
#[command(author, version, about)]
struct Args {
    /// Search terms
    #[arg(required = true)]
    query: Vec<String>,

    /// Catalog field to match (def, title, author, series, publisher, year,
    /// isbn, language, md5, tags, extension)
    #[arg(short, long, default_value = "def")]
    column: SearchColumn,

    /// Maximum number of results
    #[arg(short, long)]
    limit: Option<usize>,

    /// Result page of the catalog
    #[arg(short, long)]
    page: Option<u32>,

    /// Fail on the first row that cannot be parsed instead of skipping it
    #[arg(long)]
    strict: bool,

    /// JSON configuration file; defaults to <config dir>/bookwyrm/config.json
    /// when that exists
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,

    /// Download every result into this directory
    #[arg(short, long, value_name = "DIR")]
    download: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_config(path: Option<&PathBuf>) -> Result<CatalogConfig> {
    if let Some(path) = path {
        return CatalogConfig::from_file(path)
            .wrap_err_with(|| format!("loading configuration from {}", path.display()));
    }

    let default_path = dirs::config_dir().map(|dir| dir.join("bookwyrm").join("config.json"));
    match default_path {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "using configuration file");
            CatalogConfig::from_file(&path)
                .wrap_err_with(|| format!("loading configuration from {}", path.display()))
        }
        _ => Ok(CatalogConfig::default()),
    }
}

fn print_item(index: usize, item: &Item) {
    println!("{:>3}. {}", index + 1, item.title);
    if !item.authors.is_empty() {
        println!("     by {}", item.authors.join("; "));
    }

    let mut details = Vec::new();
    if let Some(year) = item.exacts.year {
        details.push(year.to_string());
    }
    if let Some(publisher) = &item.publisher {
        details.push(publisher.clone());
    }
    if let Some(lang) = &item.exacts.lang {
        details.push(lang.clone());
    }
    if let Some(ext) = &item.exacts.ext {
        details.push(ext.clone());
    }
    if let Some(size) = item.exacts.size {
        details.push(format!("{:.1} MB", size as f64 / 1e6));
    }
    if !details.is_empty() {
        println!("     {}", details.join(", "));
    }

    for uri in &item.mirrors {
        println!("     -> {}", uri);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "bookwyrm=info",
        1 => "bookwyrm=debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = load_config(args.config.as_ref())?;
    let client = config.http_client();
    let catalog = Catalog::new(config);

    let mut search = catalog.search(args.query.join(" ")).column(args.column);
    if let Some(limit) = args.limit {
        search = search.limit(limit);
    }
    if let Some(page) = args.page {
        search = search.page(page);
    }
    if args.strict {
        search = search.strict();
    }

    let items = search.execute().await.wrap_err("search failed")?;
    info!(results = items.len(), "search finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for (index, item) in items.iter().enumerate() {
            print_item(index, item);
        }
    }

    if let Some(dir) = &args.download {
        let mut failed = 0;
        for item in &items {
            match download_item(&client, item, dir).await {
                Ok(path) => info!(path = %path.display(), "saved"),
                Err(e) => {
                    failed += 1;
                    warn!(title = %item.title, error = %e, "download failed");
                }
            }
        }
        if failed > 0 && failed == items.len() {
            color_eyre::eyre::bail!("no item could be downloaded");
        }
    }

    Ok(())
}
