use std::path::PathBuf;

use anyhow::{bail, Context};
use cardlist_scraping::{
    config::Config,
    fetch::{validate_url, Fetcher},
    ingest::{ingest_html, IngestOptions},
    language::{resolve_language_code, LanguageCode},
    store::InMemoryStore,
};
use cardlist_scraping_utils::fs_json_util::{read_json_or_default, write_json};
use clap::Parser;
use log::info;

#[derive(Parser)]
struct Opts {
    /// A saved page or `<tbody>` fragment.
    #[arg(long, conflicts_with = "url")]
    html: Option<PathBuf>,
    /// A set-list page on an allowed host.
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the detected language (aliases such as `ES` or `CN` are accepted).
    #[arg(long, value_parser = parse_language)]
    language: Option<LanguageCode>,
    /// Writes the parsed batch, its groups and statistics as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
    /// JSON file of the store the batch is saved into; created if missing.
    #[arg(long)]
    store: Option<PathBuf>,
    #[arg(long, requires = "store")]
    series_name: Option<String>,
}

fn parse_language(raw: &str) -> anyhow::Result<LanguageCode> {
    resolve_language_code(raw).with_context(|| format!("Unknown language: {raw:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let opts = Opts::parse();
    let config = Config::load(opts.config.as_deref())?;

    let (html, source_url) = match (&opts.html, &opts.url) {
        (Some(path), _) => (fs_err::read_to_string(path)?, None),
        (None, Some(url)) => {
            let url = validate_url(url, config.fetch().allowed_hosts())?;
            let html = Fetcher::new(config.fetch())?
                .fetch_table(url.as_str())
                .await
                .with_context(|| format!("While fetching {url}"))?;
            (html, Some(url))
        }
        (None, None) => bail!("Either --html or --url is required"),
    };

    let options = IngestOptions::from_config(config.ingest(), opts.language);
    let outcome = ingest_html(&html, &options)?;
    let statistics = outcome.statistics();
    println!(
        "{} entries, {} groups, language {} ({}% of {} matched codes)",
        statistics.total_entries(),
        outcome.groups().len(),
        outcome.language(),
        outcome.detection().confidence_percent(),
        outcome.detection().matches(),
    );

    if let Some(path) = &opts.output {
        write_json(path, &outcome.report())?;
        info!("Wrote the report to {path:?}");
    }

    if let Some(path) = &opts.store {
        let mut store: InMemoryStore = read_json_or_default(path)?;
        let report = outcome.submit(&mut store, opts.series_name.as_deref(), source_url.as_ref())?;
        write_json(path, &store)?;
        println!(
            "Saved series {}: {} new cards, {} rarities, {} new links",
            report.series(),
            report.cards_created(),
            report.rarities_processed(),
            report.links_created(),
        );
    }

    Ok(())
}
