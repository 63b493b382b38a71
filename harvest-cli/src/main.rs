use clap::{Parser, ValueEnum};
use harvest_app::domain::{CrawlReport, SiteConfig};
use harvest_app::infrastructure::config::SiteCatalog;
use harvest_app::{HarvestContext, OutputFormat};
use harvest_errors::CrawlError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Collect customer reviews from travel and map sites")]
#[command(version)]
struct Cli {
    /// Directory the review files are written to
    #[arg(short, long, required_unless_present = "list")]
    output_dir: Option<PathBuf>,

    /// Crawl a single configured site
    #[arg(short, long, conflicts_with = "all")]
    crawler: Option<String>,

    /// Crawl every configured site, one after another
    #[arg(short, long)]
    all: bool,

    /// Site catalog to use instead of the built-in one
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Reviews to collect per site, overriding the catalog
    #[arg(long)]
    target: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    visible: bool,

    /// Print the configured site names and exit
    #[arg(long)]
    list: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Jsonl,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => OutputFormat::Csv,
            Format::Jsonl => OutputFormat::JsonLines,
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every selected site was crawled and stored.
fn run(cli: Cli) -> Result<bool, String> {
    let mut catalog = match &cli.config {
        Some(path) => SiteCatalog::load(path),
        None => SiteCatalog::builtin(),
    }
    .map_err(|e| e.to_string())?;

    if cli.list {
        for name in catalog.names() {
            println!("{}", name);
        }
        return Ok(true);
    }

    let sites = select_sites(&catalog, cli.crawler.as_deref(), cli.all)?;
    if let Some(target) = cli.target {
        if target == 0 {
            return Err("--target must be positive".to_string());
        }
        catalog.override_target(target);
    }
    let output_dir = cli
        .output_dir
        .ok_or_else(|| "--output-dir is required".to_string())?;

    let context = HarvestContext::from_env(catalog, &output_dir, cli.format.into())
        .with_visible(cli.visible);

    Ok(crawl_sites(&context, &sites))
}

/// Names of the sites to crawl, in catalog order.
fn select_sites(
    catalog: &SiteCatalog,
    crawler: Option<&str>,
    all: bool,
) -> Result<Vec<String>, String> {
    if all {
        return Ok(catalog.names().into_iter().map(String::from).collect());
    }

    let Some(name) = crawler else {
        return Err("no crawler selected (use --crawler <NAME> or --all)".to_string());
    };

    match catalog.get(name) {
        Some(site) => Ok(vec![site.name.clone()]),
        None => Err(format!(
            "unknown crawler `{}` (available: {})",
            name,
            catalog.names().join(", ")
        )),
    }
}

#[cfg(feature = "headless")]
fn crawl_sites(context: &HarvestContext, names: &[String]) -> bool {
    let harvester = context.harvester();
    let mut all_ok = true;

    for name in names {
        let Some(site) = context.site(name) else {
            continue;
        };
        all_ok &= crawl_site(context, site, |site| harvester.execute(site));
    }

    all_ok
}

#[cfg(not(feature = "headless"))]
fn crawl_sites(_context: &HarvestContext, _names: &[String]) -> bool {
    eprintln!("error: this build has no browser support (enable the `headless` feature)");
    false
}

fn crawl_site<F>(context: &HarvestContext, site: &SiteConfig, execute: F) -> bool
where
    F: FnOnce(&SiteConfig) -> Result<CrawlReport, CrawlError>,
{
    let report = match execute(site) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(site = %site.name, "Crawl failed: {}", e);
            eprintln!("{}: {}", site.name, e.user_message());
            return false;
        }
    };

    let stored = match context.sink().store(&report.site, &report.records) {
        Ok(path) => {
            println!("{} -> {}", report.summary(), path.display());
            true
        }
        Err(e) => {
            tracing::error!(site = %site.name, "Failed to save reviews: {}", e);
            eprintln!("{}: could not save reviews: {}", site.name, e);
            false
        }
    };

    stored && !report.stop_reason.is_failure()
}
