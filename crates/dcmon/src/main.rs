use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use dcmon_core::config::DashboardConfig;
use dcmon_core::feed::{load_feed, HttpFeed};
use dcmon_core::ingestion::{ingest_paths, DocumentInput, DocumentStatus, IngestionBatch};
use dcmon_core::parser::{extract_cells, read_document_path};
use dcmon_core::session::{Dashboard, Session};
use dcmon_core::stats::{data_quality, overview};
use dcmon_core::views::{hydrogen_page, overview_page, pue_page, zone_page, ClimateMetric};
use dcmon_core::{Metric, TimeSeriesRecord};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DOCUMENT_EXTENSIONS: [&str; 4] = ["docx", "csv", "tsv", "txt"];

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Data-center monitoring: report extraction and dashboard views",
    long_about = None
)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the cleaned cell stream of one or more documents
    Cells {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Extract a time-series record from report documents
    Extract {
        #[command(flatten)]
        documents: DocumentArgs,
        /// Print the full record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch and parse the remote CSV feed
    Fetch {
        /// Override the configured feed URL
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Headline figures and data quality for a data source
    Summary(SourceArgs),
    /// Render one dashboard page as JSON
    Page {
        #[arg(value_enum)]
        kind: PageKind,
        #[command(flatten)]
        source: SourceArgs,
        /// Zone display names, comma separated; defaults to a random pair
        #[arg(long, value_delimiter = ',')]
        zones: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
struct DocumentArgs {
    /// Report files
    files: Vec<PathBuf>,
    /// Directory searched recursively for report files
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Use the remote feed instead of documents
    #[arg(long, conflicts_with_all = ["files", "dir"])]
    feed: bool,
    #[command(flatten)]
    documents: DocumentArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PageKind {
    Overview,
    Temperature,
    Humidity,
    Pue,
    Hydrogen,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config =
        DashboardConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Cells { files } => print_cells(&files),
        Command::Extract { documents, json } => {
            let paths = documents.resolve()?;
            let batch = ingest_paths(&paths).context("document extraction failed")?;
            print_warnings(&batch);
            if json {
                println!("{}", serde_json::to_string_pretty(&batch.record)?);
            } else {
                print_series_table(&batch.record);
            }
            Ok(())
        }
        Command::Fetch { url, json } => {
            let feed = match url {
                Some(url) => HttpFeed::new(url, config.feed_timeout()),
                None => HttpFeed::from_config(&config),
            };
            let record = load_feed(&feed)
                .with_context(|| format!("failed to load feed {}", feed.url()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_series_table(&record);
            }
            Ok(())
        }
        Command::Summary(source) => {
            let mut dashboard = Dashboard::new(config);
            let mut session = Session::new();
            load_source(&mut dashboard, &mut session, &source)?;
            let record = loaded_record(&session)?;
            print_summary(record);
            Ok(())
        }
        Command::Page {
            kind,
            source,
            zones,
        } => {
            let mut dashboard = Dashboard::new(config);
            let mut session = Session::new();
            load_source(&mut dashboard, &mut session, &source)?;
            let record = loaded_record(&session)?;
            let config = dashboard.config();

            let json = match kind {
                PageKind::Overview => {
                    serde_json::to_string_pretty(&overview_page(record, config.preview_points))?
                }
                PageKind::Temperature | PageKind::Humidity => {
                    let metric = match kind {
                        PageKind::Temperature => ClimateMetric::Temperature,
                        _ => ClimateMetric::Humidity,
                    };
                    let selected = if zones.is_empty() {
                        session.selected_zones(metric)
                    } else {
                        zones
                    };
                    let page = zone_page(record, metric, &selected, config.recent_points);
                    serde_json::to_string_pretty(&page)?
                }
                PageKind::Pue => {
                    serde_json::to_string_pretty(&pue_page(record, config.recent_points))?
                }
                PageKind::Hydrogen => {
                    serde_json::to_string_pretty(&hydrogen_page(record, config.recent_points))?
                }
            };
            println!("{json}");
            Ok(())
        }
    }
}

impl DocumentArgs {
    fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dir.is_none()
    }

    /// Explicit files first, then directory matches in sorted order.
    fn resolve(&self) -> Result<Vec<PathBuf>> {
        let mut paths = self.files.clone();
        if let Some(dir) = &self.dir {
            paths.extend(discover_documents(dir)?);
        }
        if paths.is_empty() {
            bail!("no report documents given; pass files or --dir");
        }
        Ok(paths)
    }
}

fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("**/*");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("directory path is not valid UTF-8: {}", dir.display()))?;

    let mut found = Vec::new();
    for entry in glob::glob(pattern).context("invalid directory pattern")? {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                warn!(error = %err, "could not read path while scanning directory");
                continue;
            }
        };
        let is_document = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_document {
            found.push(path);
        }
    }
    found.sort();
    info!(dir = %dir.display(), documents = found.len(), "discovered report documents");
    Ok(found)
}

fn load_source(
    dashboard: &mut Dashboard,
    session: &mut Session,
    source: &SourceArgs,
) -> Result<()> {
    if source.feed || source.documents.is_empty() {
        let feed = HttpFeed::from_config(dashboard.config());
        return dashboard
            .ensure_feed_loaded(session, &feed)
            .with_context(|| format!("failed to load feed {}", feed.url()));
    }

    let paths = source.documents.resolve()?;
    let mut uploads = Vec::with_capacity(paths.len());
    for path in &paths {
        let contents =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        uploads.push((path.display().to_string(), contents));
    }
    let inputs: Vec<DocumentInput<'_>> = uploads
        .iter()
        .map(|(name, contents)| DocumentInput {
            name,
            contents,
        })
        .collect();

    let batch = dashboard
        .load_documents(session, &inputs)
        .context("document extraction failed")?;
    print_warnings(&batch);
    Ok(())
}

fn loaded_record(session: &Session) -> Result<&TimeSeriesRecord> {
    session
        .record()
        .context("no data loaded for this session")
}

fn print_cells(files: &[PathBuf]) -> Result<()> {
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let document = read_document_path(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        documents.push(document);
    }
    for (idx, cell) in extract_cells(&documents).iter().enumerate() {
        println!("{idx}\t{}", cell.escape_debug());
    }
    Ok(())
}

fn print_warnings(batch: &IngestionBatch) {
    for report in &batch.reports {
        if report.status == DocumentStatus::Failed {
            eprintln!(
                "WARNING: skipped {}: {}",
                report.name,
                report.message.as_deref().unwrap_or("unreadable document")
            );
        }
    }
}

fn print_series_table(record: &TimeSeriesRecord) {
    let mut table = Table::new();
    table.set_header(vec!["Series", "Points", "Latest"]);
    table.add_row(vec![
        "dates".to_string(),
        record.dates.len().to_string(),
        record
            .dates
            .last()
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    for metric in Metric::all() {
        let values = record.series(metric);
        table.add_row(vec![
            metric.canonical_name(),
            values.len().to_string(),
            values
                .last()
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
    if !record.is_aligned() {
        eprintln!(
            "WARNING: series lengths differ from the number of dates; positions may not line up"
        );
    }
}

fn print_summary(record: &TimeSeriesRecord) {
    let overview = overview(record);
    let quality = data_quality(record);
    let number = |value: Option<f64>, unit: &str| {
        value
            .map(|value| format!("{value:.2}{unit}"))
            .unwrap_or_else(|| "-".to_string())
    };

    let mut table = Table::new();
    table.set_header(vec!["指标", "数值", "状态"]);
    table.add_row(vec![
        "平均温度".to_string(),
        number(overview.average_temperature, "℃"),
        String::new(),
    ]);
    table.add_row(vec![
        "平均湿度".to_string(),
        number(overview.average_humidity, "%"),
        String::new(),
    ]);
    table.add_row(vec![
        "PUE".to_string(),
        number(overview.latest_pue, ""),
        overview
            .pue_rating
            .map(|rating| rating.overview_label().to_string())
            .unwrap_or_default(),
    ]);
    table.add_row(vec![
        "氢气浓度".to_string(),
        number(overview.latest_hydrogen, " ppm"),
        overview
            .hydrogen_status
            .map(|status| status.label().to_string())
            .unwrap_or_default(),
    ]);
    table.add_row(vec![
        "数据集完整性".to_string(),
        format!("{}/{}", quality.valid_datasets, quality.total_datasets),
        format!("{:.1}%", quality.completeness()),
    ]);
    table.add_row(vec![
        "有效数据率".to_string(),
        format!("{}/{}", quality.valid_points, quality.total_points),
        format!("{:.1}% {}", quality.valid_rate, quality.grade.label()),
    ]);
    table.add_row(vec![
        "时间点".to_string(),
        format!("{} ({} unique)", quality.time_points, quality.unique_dates),
        quality
            .latest_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ]);
    println!("{table}");
}
