//! Geopulse CLI - Command line playback console for geo mention feeds

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geopulse_core::MentionRecord;
use geopulse_runtime::gazetteer::{load_places, Gazetteer};
use geopulse_runtime::pipeline::{Pipeline, UnresolvedPolicy};
use geopulse_runtime::playback::{spawn_playback, Playback};
use geopulse_runtime::resolver::Resolver;
use geopulse_runtime::sink::{ConsoleSink, JsonlSink};
use geopulse_runtime::source::{DatasetFeed, EventSource, MalformedPolicy, SyntheticFeed};

use geopulse_cli::check_dataset;
use geopulse_cli::config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(name = "geopulse")]
#[command(author = "Geopulse Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Geopulse - Geo mention playback console", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, global = true, env = "GEOPULSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a synthetic mention feed drawn from the place index
    Demo {
        /// Number of mentions to generate
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Tick period in milliseconds
        #[arg(long)]
        period_ms: Option<u64>,

        /// Path to the place index (.json)
        #[arg(short, long)]
        places: Option<PathBuf>,
    },

    /// Play a static alert dataset at the alert cadence
    Play {
        /// Path to the alert dataset (.json or JSON lines)
        file: Option<PathBuf>,

        /// Tick period in milliseconds
        #[arg(long)]
        period_ms: Option<u64>,

        /// Drop malformed records instead of failing the load
        #[arg(long)]
        skip_malformed: bool,

        /// Render unresolved mentions at their source coordinates
        #[arg(long)]
        passthrough: bool,

        /// Append kind-tagged JSON lines to this file
        #[arg(long)]
        jsonl: Option<PathBuf>,

        /// Path to the place index (.json)
        #[arg(short, long)]
        places: Option<PathBuf>,
    },

    /// Fuzzy search the place index
    Search {
        /// Query text
        query: String,

        /// Maximum number of hits
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Override the match threshold
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,

        /// Path to the place index (.json)
        #[arg(short, long)]
        places: Option<PathBuf>,
    },

    /// Validate an alert dataset without playing it
    Check {
        /// Path to the alert dataset
        file: PathBuf,
    },

    /// Generate example configuration file
    ConfigGen {
        /// Output format (yaml, toml)
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config file if specified
    let mut config = Config::default();
    if let Some(ref config_path) = cli.config {
        let loaded = Config::load(config_path).map_err(|e| anyhow::anyhow!("{}", e))?;
        config.merge(loaded);
    }

    // Initialize logging
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Demo {
            count,
            seed,
            period_ms,
            places,
        } => {
            run_demo(&config, count, seed, period_ms, places).await?;
        }

        Commands::Play {
            file,
            period_ms,
            skip_malformed,
            passthrough,
            jsonl,
            places,
        } => {
            run_play(
                &config,
                file,
                period_ms,
                skip_malformed,
                passthrough,
                jsonl,
                places,
            )
            .await?;
        }

        Commands::Search {
            query,
            limit,
            threshold,
            json,
            places,
        } => {
            run_search(&config, &query, limit, threshold, json, places)?;
        }

        Commands::Check { file } => {
            check_alerts(&file)?;
        }

        Commands::ConfigGen { format, output } => {
            let content = match format.to_lowercase().as_str() {
                "yaml" | "yml" => Config::example_yaml(),
                "toml" => Config::example_toml(),
                _ => anyhow::bail!("Unsupported format: {}. Use 'yaml' or 'toml'", format),
            };

            if let Some(path) = output {
                std::fs::write(&path, &content)?;
                println!("Configuration written to: {}", path.display());
            } else {
                println!("{}", content);
            }
        }
    }

    Ok(())
}

/// Install the global subscriber from the logging section. `RUST_LOG`
/// still wins when it is set.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = FmtSubscriber::builder().with_env_filter(filter);

    match (logging.format.as_str(), logging.timestamps) {
        ("json", true) => tracing::subscriber::set_global_default(builder.json().finish())?,
        ("json", false) => {
            tracing::subscriber::set_global_default(builder.json().without_time().finish())?
        }
        (_, true) => tracing::subscriber::set_global_default(builder.finish())?,
        (_, false) => tracing::subscriber::set_global_default(builder.without_time().finish())?,
    }
    Ok(())
}

/// Build the gazetteer from the configured place index.
fn load_gazetteer(
    config: &Config,
    places_override: Option<PathBuf>,
    threshold_override: Option<f64>,
) -> Result<Arc<Gazetteer>> {
    let path = places_override
        .or_else(|| config.places_file.clone())
        .unwrap_or_else(|| PathBuf::from("data/places.sample.json"));
    let entities = load_places(&path)?;
    let threshold = threshold_override.unwrap_or(config.gazetteer.threshold);
    let gazetteer = Gazetteer::with_threshold(entities, threshold)?;
    info!(
        "Gazetteer ready: {} places from {}",
        gazetteer.len(),
        path.display()
    );
    Ok(Arc::new(gazetteer))
}

/// Wire a pipeline with a console sink, plus a JSONL sink when requested.
fn build_pipeline(
    gazetteer: Arc<Gazetteer>,
    config: &Config,
    passthrough: bool,
    jsonl: Option<PathBuf>,
) -> Result<Pipeline> {
    let policy = if passthrough {
        UnresolvedPolicy::Passthrough
    } else {
        config.pipeline.unresolved
    };

    let compact = config.output.as_ref().map(|o| o.compact).unwrap_or(false);
    let console = if compact {
        ConsoleSink::new("console").compact()
    } else {
        ConsoleSink::new("console")
    };

    let mut pipeline = Pipeline::new(Resolver::new(gazetteer))
        .with_policy(policy)
        .with_top_n(config.pipeline.top_n)
        .with_sink(Box::new(console));

    let jsonl_path = jsonl.or_else(|| config.output.as_ref().and_then(|o| o.jsonl.clone()));
    if let Some(path) = jsonl_path {
        pipeline = pipeline.with_sink(Box::new(JsonlSink::new("jsonl", &path)?));
        info!("Appending output to {}", path.display());
    }

    Ok(pipeline)
}

/// Play `records` through the pipeline and print the final report.
async fn run_feed(
    records: Vec<MentionRecord>,
    period: Duration,
    pipeline: &mut Pipeline,
) -> Result<()> {
    let playback = Playback::new(records, period);
    let (tx, rx) = mpsc::channel(256);
    let handle = spawn_playback(playback, tx);

    let stats = pipeline.run(rx).await?;
    handle.join().await?;

    println!("\nPlayback Complete!");
    println!("==================");
    println!("Mentions played: {}", stats.ingested);
    println!(
        "Resolved: {} | Unresolved: {}",
        stats.resolved, stats.unresolved
    );

    let ranking = pipeline.ranking();
    if !ranking.is_empty() {
        println!("\nMost mentioned:");
        for (i, entry) in ranking.iter().enumerate() {
            println!("  {}. {} ({} mentions)", i + 1, entry.display_name, entry.count);
        }
    }

    Ok(())
}

async fn run_demo(
    config: &Config,
    count: Option<usize>,
    seed: Option<u64>,
    period_ms: Option<u64>,
    places: Option<PathBuf>,
) -> Result<()> {
    let count = count.unwrap_or(config.synthetic.count);
    let period = Duration::from_millis(period_ms.unwrap_or(config.playback.period_ms));
    let seed = seed.or(config.synthetic.seed);

    println!("Geopulse Synthetic Feed Demo");
    println!("============================");
    println!("Mentions: {}", count);
    println!("Period: {} ms", period.as_millis());
    match seed {
        Some(s) => println!("Seed: {}", s),
        None => println!("Seed: (entropy)"),
    }
    println!();

    let gazetteer = load_gazetteer(config, places, None)?;
    let mut feed = SyntheticFeed::new(gazetteer.clone())
        .with_count(count)
        .with_window(chrono::Duration::days(config.synthetic.window_days));
    if let Some(s) = seed {
        feed = feed.with_seed(s);
    }
    let records = feed.produce()?;

    let mut pipeline = build_pipeline(gazetteer, config, false, None)?;
    run_feed(records, period, &mut pipeline).await
}

async fn run_play(
    config: &Config,
    file: Option<PathBuf>,
    period_ms: Option<u64>,
    skip_malformed: bool,
    passthrough: bool,
    jsonl: Option<PathBuf>,
    places: Option<PathBuf>,
) -> Result<()> {
    let path = file
        .or_else(|| config.dataset.alerts_file.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No dataset given; pass a file or set dataset.alerts_file")
        })?;
    let period = Duration::from_millis(period_ms.unwrap_or(config.playback.alert_period_ms));

    println!("Geopulse Alert Playback");
    println!("=======================");
    println!("Dataset: {}", path.display());
    println!("Period: {} ms", period.as_millis());
    println!();

    let policy = if skip_malformed {
        MalformedPolicy::Skip
    } else {
        config.dataset.malformed
    };
    let records = DatasetFeed::new(&path).with_policy(policy).produce()?;

    let gazetteer = load_gazetteer(config, places, None)?;
    let mut pipeline = build_pipeline(gazetteer, config, passthrough, jsonl)?;
    run_feed(records, period, &mut pipeline).await
}

fn run_search(
    config: &Config,
    query: &str,
    limit: usize,
    threshold: Option<f64>,
    json: bool,
    places: Option<PathBuf>,
) -> Result<()> {
    let gazetteer = load_gazetteer(config, places, threshold)?;
    let hits = gazetteer.search(query, limit);

    if json {
        let rows: Vec<serde_json::Value> = hits
            .iter()
            .map(|hit| {
                serde_json::json!({
                    "name": hit.place.display_name.as_ref(),
                    "tier": hit.place.tier.to_string(),
                    "score": hit.score,
                    "lat": hit.place.coords.lat,
                    "lon": hit.place.coords.lon,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if hits.is_empty() {
        println!(
            "No match for '{}' within threshold {}",
            query,
            gazetteer.threshold()
        );
    } else {
        for hit in &hits {
            println!(
                "{:.3}  {} ({}) @ {}",
                hit.score, hit.place.display_name, hit.place.tier, hit.place.coords
            );
        }
    }

    Ok(())
}

fn check_alerts(file: &PathBuf) -> Result<()> {
    match check_dataset(file) {
        Ok(summary) => {
            println!(
                "Dataset OK ({} records, {} with alert level)",
                summary.records, summary.with_alert
            );
            if let Some((first, last)) = summary.span {
                println!(
                    "Span: {} to {}",
                    first.format("%d %b %Y %H:%M"),
                    last.format("%d %b %Y %H:%M")
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("Dataset invalid: {}", e);
            Err(e)
        }
    }
}
