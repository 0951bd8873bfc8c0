use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use gradcafe_crawler::checkpoint::{load_records, write_json};
use gradcafe_crawler::fetch::{Fetcher, HttpFetcher};
use gradcafe_crawler::normalize::{decision_distribution, field_coverage, normalize_all};
use gradcafe_crawler::record::NormalizedRecord;
use gradcafe_crawler::{parser, CrawlConfig, Pipeline};

#[derive(Parser)]
#[command(name = "gradcafe_crawler", about = "GradCafe admissions results crawler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl listings, resolve detail pages and write the normalized dataset
    Run {
        /// Number of entries to collect
        #[arg(short = 'n', long)]
        entries: Option<usize>,
        /// Concurrent detail fetches
        #[arg(short, long)]
        workers: Option<usize>,
        /// Entries per resolution batch
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Listing page cap
        #[arg(long)]
        max_pages: Option<usize>,
        /// Use the shorter delay windows
        #[arg(long)]
        fast: bool,
        /// Config file (TOML/JSON); GRADCRAWL__* env vars override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output file for the normalized records
        #[arg(short, long, default_value = "data/applicant_data.json")]
        output: PathBuf,
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Normalize a checkpoint file without crawling
    Normalize {
        input: PathBuf,
        #[arg(short, long, default_value = "data/applicant_data_clean.json")]
        output: PathBuf,
    },
    /// Print the fields extracted from one detail page (URL or local file)
    Inspect { target: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            entries,
            workers,
            batch_size,
            max_pages,
            fast,
            config,
            output,
            no_progress,
        } => {
            let mut cfg = CrawlConfig::load(config.as_deref()).context("loading configuration")?;
            if fast {
                cfg = cfg.fast();
            }
            if let Some(n) = entries {
                cfg.target_entries = n;
            }
            if let Some(w) = workers {
                cfg.workers = w;
            }
            if let Some(b) = batch_size {
                cfg.batch_size = b;
            }
            if let Some(p) = max_pages {
                cfg.max_pages = p;
            }
            if no_progress {
                cfg.show_progress = false;
            }

            let fetcher = HttpFetcher::new(cfg.request_timeout(), &cfg.base_url)
                .context("building HTTP client")?;
            println!(
                "Crawling up to {} entries ({} workers, batches of {})...",
                cfg.target_entries, cfg.workers, cfg.batch_size
            );

            let out = Pipeline::new(cfg, Arc::new(fetcher)).run().await?;
            write_json(&output, &out.records)
                .with_context(|| format!("writing {}", output.display()))?;

            out.summary.print();
            print_report(&out.records);
            if let Some(path) = &out.final_checkpoint {
                println!("Final checkpoint: {}", path.display());
            }
            println!("Saved {} records to {}", out.records.len(), output.display());
            Ok(())
        }
        Commands::Normalize { input, output } => {
            let records = load_records(&input)
                .with_context(|| format!("reading checkpoint {}", input.display()))?;
            let total = records.len();
            let (clean, dropped) = normalize_all(records);
            write_json(&output, &clean)
                .with_context(|| format!("writing {}", output.display()))?;

            println!("Normalized {} records ({} dropped).", total, dropped);
            print_report(&clean);
            println!("Saved to {}", output.display());
            Ok(())
        }
        Commands::Inspect { target } => {
            let html = read_document(&target).await?;
            let detail = parser::parse_detail(&html);
            println!("{}", serde_json::to_string_pretty(&detail)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn read_document(target: &str) -> anyhow::Result<String> {
    if target.starts_with("http://") || target.starts_with("https://") {
        let cfg = CrawlConfig::default();
        let fetcher = HttpFetcher::new(cfg.request_timeout(), &cfg.base_url)?;
        let doc = fetcher
            .fetch(target)
            .await
            .with_context(|| format!("fetching {target}"))?;
        Ok(doc.body)
    } else {
        std::fs::read_to_string(Path::new(target)).with_context(|| format!("reading {target}"))
    }
}

fn print_report(records: &[NormalizedRecord]) {
    if records.is_empty() {
        return;
    }
    let total = records.len();
    let pct = |n: usize| n as f64 * 100.0 / total as f64;

    println!("\n=== Field Coverage ===");
    for (field, n) in field_coverage(records) {
        println!("{:<12} {:>6}/{} ({:.1}%)", field, n, total, pct(n));
    }

    println!("\n=== Decision Distribution ===");
    for (decision, n) in decision_distribution(records) {
        println!("{:<12} {:>6} ({:.1}%)", decision, n, pct(n));
    }

    let avg = records.iter().map(|r| r.completeness as usize).sum::<usize>() / total;
    println!("\nAverage completeness: {}%", avg);
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
