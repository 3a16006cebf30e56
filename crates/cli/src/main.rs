use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::Rng;
use server::{EngineConfig, RecommendRequest, RecommendationOrchestrator};
use sources::{InMemoryCandidateSource, InMemorySignalFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

mod demo;

type DemoOrchestrator = RecommendationOrchestrator<InMemoryCandidateSource, InMemorySignalFetcher>;

/// StreamRecs - Stream Recommendation Engine
#[derive(Parser)]
#[command(name = "stream-recs")]
#[command(about = "Stream recommendation engine with signal-weighted ranking", long_about = None)]
struct Cli {
    /// Path to a JSON engine configuration file (weights, timeout, default limit)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get stream recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: String,

        /// Recently watched stream id, most recent first (repeatable).
        /// Defaults to the demo user's history when omitted.
        #[arg(long = "recent")]
        recent: Vec<String>,

        /// Number of recommendations to return (default from config)
        #[arg(long)]
        limit: Option<i64>,

        /// Show scores and request diagnostics
        #[arg(long)]
        explain: bool,
    },

    /// Run the liveness probe
    Health,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let orchestrator = RecommendationOrchestrator::new(
        Arc::new(demo::candidate_source()),
        Arc::new(demo::signal_fetcher()),
        config,
    )
    .context("Invalid engine configuration")?;

    match cli.command {
        Commands::Recommend {
            user_id,
            recent,
            limit,
            explain,
        } => handle_recommend(&orchestrator, user_id, recent, limit, explain).await?,
        Commands::Health => handle_health(&orchestrator),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(orchestrator, requests, concurrent).await?,
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        info!("No config file given, using default engine configuration");
        return Ok(EngineConfig::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    info!("Loaded engine configuration from {}", path.display());
    Ok(config)
}

async fn handle_recommend(
    orchestrator: &DemoOrchestrator,
    user_id: String,
    recent: Vec<String>,
    limit: Option<i64>,
    explain: bool,
) -> Result<()> {
    let recent = if recent.is_empty() {
        demo::recent_history(&user_id)
    } else {
        recent
    };

    if !recent.is_empty() {
        println!("Recent history: {}", recent.join(", ").dimmed());
    }

    let mut request = RecommendRequest::new(user_id.clone(), recent);
    if let Some(limit) = limit {
        request = request.with_limit(limit);
    }

    let start = Instant::now();
    let result = orchestrator
        .recommend(request)
        .await
        .with_context(|| format!("Recommendation failed for user {user_id}"))?;
    let elapsed = start.elapsed();

    if result.streams.is_empty() {
        println!("{} No eligible streams for user {}", "∅".yellow(), user_id);
        return Ok(());
    }

    println!(
        "{} Top {} recommendations for {} ({:?}):",
        "✓".green(),
        result.streams.len(),
        user_id.bold(),
        elapsed
    );
    for (i, rec) in result.streams.iter().enumerate() {
        if explain {
            println!(
                "{:>3}. {} {}",
                i + 1,
                rec.stream_id.bold(),
                format!("(score: {:.3})", rec.score).dimmed()
            );
        } else {
            println!("{:>3}. {}", i + 1, rec.stream_id);
        }
    }

    if explain {
        let d = &result.diagnostics;
        println!(
            "\n{} fetched={} eligible={} dropped_invalid={} degraded={} elapsed={:?}",
            "diagnostics:".dimmed(),
            d.candidates_fetched,
            d.eligible_candidates,
            d.dropped_invalid_signal,
            d.signals_degraded,
            d.elapsed
        );
    }

    Ok(())
}

fn handle_health(orchestrator: &DemoOrchestrator) {
    println!("{} {}", "✓".green(), orchestrator.health_check());
}

async fn handle_benchmark(
    orchestrator: DemoOrchestrator,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let concurrent = concurrent.max(1);
    let per_worker = requests.div_ceil(concurrent);

    println!(
        "Running {} requests across {} workers against the demo catalog...",
        requests, concurrent
    );

    let start = Instant::now();
    let mut workers = Vec::with_capacity(concurrent);
    for _ in 0..concurrent {
        let orchestrator = orchestrator.clone();
        workers.push(tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(per_worker);
            for _ in 0..per_worker {
                let idx = rand::rng().random_range(0..demo::DEMO_USERS.len());
                let (user_id, _) = demo::DEMO_USERS[idx];
                let request =
                    RecommendRequest::new(user_id, demo::recent_history(user_id));

                let request_start = Instant::now();
                let result = orchestrator.recommend(request).await;
                latencies.push((request_start.elapsed(), result.is_ok()));
            }
            latencies
        }));
    }

    let mut latencies: Vec<Duration> = Vec::with_capacity(requests);
    let mut failures = 0usize;
    for worker in workers {
        for (latency, ok) in worker.await.context("Benchmark worker panicked")? {
            latencies.push(latency);
            if !ok {
                failures += 1;
            }
        }
    }
    let total = start.elapsed();

    if latencies.is_empty() {
        println!("{} No requests were issued", "!".yellow());
        return Ok(());
    }

    latencies.sort_unstable();
    let count = latencies.len();
    let sum: Duration = latencies.iter().sum();
    let p50 = latencies[count / 2];
    let p95 = latencies[(count * 95 / 100).min(count - 1)];

    println!("{} Completed {} requests in {:?}", "✓".green(), latencies.len(), total);
    println!("  avg: {:?}", sum / count as u32);
    println!("  p50: {:?}", p50);
    println!("  p95: {:?}", p95);
    println!(
        "  throughput: {:.0} req/s",
        latencies.len() as f64 / total.as_secs_f64()
    );
    if failures > 0 {
        println!("{} {} requests failed", "!".red(), failures);
    }

    Ok(())
}
