mod benchmark;
mod cache;
mod config;
mod error;
mod fetcher;
mod loader;
mod models;
mod pipeline;
mod ranker;
mod render;
mod scoring;
mod source;
mod utils;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, PoolSize};
use crate::fetcher::fetch_records;
use crate::pipeline::{Pipeline, RunOptions};
use crate::render::RenderOptions;

#[derive(Parser)]
#[command(
    name = "asx-dashboard",
    about = "ASX stock dashboard: valuation metrics against sector benchmarks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args, Clone, Copy)]
struct BenchmarkArgs {
    /// Top-N market-cap pool for dynamic benchmarks (100, 150 or 200)
    #[arg(short, long, env = "ASX_POOL_SIZE")]
    pool: Option<PoolSize>,

    /// Skip dynamic benchmarking and use the static sector table only
    #[arg(long)]
    static_benchmarks: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the focus list, score it and print the color-coded table
    Dashboard {
        #[command(flatten)]
        bench: BenchmarkArgs,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,
    },

    /// Show the resolved benchmark table per sector
    Benchmarks {
        #[command(flatten)]
        bench: BenchmarkArgs,
    },

    /// Fetch and print normalized metric records for the given tickers
    Fetch {
        #[arg(required = true)]
        tickers: Vec<String>,
    },

    /// List the benchmark pool: top tickers by market cap
    Rank {
        #[arg(short, long)]
        pool: Option<PoolSize>,
    },
}

impl BenchmarkArgs {
    fn options(self, config: &AppConfig) -> RunOptions {
        let mut opts = RunOptions::from_config(config);
        if let Some(pool) = self.pool {
            opts.pool_size = pool;
        }
        if self.static_benchmarks {
            opts.dynamic_benchmarks = false;
        }
        opts
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "asx_dashboard=info,warn",
        1 => "asx_dashboard=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = AppConfig::load()?;
    let pipeline = Pipeline::from_config(config.clone())?;

    match cli.command {
        Command::Dashboard {
            bench,
            json,
            no_color,
        } => {
            let report = pipeline
                .run(bench.options(&config))
                .await
                .context("Dashboard run failed")?;

            if json {
                println!("{}", render::render_json(&report)?);
            } else {
                let opts = RenderOptions {
                    display: config.display,
                    color: !no_color,
                };
                print!("{}", render::render_dashboard(&report, opts));
                println!();
                print!("{}", render::render_rationale());
            }
        }

        Command::Benchmarks { bench } => {
            let (resolver, stats) = pipeline.benchmarks(bench.options(&config)).await;
            info!(
                "{} pooled tickers, {} sectors with dynamic values",
                stats.pool_ranked, stats.dynamic_sectors
            );
            print!("{}", render::render_benchmarks(&resolver));
        }

        Command::Fetch { tickers } => {
            let _t = utils::Timer::start(format!("Fetching {} tickers", tickers.len()));
            let outcome = fetch_records(
                pipeline.source(),
                &tickers,
                &config.universe.exchange_suffix,
                config.pipeline.concurrency,
            )
            .await;
            print!("{}", render::render_records(&outcome.records));
            if !outcome.failures.is_empty() {
                println!("{} ticker(s) failed:", outcome.failures.len());
                for f in &outcome.failures {
                    println!("  {}", f);
                }
            }
        }

        Command::Rank { pool } => {
            let pool = pool.unwrap_or(config.pipeline.pool_size);
            let ranked = pipeline.rank_pool(pool).await?;
            if ranked.is_empty() {
                println!("No market caps available.");
            } else {
                println!("Top {} of {} requested:", ranked.len(), pool);
                print!("{}", render::render_ranking(&ranked));
            }
        }
    }

    Ok(())
}
