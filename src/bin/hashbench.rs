//! hashbench CLI: run dispatch strategies against an accumulator.

use clap::{Parser, Subcommand};
use hashbench::accumulator::{self, Accumulator};
use hashbench::config::{Config, RunParams, Sweep};
use hashbench::harness::RunHarness;
use hashbench::model::{RunRecord, StrategyKind};
use hashbench::telemetry::{TelemetryConfig, init_telemetry};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hashbench", about = "Hash-and-deliver throughput benchmark")]
struct Cli {
    /// Print run records as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a single run
    Run {
        #[arg(long, value_enum, default_value_t = StrategyKind::Pipelined)]
        strategy: StrategyKind,
        /// Number of work items
        #[arg(long)]
        count: usize,
        /// bcrypt cost per item
        #[arg(long, default_value_t = 10)]
        difficulty: u32,
        /// Maximum in-flight deliveries (pipelined)
        #[arg(long, default_value_t = 100)]
        concurrency_limit: usize,
        /// Results per cohort (batched)
        #[arg(long, default_value_t = 100)]
        batch_size: usize,
    },
    /// Execute a parameter sweep
    Sweep {
        /// TOML sweep file; the built-in sweep is used when omitted
        #[arg(long)]
        file: Option<PathBuf>,
        /// Strategy for the built-in sweep
        #[arg(long, value_enum, default_value_t = StrategyKind::Pipelined)]
        strategy: StrategyKind,
    },
    /// Run the reference accumulator
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "hashbench".to_string(),
        log_level: config.log_level.clone(),
    })?;

    match cli.command {
        Command::Run {
            strategy,
            count,
            difficulty,
            concurrency_limit,
            batch_size,
        } => {
            let params = RunParams {
                strategy,
                count,
                difficulty,
                concurrency_limit,
                batch_size,
            };
            let harness = RunHarness::http(&config);
            let record = harness.run_once(&params).await?;
            print_records(&[record], cli.json)
        }
        Command::Sweep { file, strategy } => {
            let sweep = match file {
                Some(path) => Sweep::load(&path)?,
                None => Sweep::default_for(strategy),
            };
            let harness = RunHarness::http(&config);
            let records = harness.run_sweep(&sweep).await?;
            print_records(&records, cli.json)
        }
        Command::Serve { bind } => {
            accumulator::serve(bind, Accumulator::new()).await?;
            Ok(())
        }
    }
}

fn print_records(records: &[RunRecord], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    println!(
        "{:<10}  {:>8}  {:>4}  {:>10}  {:>8}  {:>6}",
        "STRATEGY", "ITEMS", "COST", "ELAPSED_S", "ACKED", "FAILED"
    );
    println!("{}", "-".repeat(56));
    for record in records {
        println!(
            "{:<10}  {:>8}  {:>4}  {:>10.3}  {:>8}  {:>6}",
            record.strategy.to_string(),
            record.num_items,
            record.difficulty,
            record.elapsed_seconds,
            record.acknowledged,
            record.failed
        );
    }
    Ok(())
}
