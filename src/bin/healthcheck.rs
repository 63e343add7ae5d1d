use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use service_skeleton::observability::metrics::sample_value;

#[derive(Parser)]
#[command(name = "healthcheck")]
#[command(about = "Probe a running service-skeleton instance", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Request timeout in seconds.
    #[arg(short, long, default_value_t = 3)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness: GET /health
    Health,
    /// Readiness: GET /ready
    Ready,
    /// Scrape GET /metrics, optionally printing one series
    Metrics {
        /// Series name to print, e.g. active_connections
        #[arg(long)]
        series: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()?;
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => print_json(client.get(format!("{}/health", base)).send().await?).await,
        Commands::Ready => print_json(client.get(format!("{}/ready", base)).send().await?).await,
        Commands::Metrics { series } => {
            let res = client.get(format!("{}/metrics", base)).send().await?;
            let ok = res.status().is_success();
            let text = res.text().await?;
            match series {
                Some(name) => match sample_value(&text, &name, &[]) {
                    Some(value) => println!("{} {}", name, value),
                    None => {
                        eprintln!("Series {} not found", name);
                        return Ok(false);
                    }
                },
                None => print!("{}", text),
            }
            Ok(ok)
        }
    }
}

async fn print_json(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }
    Ok(status.is_success())
}
