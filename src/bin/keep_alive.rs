//! Health ping for the prediction service.
//!
//! The hosted backend sleeps when idle; a scheduled ping keeps it warm and
//! doubles as a liveness probe. Prints one JSON health report per ping.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin keep_alive -- [--url <base-url>] [--interval <secs>]
//! ```
//!
//! Without `--interval` a single ping is made and the exit status reflects
//! the result (0 healthy, 1 unhealthy). With it, pings repeat forever.
//!
//! Reports go to stdout, logs to stderr (filtered by `RUST_LOG`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::adapters::HttpPredictionClient;
use cardiorisk::application::AssessmentService;
use cardiorisk::AppConfig;

const USAGE: &str = "Usage: keep_alive [--url <base-url>] [--interval <secs>]";

fn main() -> Result<()> {
    // stdout carries the JSON reports.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SanitizingMakeWriter::new(std::io::stderr))
                .with_target(false),
        )
        .init();

    let mut config = AppConfig::from_env()?;
    let mut interval: Option<Duration> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => {
                let url = args.next().unwrap_or_default();
                if url.is_empty() {
                    bail!(USAGE);
                }
                config.client.base_url = url.trim_end_matches('/').to_string();
            }
            "--interval" => {
                let secs: u64 = args
                    .next()
                    .unwrap_or_default()
                    .parse()
                    .with_context(|| USAGE.to_string())?;
                interval = Some(Duration::from_secs(secs.max(1)));
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            other => bail!("Unknown argument: {other}\n{USAGE}"),
        }
    }

    let client = HttpPredictionClient::new(config.client.clone())?;
    let service = AssessmentService::new(Arc::new(client));

    let Some(interval) = interval else {
        let report = service.check_health();
        println!("{}", report.to_json()?);
        if !report.success {
            tracing::error!("Prediction service at {} is unhealthy", config.client.base_url);
            std::process::exit(1);
        }
        return Ok(());
    };

    loop {
        let report = service.check_health();
        println!("{}", report.to_json()?);
        std::thread::sleep(interval);
    }
}
