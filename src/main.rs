use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3provision::{config, provision};

#[derive(Parser)]
#[command(name = "s3provision")]
#[command(version, about = "Create MinIO buckets and make them publicly readable", long_about = None)]
struct Cli {
    /// YAML config file (defaults to MINIO_* environment variables)
    #[arg(long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Disable SSL certificate verification
    #[arg(long)]
    insecure: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the stdout report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match try_main(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(provision::EXIT_FAILURE)
        }
    }
}

fn try_main(cli: Cli) -> Result<u8> {
    let mut config = config::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if cli.insecure {
        config.insecure_tls = true;
    }

    tracing::debug!(
        endpoint = %config.endpoint(),
        region = %config.region,
        buckets = ?config.buckets,
        "configuration loaded"
    );

    // Provisioning is sequential I/O; a current_thread runtime is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    Ok(runtime.block_on(provision::run(&config)))
}
