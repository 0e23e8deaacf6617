//! huginn — CI build result viewer CLI
//!
//! Reads build results straight from the object store and prints them as
//! JSON.

use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use huginn::config::Config;
use huginn::{BuildPath, Huginn};

static LONG_VERSION: LazyLock<String> = LazyLock::new(huginn::version::long_version);

/// Huginn CLI
#[derive(Parser)]
#[command(name = "huginn")]
#[command(version = huginn::PKG_VERSION, long_version = LONG_VERSION.as_str())]
#[command(about = "Inspect CI build results stored in GCS")]
struct Args {
    /// Path to config file (default: ~/.huginn/config.toml or /etc/huginn/config.toml)
    #[arg(short, long, env = "HUGINN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show started/finished info and failed tests of one build
    Build {
        /// Build path, e.g. /kubernetes-jenkins/logs/ci-kubernetes-e2e-gce/1234
        path: String,
        /// Render failure bodies as HTML with source links
        #[arg(long)]
        html: bool,
    },

    /// List the builds of a job, newest first
    Builds {
        /// Job directory, e.g. /kubernetes-jenkins/logs/ci-kubernetes-e2e-gce/
        job_dir: String,
    },

    /// List the jobs under a prefix
    Jobs {
        /// Prefix directory, e.g. /kubernetes-jenkins/logs/
        prefix: String,
    },

    /// Parse a local junit file (plain or gzipped) and print its failures
    Junit { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing on stderr (default: info; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(version = %huginn::version_string(), "huginn starting");

    // Commands that don't need the object store
    if let Command::Junit { file } = &args.command {
        let raw = std::fs::read(file)?;
        let xml = huginn::decompress::decompress(&raw)?;
        let failures = huginn::junit::parse_failures(&xml)?;
        println!("{}", serde_json::to_string_pretty(&failures)?);
        return Ok(());
    }

    let config = Config::load(args.config.as_deref())?;
    let viewer = Huginn::from_config(&config)?;

    match args.command {
        Command::Build { path, html } => {
            let path = BuildPath::parse(&path)?;
            let mut report = viewer.build(&path).await?;
            if html {
                for failure in &mut report.details.failures {
                    if let Some(detail) = failure.detail.take() {
                        failure.detail = Some(viewer.linkify(&detail, report.commit.as_deref()));
                    }
                }
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Builds { job_dir } => {
            let builds = viewer.builds(&job_dir).await?;
            println!("{}", serde_json::to_string_pretty(&builds)?);
        }
        Command::Jobs { prefix } => {
            let jobs = viewer.jobs(&prefix).await?;
            println!("{}", serde_json::to_string_pretty(&jobs)?);
        }
        Command::Junit { .. } => unreachable!("handled above"),
    }

    Ok(())
}
