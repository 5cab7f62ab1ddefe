use anyhow::{Context, Result};
use clap::Parser;
use ipfs_deploy::{ConnectionConfig, DeployConfig, DeployEvent, deploy};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Upload a directory to IPFS and print the root CID.
#[derive(Parser, Debug)]
#[command(name = "ipfs-deploy", version)]
struct Args {
    /// Directory to upload
    src_dir: PathBuf,

    /// Log every file and CID as it is added
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let connection = ConnectionConfig::from_env().context("Invalid IPFS connection settings")?;
    let config = DeployConfig::new(args.src_dir, connection)
        .with_log(|event: &DeployEvent<'_>| debug!(target: "ipfs_deploy", "{}", event));

    let root = deploy(&config)
        .await
        .with_context(|| format!("Failed to deploy {}", config.src_dir.display()))?;

    if let Some(cid) = root {
        println!("{cid}");
    }
    Ok(())
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "ipfs_deploy=debug,warn"
    } else {
        "ipfs_deploy=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
