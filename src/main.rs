/// Kalshi CLI - Main entry point
/// Streams one contract's market data to the terminal

use anyhow::{Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use dotenvy::dotenv;
use std::process::ExitCode;

use kalshi_reader::credentials::{CredentialProvider, FileCredentials};
use kalshi_reader::render::{LivenessCounter, Renderer, TerminalRenderer};
use kalshi_reader::settings::Config;
use kalshi_reader::{
    ReaderError, ReconnectPolicy, ReconnectSupervisor, Signer, SnapshotFetcher, StateStore,
    WsConnector, telemetry,
};

#[derive(Parser)]
#[command(name = "kalshi-cli")]
#[command(about = "Real-time Kalshi market data in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Stream live data for one contract
    Reader {
        /// Contract ticker, e.g. KXHIGHNY-25JAN01-B45 (case-insensitive)
        contract_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    telemetry::init();

    let cli = Cli::parse();
    let Some(Command::Reader { contract_id }) = cli.command else {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::FAILURE;
    };

    tokio::select! {
        result = run_reader(contract_id) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report(&e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n\nExiting...");
            // A credentials prompt may still be blocked on stdin
            std::process::exit(0)
        }
    }
}

fn report(e: &anyhow::Error) {
    match e.downcast_ref::<ReaderError>() {
        Some(ReaderError::Signing(err)) => {
            eprintln!("Error signing request: {err}");
            eprintln!("Make sure your private key is valid PEM format");
        }
        _ => eprintln!("Error: {e:#}"),
    }
}

async fn run_reader(contract_id: String) -> Result<()> {
    let cfg = Config::from_env().context("Failed to load config")?;
    let contract_id = contract_id.trim().to_uppercase();

    let path = cfg.credentials_path.clone();
    let creds = tokio::task::spawn_blocking(move || FileCredentials::new(path).credentials())
        .await
        .context("credentials prompt panicked")??;

    let signer = Signer::new(&creds).map_err(ReaderError::from)?;

    println!("Fetching initial data for {contract_id}...");
    let fetcher = SnapshotFetcher::new(cfg.api_url.clone(), signer.clone())?;
    let mut store = StateStore::new(contract_id.as_str());
    store.seed(fetcher.fetch(&contract_id).await);

    let mut renderer = TerminalRenderer::stdout(contract_id.as_str());
    renderer.render(store.state(), LivenessCounter::new().symbol(), Local::now());

    let mut supervisor = ReconnectSupervisor::new(
        WsConnector::new(cfg.ws_url.as_str()),
        signer,
        cfg.ws_url.path(),
        store,
        renderer,
    )
    .with_policy(ReconnectPolicy::fixed(cfg.reconnect_delay))
    .with_recv_timeout(cfg.recv_timeout);

    match supervisor.run().await {
        Ok(never) => match never {},
        Err(e) => Err(e.into()),
    }
}
