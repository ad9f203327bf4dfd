//! Vigor Admin - command-line host
//!
//! Wires the configuration, the reqwest transport and the file-backed
//! session into an admin client, then runs one command against it.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use commands::Command;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vigor_application::AdminClient;
use vigor_domain::{ResumeLocation, SessionEvent};
use vigor_infrastructure::{
    ClientConfig, FileStore, HostNavigator, ReqwestTransport, SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "vigor-admin")]
#[command(about = "Command-line host for the Vigor Bikes admin API")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Screen this command stands for, e.g. `/users/123?tab=orders`.
    /// Remembered if the session expires while the command runs.
    #[arg(long, global = true)]
    location: Option<ResumeLocation>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref())?;

    let navigator = HostNavigator::new();
    if let Some(location) = cli.location {
        navigator.set(location);
    }

    let transport = ReqwestTransport::new(&config.base_url()?, &config.api_version, &config.user_agent)?;
    let client = AdminClient::builder(Arc::new(transport), Arc::new(SystemClock::new()))
        .storage(Arc::new(FileStore::new(&config.storage_path)))
        .navigator(Arc::new(navigator))
        .token_ttl(config.token_ttl())
        .resume_ttl(config.resume_ttl())
        .settings(config.client_settings())
        .build();

    tracing::debug!(base_url = %config.base_url, storage = %config.storage_path.display(), "client ready");

    let mut events = client.subscribe();
    let result = cli.command.execute(&client).await;

    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Expired { resume, reason } = event {
            eprintln!("Session expired: {reason}");
            eprintln!("Log in again with `vigor-admin login <email>`.");
            if let Some(resume) = resume {
                eprintln!("You will be returned to {resume} after login.");
            }
        }
    }

    result
}
