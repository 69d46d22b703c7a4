use clap::Parser;
use facematch::cli::commands::{Cli, Commands};
use facematch::config::Settings;
use facematch::domain::error::DomainError;
use facematch::domain::values::threshold::Threshold;
use facematch::FaceMatch;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let fm = match settings_for(&cli).and_then(FaceMatch::new) {
        Ok(fm) => fm,
        Err(e) => {
            eprintln!("Error initializing facematch: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(fm, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn settings_for(cli: &Cli) -> Result<Settings, DomainError> {
    let mut settings = Settings::from_env()?;
    if let Some(dir) = &cli.gallery {
        settings.gallery_dir = dir.clone();
    }
    if let Some(kind) = &cli.extractor {
        settings.extractor = kind.parse().map_err(DomainError::InvalidInput)?;
    }
    if let Some(url) = &cli.extractor_url {
        settings.extractor_url = Some(url.clone());
    }
    if let Commands::Watch { settle_ms: Some(ms) } = &cli.command {
        settings.settle_delay = Duration::from_millis(*ms);
    }
    Ok(settings)
}

async fn run_command(fm: FaceMatch, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Verify { image, threshold } => {
            fm.load().await?;
            let bytes = tokio::fs::read(&image).await?;
            let result = match threshold {
                Some(t) => {
                    let t = Threshold::new(t)?;
                    fm.verify_with_threshold(&bytes, t).await?
                }
                None => fm.verify(&bytes).await?,
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Enroll { name, image } => {
            fm.load().await?;
            let bytes = tokio::fs::read(&image).await?;
            let enrollment = fm.enroll(&name, &bytes).await?;
            println!("{}", serde_json::to_string_pretty(&enrollment)?);
        }
        Commands::List => {
            fm.load().await?;
            println!("{}", serde_json::to_string_pretty(&fm.list())?);
        }
        Commands::Forget { name } => {
            fm.load().await?;
            let forgotten = fm.forget(&name).await?;
            println!("{}", serde_json::to_string_pretty(&forgotten)?);
        }
        Commands::Watch { .. } => {
            let report = fm.load().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            let watcher = fm.watch()?;
            tokio::signal::ctrl_c().await?;
            let health = watcher.health();
            watcher.shutdown().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
    }
    Ok(())
}
