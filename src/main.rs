use anyhow::Result;
use gallery_sync::{commands, config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // --- Parse config + command ---
    let (cfg, command) = config::AppConfig::from_env_and_args()?;
    tracing::debug!(
        "Running {:?} against {} and {}",
        command,
        cfg.gallery_json.display(),
        cfg.database_url
    );

    let report = commands::dispatch(&cfg, command).await?;
    println!("{report}");

    Ok(())
}
