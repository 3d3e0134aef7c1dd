use anyhow::Result;
use colony_tracker::{run_sessions, TrackerConfig};
use hivewatch::config::{self, DEFAULT_CONFIG_PATH};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber; stdout may be piped, so log to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colony_tracker=info,hivewatch=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Colony tracker starting...");

    let config_path =
        std::env::var("HIVEWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let hive_config = config::load_or_default(&config_path)?;

    let mut tracker_config =
        TrackerConfig::new(&hive_config.logs.activity_path, hive_config.tracking);
    tracker_config.apply_env(|key| std::env::var(key).ok())?;

    let reader = BufReader::new(tokio::io::stdin());

    tokio::select! {
        sessions = run_sessions(reader, &tracker_config) => {
            let sessions = sessions?;
            info!(sessions, "Detector output ended");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
