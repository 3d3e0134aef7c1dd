use anyhow::{Context, Result};
use futures::FutureExt;
use hivewatch::alerting::{AlertEngine, CameraVerifier};
use hivewatch::config::{self, DEFAULT_CONFIG_PATH};
use hivewatch::logs::{ActivityLog, HealthLog};
use hivewatch::maintenance::{FlushHook, MaintenanceHandler};
use hivewatch::monitor::{HiveMonitor, SensorLoop};
use hivewatch::remote;
use hivewatch::sensor::SensorSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hivewatch=info".into()),
        )
        .init();

    info!("Hivewatch starting...");

    let config_path =
        std::env::var("HIVEWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = config::load_or_default(&config_path)?;

    info!(
        user_id = %config.hive.user_id,
        hive_id = %config.hive.hive_id,
        activity_log = %config.logs.activity_path.display(),
        health_log = %config.logs.health_path.display(),
        "Configuration loaded"
    );

    let health_log = HealthLog::new(&config.logs.health_path);
    health_log
        .ensure_exists()
        .context("Failed to initialize health log")?;

    let store = remote::from_config(&config.remote, &config.hive)?;

    let monitor = Arc::new(HiveMonitor::new(
        SensorSource::open(&config.sensor),
        ActivityLog::new(&config.logs.activity_path),
        health_log,
        Arc::clone(&store),
    ));

    let verifier = CameraVerifier::new(
        config.verification.clone(),
        ActivityLog::new(&config.logs.verification_path),
    );
    let engine = Arc::new(AlertEngine::new(
        config.alerts.rules.clone(),
        Arc::new(verifier),
    ));

    // Maintenance flush: rescore, persist, push
    let flush: FlushHook = {
        let monitor = Arc::clone(&monitor);
        Arc::new(move || {
            let monitor = Arc::clone(&monitor);
            async move { monitor.flush().await }.boxed()
        })
    };
    let maintenance = Arc::new(MaintenanceHandler::from_config(&config.maintenance, flush));

    let watcher_handle = maintenance.spawn_watcher(Duration::from_millis(
        config.maintenance.sample_interval_ms,
    ));
    let manual_handle = if maintenance.is_degraded() && config.maintenance.manual_control {
        info!("Manual maintenance control: type 'on', 'off' or 'q'");
        Some(tokio::spawn(manual_control(Arc::clone(&maintenance))))
    } else {
        None
    };

    let sensor_loop = SensorLoop::new(
        Arc::clone(&monitor),
        engine,
        config.sensor.clone(),
        config.hive.hive_id.clone(),
    );
    let loop_handle = tokio::spawn(async move {
        if let Err(e) = sensor_loop.run_sensor_loop().await {
            error!(error = %e, "Sensor loop stopped");
        }
    });

    // Wait for shutdown: ctrl-c, or 'q' on the manual console
    match manual_handle {
        Some(mut manual) => {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for ctrl_c signal")?;
                    manual.abort();
                }
                _ = &mut manual => info!("Quit requested"),
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for ctrl_c signal")?;
        }
    }
    info!("Shutdown signal received");

    // Graceful shutdown
    loop_handle.abort();
    if let Some(handle) = watcher_handle {
        handle.abort();
    }
    maintenance.release();
    info!("Hivewatch stopped");

    Ok(())
}

/// Drive the maintenance state machine from stdin until 'q' or EOF
async fn manual_control(maintenance: Arc<MaintenanceHandler>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                // Detached stdin: keep running until ctrl-c
                std::future::pending::<()>().await;
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read manual control input");
                return std::future::pending::<()>().await;
            }
        };

        match line.trim().to_ascii_lowercase().as_str() {
            "on" => {
                info!("Simulating maintenance switch closed");
                maintenance.activate().await;
            }
            "off" => {
                info!("Simulating maintenance switch opened");
                maintenance.deactivate().await;
            }
            "q" => return,
            "" => {}
            other => warn!(input = %other, "Unknown command, expected 'on', 'off' or 'q'"),
        }
    }
}
