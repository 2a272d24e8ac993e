//! Garden Monitor - command line entry point
//!
//! One-shot: run every check once, print the report, exit 0 only when the
//! system is HEALTHY. Continuous: repeat every `--interval` seconds until
//! Ctrl+C. Reports go to stdout, logs to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use garden_monitor::{render, HealthEvaluator, HubClient, MonitorConfig, MqttProbe, ReportFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "garden-monitor", version)]
#[command(about = "Garden Automation System Monitor")]
struct Args {
    /// Home Assistant URL
    #[arg(long, env = "GARDEN_MONITOR_HA_URL")]
    ha_url: Option<String>,

    /// Home Assistant long-lived access token
    #[arg(long, env = "GARDEN_MONITOR_HA_TOKEN", hide_env_values = true)]
    ha_token: Option<String>,

    /// Run continuously
    #[arg(long)]
    continuous: bool,

    /// Check interval in seconds (default: 300)
    #[arg(long)]
    interval: Option<u64>,

    /// Output JSON format
    #[arg(long)]
    json: bool,

    /// YAML configuration file (entity lists, thresholds, broker settings)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// MQTT broker host
    #[arg(long, env = "GARDEN_MONITOR_MQTT_HOST")]
    mqtt_host: Option<String>,

    /// MQTT broker port
    #[arg(long, env = "GARDEN_MONITOR_MQTT_PORT")]
    mqtt_port: Option<u16>,

    /// MQTT username
    #[arg(long, env = "GARDEN_MONITOR_MQTT_USERNAME")]
    mqtt_username: Option<String>,

    /// MQTT password
    #[arg(long, env = "GARDEN_MONITOR_MQTT_PASSWORD", hide_env_values = true)]
    mqtt_password: Option<String>,
}

impl Args {
    /// Command line values win over the config file.
    fn apply(self, config: &mut MonitorConfig) {
        if let Some(url) = self.ha_url {
            config.hub.url = url;
        }
        if let Some(token) = self.ha_token {
            config.hub.token = token;
        }
        if let Some(interval) = self.interval {
            config.interval_secs = Some(interval);
        }
        if let Some(host) = self.mqtt_host {
            config.broker.host = host;
        }
        if let Some(port) = self.mqtt_port {
            config.broker.port = port;
        }
        if let Some(user) = self.mqtt_username {
            config.broker.username = Some(user);
        }
        if let Some(pass) = self.mqtt_password {
            config.broker.password = Some(pass);
        }
    }
}

type Evaluator = HealthEvaluator<HubClient, MqttProbe>;

async fn run_checks(evaluator: &Evaluator, format: ReportFormat) -> Result<garden_monitor::HealthReport> {
    info!("Starting system health check...");
    let report = evaluator.evaluate().await;
    let rendered = render(&report, format).context("Failed to render health report")?;
    println!("\n{rendered}");
    Ok(report)
}

async fn run_continuous(evaluator: &Evaluator, format: ReportFormat) -> Result<()> {
    let interval = Duration::from_secs(evaluator.config().interval_secs());
    info!("Running in continuous mode (Ctrl+C to stop)");

    let (stop_tx, mut stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = stop_tx.send(true);
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    loop {
        run_checks(evaluator, format).await?;

        // An interrupt during the cycle is honoured once its report is out
        if *stop_rx.borrow() {
            break;
        }

        info!("Next check in {} seconds...", interval.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            Ok(()) = stop_rx.changed() => break,
        }
    }

    info!("Monitoring stopped by user.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("garden_monitor=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let continuous = args.continuous;
    let format = if args.json { ReportFormat::Json } else { ReportFormat::Text };

    let mut config = MonitorConfig::load(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let hub = HubClient::new(&config.hub).context("Failed to create Home Assistant client")?;
    let broker = MqttProbe::new(config.broker.clone());
    let evaluator = HealthEvaluator::new(config, hub, broker);

    if continuous {
        run_continuous(&evaluator, format).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = run_checks(&evaluator, format).await?;
    Ok(if report.is_healthy() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
