use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use boxoffice::config::{Config, ReportFormat};
use boxoffice::engine::{Inventory, SystemClock};
use boxoffice::harness::{default_clients, Harness, NoDelay, PreRequestDelay, RandomJitter, TaskRegistry};
use boxoffice::{monitor, observability, report};

fn log_states(label: &str, registry: &TaskRegistry) {
    for (name, status) in registry.snapshot() {
        info!("{label}: {name} -> {}", status.as_str());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    observability::init(config.metrics_port)?;

    let clock = SystemClock::new(config.utc_offset);
    let inventory = Arc::new(Inventory::new(config.capacity, config.acquire_timeout)?);

    let started_at = Utc::now().with_timezone(&config.utc_offset);
    println!(
        "{}",
        report::render_banner(&started_at.format("%Y-%m-%d %H:%M %:z").to_string(), config.capacity)
    );
    info!("  acquire_timeout: {:?}", config.acquire_timeout);
    info!("  jitter: {}", if config.jitter { "enabled" } else { "disabled" });
    info!(
        "  metrics: {}",
        config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let delay: Arc<dyn PreRequestDelay> = if config.jitter {
        Arc::new(RandomJitter::default())
    } else {
        Arc::new(NoDelay)
    };
    let cancel = CancellationToken::new();
    let mut harness = Harness::new(
        inventory.clone(),
        Arc::new(clock),
        delay,
        default_clients(),
        cancel.clone(),
    );
    let registry = harness.registry();
    log_states("initial", &registry);

    let monitor_stop = CancellationToken::new();
    let monitor = tokio::spawn(monitor::run_monitor(
        registry.clone(),
        config.monitor_interval,
        monitor_stop.clone(),
    ));

    harness.start();
    log_states("after start", &registry);

    // Ctrl-C cancels in-flight clients; they roll back and report Cancelled.
    let interrupt = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling clients");
            interrupt.cancel();
        }
    });

    let results = harness.join().await;
    ctrl_c.abort();
    monitor_stop.cancel();
    let snapshots = monitor.await?;
    info!("monitor took {snapshots} snapshots");
    log_states("final", &registry);

    let remaining = inventory.remaining_capacity();
    match config.report {
        ReportFormat::Text => println!("{}", report::render_summary(&results, remaining)),
        ReportFormat::Json => println!("{}", report::render_json(&results, remaining)?),
    }
    Ok(())
}
