//! taskfold - command line entry point
//!
//! Runs one goal through the orchestrator and prints the run report as JSON.

use std::sync::Arc;

use taskfold::{
    config::Config,
    llm::HttpOracle,
    oracle::{OracleRef, TimeoutOracle},
    LogSink, Orchestrator,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskfold=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let goal = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if goal.trim().is_empty() {
        anyhow::bail!("usage: taskfold <goal>");
    }

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, workers={}",
        config.oracle.model, config.orchestrator.worker_count
    );

    let timeout = config.oracle.timeout;
    let http: OracleRef = Arc::new(HttpOracle::new(config.oracle));
    let oracle: OracleRef = Arc::new(TimeoutOracle::new(http, timeout));
    let orchestrator =
        Orchestrator::new(oracle, config.orchestrator).with_sink(Arc::new(LogSink));

    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            on_signal.cancel();
        }
    });

    let outcome = orchestrator.run_root_with_cancel(goal, token).await?;
    info!("Task hierarchy:\n{}", outcome.tree.render_hierarchy());
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}
