//! Swarm Registrator - Docker Swarm to Consul service registration.
//!
//! This is the entry point for the `swarm-registrator` binary. It connects to
//! Consul, subscribes to the Docker service event feed and reconciles every
//! event until it receives SIGINT or SIGTERM.
//!
//! Exits non-zero if Consul cannot be reached at startup or the event feed
//! ends, so a supervisor can restart it.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swarm_registrator::{Reconciler, RegistratorConfig, DEFAULT_REQUEST_TIMEOUT_SECS};
use swarm_registrator_docker::{DockerClient, Orchestrator, DEFAULT_DOCKER_HOST};
use swarm_registrator_store::ConsulStore;

/// Swarm Registrator - mirror Swarm service ports into Consul.
#[derive(Parser, Debug)]
#[command(name = "swarm-registrator")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Consul address, `consul://host[:port]` (default `localhost:8500`).
    #[arg(env = "CONSUL_URL")]
    consul_url: Option<String>,

    /// Docker Engine API address, `unix://<socket>` or `tcp://host:port`.
    #[arg(long, env = "DOCKER_HOST", default_value = DEFAULT_DOCKER_HOST)]
    docker_host: String,

    /// Timeout in seconds for Consul calls and service inspections.
    #[arg(
        long,
        env = "REGISTRATOR_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,swarm_registrator=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Swarm Registrator");

    let config = RegistratorConfig::from_args(
        args.consul_url.as_deref(),
        &args.docker_host,
        args.request_timeout,
    )
    .context("invalid configuration")?;

    tracing::info!(
        consul = %config.consul,
        docker_host = %config.docker_host,
        request_timeout_secs = config.request_timeout.as_secs(),
        "Loaded configuration"
    );

    // Consul must be reachable before any event is consumed
    let store = ConsulStore::new(&config.consul, config.request_timeout)?;
    store
        .ping()
        .await
        .with_context(|| format!("cannot connect to Consul at {}", config.consul))?;
    tracing::info!(consul = %config.consul, "Connected to Consul");

    let docker = Arc::new(DockerClient::new(&config.docker_host, config.request_timeout)?);
    let events = docker
        .events()
        .await
        .context("failed to subscribe to Docker service events")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let reconciler = Reconciler::new(Arc::new(store), docker);
    reconciler.run(events, shutdown_rx).await?;

    tracing::info!("Swarm Registrator stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for SIGTERM, only handling Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
