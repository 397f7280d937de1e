use anyhow::{anyhow, Context, Result};
use speedguard::api::create_api_router;
use speedguard::config::AppConfig;
use speedguard::registry::Registry;
use speedguard::scheduler::start_recovery_scheduler;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal speedguard error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;
    let api_addr = config.socket_addr()?;

    let registry = Arc::new(Registry::from_config(&config).context("initialize registry")?);

    let app = App {
        config: Arc::new(config),
        registry,
    };
    app.run(api_addr).await
}

struct App {
    config: Arc<AppConfig>,
    registry: Arc<Registry>,
}

impl App {
    async fn run(self, api_addr: std::net::SocketAddr) -> Result<()> {
        info!(
            address = %api_addr,
            unknown_vehicle_class = ?self.config.unknown_vehicle_class,
            recovery_every_secs = self.config.recovery_interval().as_secs(),
            "SpeedGuard service online"
        );

        let recovery_handle =
            start_recovery_scheduler(self.registry.clone(), self.config.recovery_interval());

        let listener = tokio::net::TcpListener::bind(&api_addr)
            .await
            .with_context(|| format!("bind API server address {api_addr}"))?;
        let api_router = create_api_router(self.registry.clone());

        info!(address = %api_addr, "HTTP API server starting");
        let api_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, api_router).await {
                warn!(error = %e, "API server error");
            }
        });

        let mut ticker = tokio::time::interval(self.config.heartbeat_interval());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let counts = self.registry.counts().await;
                    info!(
                        vehicles = counts.vehicles,
                        drivers = counts.drivers,
                        violations = counts.violations,
                        pending = counts.pending,
                        "SpeedGuard heartbeat"
                    );
                }
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        warn!(error = %err, "ctrl_c listener error");
                    }
                    info!("Shutdown signal received, exiting");
                    break;
                }
            }
        }

        recovery_handle.abort();
        api_handle.abort();
        Ok(())
    }
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
