//! b10-cfgmgr - Main entry point
//!
//! stdin/stdout 세션 위에서 설정 매니저를 돌린다. 로그는 stderr로 나간다.

use anyhow::Context;
use cfgmgr_core::ConfigManager;
use cfgmgr_foundation::{ManagerSettings, ModuleSpec, StdioSession, SETTINGS_FILE};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// b10-cfgmgr - configuration manager
#[derive(Parser, Debug)]
#[command(name = "b10-cfgmgr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the configuration database
    #[arg(long)]
    data_path: Option<PathBuf>,

    /// Configuration database file name
    #[arg(long)]
    db_file: Option<String>,

    /// Channel the manager listens on
    #[arg(long)]
    channel: Option<String>,

    /// Channel of the supervising process
    #[arg(long)]
    boss_channel: Option<String>,

    /// Seconds to wait for a module to answer a config update
    #[arg(long)]
    ack_timeout: Option<u64>,

    /// Module spec file to register at startup (repeatable)
    #[arg(long = "spec", value_name = "FILE")]
    specs: Vec<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// 설정 파일 → CLI 플래그 순으로 덮어쓴 실행 설정
    fn settings(&self) -> cfgmgr_foundation::Result<ManagerSettings> {
        let mut settings = match &self.config {
            Some(path) => ManagerSettings::load(path)?,
            None => ManagerSettings::load_or_default(SETTINGS_FILE)?,
        };

        if let Some(path) = &self.data_path {
            settings = settings.data_path(path);
        }
        if let Some(name) = &self.db_file {
            settings = settings.db_filename(name);
        }
        if let Some(channel) = &self.channel {
            settings = settings.manager_channel(channel);
        }
        if let Some(channel) = &self.boss_channel {
            settings = settings.boss_channel(channel);
        }
        if let Some(secs) = self.ack_timeout {
            settings = settings.ack_timeout_secs(secs);
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stdout은 세션 프레임 전용)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let settings = args.settings().context("Invalid settings")?;
    info!(
        data_path = %settings.data_path.display(),
        channel = %settings.manager_channel,
        "Starting b10-cfgmgr"
    );

    let session = Arc::new(StdioSession::spawn());
    let mut cm = ConfigManager::new(settings, session)
        .await
        .context("Failed to create config manager")?;

    for path in &args.specs {
        let spec = ModuleSpec::from_file(path)
            .with_context(|| format!("Failed to load module spec {}", path.display()))?;
        info!(module = %spec.module_name(), "Preloaded module spec");
        cm.set_module_spec(spec)?;
    }

    // Ctrl-C → 루프 종료
    let shutdown = cm.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, shutting down");
                shutdown.shutdown();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    if let Err(e) = cm.start().await {
        if e.is_repairable() {
            error!("Config database is corrupt, repair or move it aside: {}", e);
        } else if e.is_fatal_at_startup() {
            error!("Unable to read configuration: {}", e);
        }
        return Err(e).context("Config manager stopped with an error");
    }

    Ok(())
}
