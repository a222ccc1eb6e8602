use anyhow::Result;
use clap::Parser;

use sysrelay_core::config::SysrelayConfig;
use sysrelay_daemon::cli::DaemonCli;
use sysrelay_daemon::logging::init_tracing;
use sysrelay_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 설정 로드 (파일 -> 환경변수 -> CLI 순으로 우선순위 적용)
    let mut config = SysrelayConfig::from_file(&cli.config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {}", cli.config.display(), e))?;
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    if cli.validate {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "sysrelay-daemon starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config).await?;
    orchestrator.run().await?;

    tracing::info!("sysrelay-daemon shut down");
    Ok(())
}
