use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arm_relay::config::servo_map;
use arm_relay::core::control;
use arm_relay::utils::{logger, validation::Validate};
use arm_relay::{HttpActuator, ModelAdapter, RelayConfig, RelayServer, RelayService, ServoMap};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose);

    tracing::info!("Starting arm-relay");
    if config.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    // 模型與 scaler 只載入一次,之後所有連線共用
    let adapter = ModelAdapter::load(&config.model_dir)?;
    tracing::info!("Model loaded from {}", config.model_dir.display());

    let servo_map = match &config.servo_map {
        Some(path) => {
            let map = servo_map::load_servo_map(path)?;
            tracing::info!("Servo calibration loaded from {}", path.display());
            map
        }
        None => ServoMap::default(),
    };

    let actuator = HttpActuator::new(
        config.actuator_url(),
        Duration::from_millis(config.actuator_timeout_ms),
    )?;
    tracing::info!("Actuator endpoint: {}", actuator.endpoint());

    let relay = Arc::new(RelayService::new(adapter, actuator, servo_map));
    let stats = relay.stats();

    // 控制端點跑在資料路徑之外
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let control_addr = SocketAddr::from(([0, 0, 0, 0], config.control_port));
    let control_task = tokio::spawn(control::run_control_server(control_addr, stats, shutdown_rx));

    let ws_addr = SocketAddr::from(([0, 0, 0, 0], config.ws_port));
    let server = RelayServer::bind(ws_addr, relay).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                tracing::error!("❌ Relay server failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, shutting down");
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = control_task.await;

    Ok(())
}
