use anyhow::Context;
use spot_server::{Config, Server, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 环境与配置
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. 日志
    spot_server::init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "Spot server starting"
    );

    // 3. 初始化服务器状态
    let state = ServerState::initialize(&config)
        .await
        .context("Server state initialization failed")?;

    // 4. 启动 HTTP 服务器
    let server = Server::with_state(config, state);
    server.run().await
}
