use store_monitor::{Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志) 并加载配置
    let config = setup_environment();

    tracing::info!(
        environment = %config.environment,
        database = %config.database_path,
        default_timezone = %config.default_timezone,
        "Store monitor starting..."
    );

    // 2. 初始化服务器状态 (配置校验、目录、数据库)
    let state = ServerState::initialize(&config).await?;

    // 3. 启动 HTTP 服务器 (Server::run 会启动后台任务)
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
