use anyhow::{Context, Result};
use raw_backfill::utils::logging;
use raw_backfill::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
