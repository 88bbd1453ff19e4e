use anyhow::Result;
use sharpness_survey::utils::logging;
use sharpness_survey::{App, Config};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（出错的部分沿用默认值）
    let (config, problems) = Config::load();

    // 初始化日志
    logging::init(config.verbose_logging);
    for problem in &problems {
        error!("❌ {}，已沿用默认值", problem);
    }

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
