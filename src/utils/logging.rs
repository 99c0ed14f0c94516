//! 日志工具模块
//!
//! 控制台日志初始化和输出格式的辅助函数

use crate::config::Config;
use crate::orchestrator::RunStats;
use crate::services::Ledger;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化控制台日志
///
/// 默认级别 `info`，可用 `RUST_LOG` 覆盖。重复调用无副作用。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - RAW 批量转换");
    info!("📁 根目录: {}", config.photo_root_dir.display());
    info!(
        "📊 匹配并发数: {} | 转换并发数: {} | 每批文件数: {}",
        config.match_pool_size, config.convert_pool_size, config.chunk_size
    );
    info!("📐 低分辨率阈值: {}px", config.low_res_threshold);
    if config.dry_run {
        info!("🧪 dry run：不删除文件，不调用转换程序");
    }
    info!("{}", "=".repeat(60));
}

/// 列出根目录下的子目录（仅用于显示）
pub async fn log_root_children(root: &Path) {
    let Ok(mut entries) = tokio::fs::read_dir(root).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            info!("{}", entry.path().display());
        }
    }
}

/// 记录匹配阶段完成信息
///
/// # 参数
/// - `directories`: 记录的目录数
/// - `pending_files`: 待转换 RAW 总数
pub fn log_match_complete(directories: usize, pending_files: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 匹配完成: {} 个目录, {} 个 RAW 待转换", directories, pending_files);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, ledger: &Ledger) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 转换成功: {} 个目录", stats.converted);
    info!("❌ 转换失败: {} 个目录", stats.failed);
    info!("⏭️ 无需转换: {} 个目录", stats.already_complete);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", ledger.activity_log_path().display());
}
