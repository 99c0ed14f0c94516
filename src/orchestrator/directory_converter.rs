//! 单个目录转换器 - 编排层
//!
//! ## 职责
//!
//! 把一个目录的待转换 RAW 分批交给转换程序，并记录结果。
//!
//! ## 核心功能
//!
//! 1. **分批**：按 `chunk_size` 切分，逐批同步调用
//! 2. **失败即停**：任一批失败，剩余批次不再调用，整个目录记为失败
//! 3. **清理**：全部成功后可选删除原 RAW（失败时一个都不删）
//! 4. **记录**：写 success / failed 列表和活动日志
//!
//! 已经成功写出的批次不会回滚。

use crate::config::Config;
use crate::error::ConversionError;
use crate::infrastructure::Converter;
use crate::models::RawFile;
use crate::services::{FileRemover, Ledger};
use std::path::Path;
use tracing::{error, info, warn};

/// 目录转换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// 全部批次完成（`converted` 为 0 表示无需转换）
    Succeeded { converted: usize },
    /// 某一批失败
    Failed,
}

/// 按固定大小切分待转换列表
pub fn partition(files: &[RawFile], chunk_size: usize) -> std::slice::Chunks<'_, RawFile> {
    files.chunks(chunk_size.max(1))
}

/// 转换单个目录
///
/// # 参数
/// - `converter`: 转换程序
/// - `ledger`: 记录服务
/// - `dir`: 目录
/// - `files`: 该目录的待转换 RAW
/// - `config`: 配置
///
/// # 返回
/// 返回转换结果。所有错误都在目录内部处理，不会向上传播。
pub async fn convert_directory<C: Converter>(
    converter: &C,
    ledger: &Ledger,
    dir: &Path,
    files: &[RawFile],
    config: &Config,
) -> ConversionOutcome {
    if files.is_empty() {
        journal(ledger, &format!("SUCCESS: {} [no files converted]", dir.display())).await;
        record(ledger, dir, ConversionOutcome::Succeeded { converted: 0 }).await;
        return ConversionOutcome::Succeeded { converted: 0 };
    }

    info!("🔄 待转换 RAW 数量 [{}]: {}", dir.display(), files.len());

    let outcome = match run_chunks(converter, dir, files, config).await {
        Ok(()) => {
            if config.delete_raw_after_convert {
                let remover = FileRemover::new(config.dry_run);
                for raw in files {
                    remover.remove(raw.path(), "RAW").await;
                }
            }
            info!("✅ 目录转换完成: {} [{} 个文件]", dir.display(), files.len());
            journal(
                ledger,
                &format!("SUCCESS: {} [files: {}]", dir.display(), files.len()),
            )
            .await;
            ConversionOutcome::Succeeded {
                converted: files.len(),
            }
        }
        Err(e) => {
            error!("❌ 处理目录出错 {} [message: {}]", dir.display(), e);
            journal(ledger, &format!("ERROR: {} [message: {}]", dir.display(), e)).await;
            ConversionOutcome::Failed
        }
    };

    record(ledger, dir, outcome).await;
    outcome
}

/// 逐批调用转换程序，遇到第一个错误即返回
async fn run_chunks<C: Converter>(
    converter: &C,
    dir: &Path,
    files: &[RawFile],
    config: &Config,
) -> Result<(), ConversionError> {
    let total_chunks = files.len().div_ceil(config.chunk_size.max(1));

    for (index, chunk) in partition(files, config.chunk_size).enumerate() {
        let chunk_num = index + 1;

        if config.dry_run {
            info!(
                "📦 [dry run] 跳过第 {}/{} 批 ({} 个文件) [{}]",
                chunk_num,
                total_chunks,
                chunk.len(),
                dir.display()
            );
            continue;
        }

        info!(
            "📦 开始转换第 {}/{} 批 ({} 个文件) [{}]",
            chunk_num,
            total_chunks,
            chunk.len(),
            dir.display()
        );

        let exit = converter.convert(chunk).await?;
        if !exit.success {
            if config.converter.fail_on_nonzero_exit {
                return Err(ConversionError::ConverterReported { code: exit.code });
            }
            warn!(
                "⚠️ 转换程序退出码非零 (退出码: {:?}) [{}] 第 {} 批",
                exit.code,
                dir.display(),
                chunk_num
            );
        }
    }

    Ok(())
}

async fn journal(ledger: &Ledger, message: &str) {
    if let Err(e) = ledger.log(message).await {
        error!("❌ 写入活动日志失败: {}", e);
    }
}

async fn record(ledger: &Ledger, dir: &Path, outcome: ConversionOutcome) {
    let result = match outcome {
        ConversionOutcome::Succeeded { .. } => ledger.record_success(dir).await,
        ConversionOutcome::Failed => ledger.record_failure(dir).await,
    };
    if let Err(e) = result {
        error!("❌ 记录目录结果失败 ({}): {}", dir.display(), e);
    }
}
