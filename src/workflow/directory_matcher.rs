//! 目录匹配流程 - 流程层
//!
//! 核心职责：决定一个目录里每个文件的去向，并递归处理子目录
//!
//! 流程顺序：
//! 1. 列出目录（失败视为空目录，直接返回）
//! 2. 检查 success 列表（已成功的目录只递归，不再判定 RAW）
//! 3. 并发处理每个条目：子目录 → 递归；RAW → 找同名 JPG 并判定；xmp → 可选删除
//! 4. 等待全部条目完成后写入待转换列表，空列表直接记为成功
//!
//! 不调用转换程序。

use crate::config::Config;
use crate::error::MatchingError;
use crate::models::{is_sidecar, PendingWorkMap, RawFile};
use crate::services::{FileRemover, Ledger, ResolutionProbe};
use crate::workflow::verdict::Verdict;
use futures::future::{join_all, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::fs::FileType;
use std::path::{Path, PathBuf};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// 目录条目
#[derive(Debug)]
struct DirEntryInfo {
    path: PathBuf,
    is_dir: bool,
}

/// 目录匹配器
///
/// - 只在一次运行内存在，借用本次运行的 `Ledger` 和 `PendingWorkMap`
/// - 读取 JPG 尺寸、删除文件这类阻塞操作受 `match_pool_size` 限制
/// - 递归本身不占并发名额，父目录等待所有子目录完成后才返回
pub struct DirectoryMatcher<'a> {
    ledger: &'a Ledger,
    work_map: &'a PendingWorkMap,
    probe: ResolutionProbe,
    remover: FileRemover,
    permits: Semaphore,
    low_res_threshold: u32,
    delete_raw_on_high_res_jpg: bool,
    delete_xmp_files: bool,
}

impl<'a> DirectoryMatcher<'a> {
    pub fn new(config: &Config, ledger: &'a Ledger, work_map: &'a PendingWorkMap) -> Self {
        Self {
            ledger,
            work_map,
            probe: ResolutionProbe::new(),
            remover: FileRemover::new(config.dry_run),
            permits: Semaphore::new(config.match_pool_size),
            low_res_threshold: config.low_res_threshold,
            delete_raw_on_high_res_jpg: config.delete_raw_on_high_res_jpg,
            delete_xmp_files: config.delete_xmp_files,
        }
    }

    /// 匹配目录及其全部子目录
    ///
    /// 错误在目录内部处理（记入 failed 列表），不会向上传播。
    pub fn match_dir(&self, dir: PathBuf) -> BoxFuture<'_, ()> {
        async move {
            info!("📂 正在处理目录: {}", dir.display());

            let entries = match list_entries(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("目录不存在或无法读取 {}: {}", dir.display(), e);
                    return;
                }
            };

            match self.match_entries(&dir, &entries).await {
                Ok(pending) => self.finish(dir, pending).await,
                Err(e) => self.fail(&dir, &e).await,
            }
        }
        .boxed()
    }

    async fn match_entries(
        &self,
        dir: &Path,
        entries: &[DirEntryInfo],
    ) -> Result<Vec<RawFile>, MatchingError> {
        let skip = self.ledger.is_succeeded(dir).await?;
        if skip {
            info!("⏭️ 跳过目录 [之前已成功]: {}", dir.display());
        }

        let siblings: HashSet<&Path> = entries.iter().map(|e| e.path.as_path()).collect();

        let outcomes = join_all(
            entries
                .iter()
                .map(|entry| self.match_entry(entry, &siblings, skip)),
        )
        .await;

        let mut pending = Vec::new();
        for outcome in outcomes {
            if let Some(raw) = outcome? {
                pending.push(raw);
            }
        }
        Ok(pending)
    }

    async fn match_entry(
        &self,
        entry: &DirEntryInfo,
        siblings: &HashSet<&Path>,
        skip: bool,
    ) -> Result<Option<RawFile>, MatchingError> {
        if entry.is_dir {
            self.match_dir(entry.path.clone()).await;
            return Ok(None);
        }

        if !skip {
            if let Some(raw) = RawFile::from_path(entry.path.clone()) {
                return self.match_raw(raw, siblings).await;
            }
        }

        if self.delete_xmp_files && is_sidecar(&entry.path) {
            let _permit = self.permits.acquire().await?;
            self.remover.remove(&entry.path, "xmp").await;
        }
        Ok(None)
    }

    /// 判定单个 RAW，返回 `Some` 表示需要转换
    async fn match_raw(
        &self,
        raw: RawFile,
        siblings: &HashSet<&Path>,
    ) -> Result<Option<RawFile>, MatchingError> {
        let candidate = raw
            .rendered_candidates()
            .into_iter()
            .find(|candidate| siblings.contains(candidate.path()));

        // 读尺寸和删除 RAW 都在名额内进行
        let _permit = if candidate.is_some() {
            Some(self.permits.acquire().await?)
        } else {
            None
        };

        let probed = match &candidate {
            Some(candidate) => {
                let probe = self.probe;
                let path = candidate.path().to_path_buf();
                Some(tokio::task::spawn_blocking(move || probe.probe(&path)).await?)
            }
            None => None,
        };
        let jpg_name = candidate.map(|c| c.file_name()).unwrap_or_default();

        let verdict = Verdict::classify(probed, self.low_res_threshold);
        match &verdict {
            Verdict::NoRenderedImage => {
                info!("🆕 未找到已有 JPG - {}", raw.file_name());
            }
            Verdict::Unreadable(e) => {
                warn!("⚠️ 读取已有 JPG 出错: {} - {}", raw.file_name(), e);
            }
            Verdict::LowResolution(resolution) => {
                info!(
                    "🔍 已有 JPG 分辨率过低 - {} - {} [{}]",
                    raw.file_name(),
                    jpg_name,
                    resolution
                );
            }
            Verdict::HighResolution(resolution) => {
                info!(
                    "✓ 已有 JPG - {} - {} [{}]",
                    raw.file_name(),
                    jpg_name,
                    resolution
                );
                if self.delete_raw_on_high_res_jpg {
                    self.remover
                        .remove(raw.path(), "RAW [已有高分辨率 JPG]")
                        .await;
                }
            }
        }

        Ok(verdict.needs_conversion().then_some(raw))
    }

    async fn finish(&self, dir: PathBuf, pending: Vec<RawFile>) {
        let nothing_to_do = pending.is_empty();
        if !nothing_to_do {
            info!("📋 [{}] 待转换 RAW: {} 个", dir.display(), pending.len());
        }

        self.work_map.insert(dir.clone(), pending);

        if nothing_to_do {
            let message = format!("SUCCESS: {} [no files converted]", dir.display());
            if let Err(e) = self.ledger.log(&message).await {
                error!("❌ 写入活动日志失败: {}", e);
            }
            if let Err(e) = self.ledger.record_success(&dir).await {
                error!("❌ 写入 success 列表失败 ({}): {}", dir.display(), e);
            }
        }
    }

    async fn fail(&self, dir: &Path, e: &MatchingError) {
        error!("❌ 匹配 JPG 时出错 {} [message: {}]", dir.display(), e);

        let message = format!(
            "ERROR: Unable to match JPG in {} [message: {}]",
            dir.display(),
            e
        );
        if let Err(log_err) = self.ledger.log(&message).await {
            error!("❌ 写入活动日志失败: {}", log_err);
        }
        if let Err(log_err) = self.ledger.record_failure(dir).await {
            error!("❌ 写入 failed 列表失败 ({}): {}", dir.display(), log_err);
        }
    }
}

/// 列出目录条目，按路径排序
///
/// 不跟随符号链接。
async fn list_entries(dir: &Path) -> std::io::Result<Vec<DirEntryInfo>> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let file_type = entry.file_type().await;
        entries.extend(entry_info(entry.path(), file_type));
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// 扫描期间被删除的条目直接跳过，不影响兄弟条目
fn entry_info(path: PathBuf, file_type: std::io::Result<FileType>) -> Option<DirEntryInfo> {
    match file_type {
        Ok(file_type) => Some(DirEntryInfo {
            path,
            is_dir: file_type.is_dir(),
        }),
        Err(e) => {
            debug!("跳过无法读取类型的条目 {}: {}", path.display(), e);
            None
        }
    }
}
