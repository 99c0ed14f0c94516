//! 整体运行编排 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的生命周期。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、准备日志目录、创建转换程序
//! 2. **匹配阶段**：从根目录递归匹配，生成本次运行的待转换列表
//! 3. **转换阶段**：每个目录一个任务，使用 Semaphore 限制同时转换的目录数
//! 4. **全局统计**：汇总各目录的结果，仅输出到控制台
//!
//! ## 设计特点
//!
//! - **一次运行一份状态**：待转换列表在 `run` 内创建，运行结束即丢弃
//! - **资源所有者**：唯一持有转换程序和 `Ledger` 的模块
//! - **失败隔离**：单个目录失败只写 failed 列表，不影响其它目录

use crate::config::Config;
use crate::infrastructure::{Converter, ConverterProcess};
use crate::models::{PendingWorkMap, RawFile};
use crate::orchestrator::directory_converter::{self, ConversionOutcome};
use crate::services::Ledger;
use crate::utils::logging::{log_match_complete, log_root_children, log_startup, print_final_stats};
use crate::workflow::DirectoryMatcher;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, warn};

/// 应用主结构
pub struct App<C = ConverterProcess> {
    config: Config,
    ledger: Arc<Ledger>,
    converter: Arc<C>,
}

/// 一次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// 匹配阶段记录的目录数
    pub directories: usize,
    /// 待转换 RAW 总数
    pub pending_files: usize,
    /// 转换成功的目录数
    pub converted: usize,
    /// 转换失败的目录数
    pub failed: usize,
    /// 无需转换的目录数
    pub already_complete: usize,
}

impl App<ConverterProcess> {
    /// 初始化应用，使用配置中的外部转换程序
    pub async fn initialize(config: Config) -> Result<Self> {
        let converter = ConverterProcess::new(
            config.converter.executable.clone(),
            config.converter.options.clone(),
        )
        .with_timeout(config.converter.timeout_secs.map(Duration::from_secs));

        Self::with_converter(config, converter).await
    }
}

impl<C: Converter + 'static> App<C> {
    /// 使用指定的转换程序初始化应用
    pub async fn with_converter(config: Config, converter: C) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.journal_dir)
            .await
            .with_context(|| format!("无法创建日志目录: {}", config.journal_dir.display()))?;

        log_startup(&config);

        Ok(Self {
            ledger: Arc::new(Ledger::from_config(&config)),
            converter: Arc::new(converter),
            config,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        self.journal("").await;
        self.journal("Starting...").await;

        let root = resolve_root(&self.config.photo_root_dir).await;
        log_root_children(&root).await;

        // 每次运行使用新的待转换列表
        let work_map = PendingWorkMap::new();
        DirectoryMatcher::new(&self.config, &self.ledger, &work_map)
            .match_dir(root)
            .await;

        let mut stats = RunStats {
            directories: work_map.len(),
            pending_files: work_map.pending_files(),
            ..Default::default()
        };
        log_match_complete(stats.directories, stats.pending_files);

        self.convert_all(work_map.take(), &mut stats).await?;

        self.journal("Done!").await;
        self.journal("").await;
        print_final_stats(&stats, &self.ledger);

        Ok(stats)
    }

    /// 转换所有目录，同时进行的目录数不超过 `convert_pool_size`
    async fn convert_all(
        &self,
        entries: Vec<(PathBuf, Vec<RawFile>)>,
        stats: &mut RunStats,
    ) -> Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.config.convert_pool_size));
        let mut handles = Vec::new();

        for (dir, files) in entries {
            // 空列表已在匹配阶段记为成功
            if files.is_empty() {
                stats.already_complete += 1;
                continue;
            }

            let permit = semaphore.clone().acquire_owned().await?;
            let converter = Arc::clone(&self.converter);
            let ledger = Arc::clone(&self.ledger);
            let config = self.config.clone();
            let task_dir = dir.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                directory_converter::convert_directory(
                    converter.as_ref(),
                    &ledger,
                    &task_dir,
                    &files,
                    &config,
                )
                .await
            });
            handles.push((dir, handle));
        }

        // 等待所有目录完成
        for (dir, handle) in handles {
            match handle.await {
                Ok(ConversionOutcome::Succeeded { .. }) => stats.converted += 1,
                Ok(ConversionOutcome::Failed) => stats.failed += 1,
                Err(e) => {
                    error!("[{}] 转换任务执行失败: {}", dir.display(), e);
                    if let Err(log_err) = self.ledger.record_failure(&dir).await {
                        error!("❌ 写入 failed 列表失败 ({}): {}", dir.display(), log_err);
                    }
                    stats.failed += 1;
                }
            }
        }

        Ok(())
    }

    async fn journal(&self, message: &str) {
        if let Err(e) = self.ledger.log(message).await {
            warn!("⚠️ 写入活动日志失败: {}", e);
        }
    }
}

/// 规范化根目录，之后所有目录路径都以它为前缀
///
/// 根目录不存在时原样返回，匹配阶段会把它当作空目录。
async fn resolve_root(root: &Path) -> PathBuf {
    match tokio::fs::canonicalize(root).await {
        Ok(path) => path,
        Err(e) => {
            warn!("⚠️ 根目录不存在或无法访问 {}: {}", root.display(), e);
            root.to_path_buf()
        }
    }
}
