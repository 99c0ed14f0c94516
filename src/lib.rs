//! # RAW Backfill
//!
//! 递归扫描照片目录，为没有高分辨率 JPG 的 RAW 文件批量调用外部转换程序，
//! 并按目录记录结果，中断后重新运行会跳过已成功的目录。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源（转换程序），只暴露能力
//! - `ConverterProcess` - 唯一启动子进程的地方，提供 convert() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文件或单个目录
//! - `Ledger` - 写 success / failed 列表和活动日志
//! - `ResolutionProbe` - 读取 JPG 尺寸
//! - `FileRemover` - 删除文件（dry run 时只记录）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个目录"的匹配流程
//! - `Verdict` - 单个 RAW 的判定规则
//! - `DirectoryMatcher` - 列目录 → 判定 → 递归 → 写入待转换列表
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 一次完整运行，管理并发和统计
//! - `orchestrator/directory_converter` - 单个目录的分批转换
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use infrastructure::{Converter, ConverterExit, ConverterProcess};
pub use models::{PendingWorkMap, RawFile, Resolution};
pub use orchestrator::{App, RunStats};
pub use services::Ledger;
pub use workflow::DirectoryMatcher;
