//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 整体运行编排
//! - 管理应用生命周期（初始化、运行）
//! - 从根目录启动匹配，生成待转换列表
//! - 控制同时转换的目录数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `directory_converter` - 单个目录转换器
//! - 把一个目录的 RAW 分批交给转换程序
//! - 失败即停，记录 success / failed
//! - 可选删除已转换的 RAW
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理整棵目录树)
//!     ↓                         ↓
//! workflow::DirectoryMatcher    directory_converter (处理 Vec<RawFile>)
//!     ↓                         ↓
//! services (能力层：ledger / probe / remover)
//!     ↓
//! infrastructure (基础设施：Converter)
//! ```

pub mod batch_processor;
pub mod directory_converter;

// 重新导出主要类型
pub use batch_processor::{App, RunStats};
pub use directory_converter::{convert_directory, partition, ConversionOutcome};
