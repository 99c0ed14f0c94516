use std::path::PathBuf;
use thiserror::Error;

/// 无法读取已有 JPG 的分辨率
///
/// 调用方必须把它当作"没有可用的 JPG"处理（加入转换队列），而不是中止扫描。
#[derive(Debug, Error)]
#[error("无法读取图片尺寸 ({}): {source}", .path.display())]
pub struct ProbeError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// 外部转换程序错误
#[derive(Debug, Error)]
pub enum ConversionError {
    /// 进程无法启动
    #[error("无法启动转换程序 {}: {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 等待进程退出时出错
    #[error("等待转换程序退出失败: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
    /// 超时，进程已被终止
    #[error("转换程序超过 {secs} 秒未退出，已终止")]
    TimedOut { secs: u64 },
    /// 进程退出码非零
    #[error("转换程序报告失败 (退出码: {code:?})")]
    ConverterReported { code: Option<i32> },
}

/// 目录匹配过程中的意外错误
///
/// 以目录为单位捕获：记入 failed 列表，不影响兄弟目录。
#[derive(Debug, Error)]
pub enum MatchingError {
    /// 子任务 panic 或被取消
    #[error("匹配任务执行失败: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
    /// 匹配线程池已关闭
    #[error("匹配线程池已关闭")]
    PoolClosed(#[from] tokio::sync::AcquireError),
    /// 读取 success 列表失败
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// 日志文件（success / failed / 活动日志）读写错误
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 追加写入失败
    #[error("写入文件失败 ({}): {source}", .path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 读取失败
    #[error("读取文件失败 ({}): {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({}): {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
