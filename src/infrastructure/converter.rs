//! 外部转换程序 - 基础设施层
//!
//! 持有唯一的外部资源（ufraw-batch 可执行文件），只暴露"转换一批 RAW"的能力

use crate::error::ConversionError;
use crate::models::RawFile;
use serde::Deserialize;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// 转换一批 RAW 文件的能力
///
/// 职责：
/// - 一次调用处理一批文件
/// - 等待进程退出后才返回
/// - 不认识目录 / 日志文件
pub trait Converter: Send + Sync {
    fn convert(
        &self,
        files: &[RawFile],
    ) -> impl Future<Output = Result<ConverterExit, ConversionError>> + Send;
}

/// 转换程序的退出结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterExit {
    pub success: bool,
    pub code: Option<i32>,
}

impl ConverterExit {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failed(code: Option<i32>) -> Self {
        Self {
            success: false,
            code,
        }
    }
}

impl From<ExitStatus> for ConverterExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// 每次调用附带的固定参数
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    pub exposure: f32,
    pub saturation: f32,
    /// 高光/阴影细节恢复模式
    pub restore: String,
    /// 过曝高光的裁剪模式
    pub clip: String,
    pub out_type: String,
    /// JPEG 压缩质量
    pub compression: u8,
    pub overwrite: bool,
    pub lensfun: String,
    pub auto_crop: bool,
    pub color_smoothing: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            exposure: 1.1,
            saturation: 1.2,
            restore: "hsv".to_string(),
            clip: "film".to_string(),
            out_type: "jpg".to_string(),
            compression: 97,
            overwrite: true,
            lensfun: "none".to_string(),
            auto_crop: true,
            color_smoothing: true,
        }
    }
}

impl ConverterOptions {
    /// 按 ufraw-batch 的命令行格式生成参数
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--exposure={}", self.exposure),
            format!("--saturation={}", self.saturation),
            format!("--restore={}", self.restore),
            format!("--clip={}", self.clip),
            format!("--out-type={}", self.out_type),
            format!("--compression={}", self.compression),
        ];
        if self.overwrite {
            args.push("--overwrite".to_string());
        }
        args.push(format!("--lensfun={}", self.lensfun));
        if self.auto_crop {
            args.push("--auto-crop".to_string());
        }
        if self.color_smoothing {
            args.push("--color-smoothing".to_string());
        }
        args
    }
}

/// 通过子进程调用转换程序
///
/// stdout / stderr 直接继承当前进程。
#[derive(Debug, Clone)]
pub struct ConverterProcess {
    executable: PathBuf,
    options: ConverterOptions,
    timeout: Option<Duration>,
}

impl ConverterProcess {
    pub fn new(executable: impl Into<PathBuf>, options: ConverterOptions) -> Self {
        Self {
            executable: executable.into(),
            options,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// 完整参数列表（不含可执行文件本身）
    pub fn build_args(&self, files: &[RawFile]) -> Vec<String> {
        files
            .iter()
            .map(|raw| raw.path().to_string_lossy().into_owned())
            .chain(self.options.to_args())
            .collect()
    }

    async fn run(&self, files: &[RawFile]) -> Result<ConverterExit, ConversionError> {
        let args = self.build_args(files);
        debug!("调用转换程序: {} ({} 个文件)", self.executable.display(), files.len());

        let mut child = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConversionError::Launch {
                program: self.executable.clone(),
                source,
            })?;

        let waited = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        let Some(status) = waited else {
            // 超时：终止子进程，释放转换槽位
            let _ = child.kill().await;
            return Err(ConversionError::TimedOut {
                secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            });
        };
        let status = status.map_err(|source| ConversionError::Wait { source })?;

        Ok(status.into())
    }
}

impl Converter for ConverterProcess {
    fn convert(
        &self,
        files: &[RawFile],
    ) -> impl Future<Output = Result<ConverterExit, ConversionError>> + Send {
        self.run(files)
    }
}
