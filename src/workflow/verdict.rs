//! 单个 RAW 文件的判定规则
//!
//! 纯函数，不访问文件系统。

use crate::error::ProbeError;
use crate::models::Resolution;

/// RAW 文件的判定结果
#[derive(Debug)]
pub enum Verdict {
    /// 没有同名 JPG
    NoRenderedImage,
    /// 已有 JPG，但宽或高低于阈值
    LowResolution(Resolution),
    /// 已有 JPG，但读不出尺寸
    Unreadable(ProbeError),
    /// 已有足够大的 JPG
    HighResolution(Resolution),
}

impl Verdict {
    /// `probed` 为 `None` 表示没有找到同名 JPG
    pub fn classify(probed: Option<Result<Resolution, ProbeError>>, threshold: u32) -> Self {
        match probed {
            None => Verdict::NoRenderedImage,
            Some(Err(e)) => Verdict::Unreadable(e),
            Some(Ok(resolution)) if resolution.is_low_res(threshold) => {
                Verdict::LowResolution(resolution)
            }
            Some(Ok(resolution)) => Verdict::HighResolution(resolution),
        }
    }

    /// 是否需要加入转换队列（读不出尺寸时也转换）
    pub fn needs_conversion(&self) -> bool {
        !matches!(self, Verdict::HighResolution(_))
    }
}
