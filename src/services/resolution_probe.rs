//! 读取已有 JPG 的像素尺寸
//!
//! 只解析文件头，不解码像素。阻塞调用，由调用方放进 `spawn_blocking`。

use crate::error::ProbeError;
use crate::models::Resolution;
use image::{ImageError, ImageReader};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionProbe;

impl ResolutionProbe {
    pub fn new() -> Self {
        Self
    }

    /// 按文件内容识别格式后读取宽高
    pub fn probe(&self, path: &Path) -> Result<Resolution, ProbeError> {
        let to_error = |source: ImageError| ProbeError {
            path: path.to_path_buf(),
            source,
        };

        let (width, height) = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| to_error(ImageError::IoError(e)))?
            .into_dimensions()
            .map_err(to_error)?;

        Ok(Resolution::new(width, height))
    }
}
