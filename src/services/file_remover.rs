//! 文件删除服务
//!
//! dry run 时只记录，不删除。删除失败只打警告，不向上传播。

use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct FileRemover {
    dry_run: bool,
}

impl FileRemover {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// 删除文件，返回是否真的删除了
    ///
    /// # 参数
    /// - `path`: 要删除的文件
    /// - `reason`: 日志里显示的原因
    pub async fn remove(&self, path: &Path, reason: &str) -> bool {
        if self.dry_run {
            info!("🗑️ [dry run] 删除{}: {}", reason, path.display());
            return false;
        }

        info!("🗑️ 删除{}: {}", reason, path.display());
        match tokio::fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) => {
                warn!("⚠️ 删除失败 {}: {}", path.display(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.xmp");
        std::fs::write(&path, "x").unwrap();

        assert!(FileRemover::new(false).remove(&path, "xmp").await);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dry_run_keeps_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.cr2");
        std::fs::write(&path, "raw").unwrap();

        let remover = FileRemover::new(true);
        assert!(!remover.remove(&path, "RAW").await);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!FileRemover::new(false).remove(&tmp.path().join("gone.cr2"), "RAW").await);
    }
}
