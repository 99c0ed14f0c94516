//! 转换记录服务 - 业务能力层
//!
//! 三个只追加的文本文件：
//! - `success.list`：已完成的目录，每行一个
//! - `failed.list`：失败的目录，每行一个
//! - `conversion.log`：带时间戳的活动日志
//!
//! 不去重、不压缩。同一目录在多次运行中可能出现多次。

use crate::config::Config;
use crate::error::LedgerError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

pub struct Ledger {
    activity_log: PathBuf,
    success_list: PathBuf,
    failed_list: PathBuf,
    /// 三个文件共用一把锁，保证每行完整写入
    write_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(
        activity_log: impl Into<PathBuf>,
        success_list: impl Into<PathBuf>,
        failed_list: impl Into<PathBuf>,
    ) -> Self {
        Self {
            activity_log: activity_log.into(),
            success_list: success_list.into(),
            failed_list: failed_list.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.activity_log_path(),
            config.success_list_path(),
            config.failed_list_path(),
        )
    }

    pub fn activity_log_path(&self) -> &Path {
        &self.activity_log
    }

    pub fn success_list_path(&self) -> &Path {
        &self.success_list
    }

    pub fn failed_list_path(&self) -> &Path {
        &self.failed_list
    }

    /// 写一行活动日志：`<时间> - <内容>`
    pub async fn log(&self, message: &str) -> Result<(), LedgerError> {
        let line = format!(
            "{} - {}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
            message
        );
        self.append_line(&self.activity_log, &line).await
    }

    pub async fn record_success(&self, dir: &Path) -> Result<(), LedgerError> {
        self.append_line(&self.success_list, &journal_key(dir)).await
    }

    pub async fn record_failure(&self, dir: &Path) -> Result<(), LedgerError> {
        self.append_line(&self.failed_list, &journal_key(dir)).await
    }

    /// 目录是否出现在 success 列表中
    ///
    /// 每次调用都重新读取整个文件。只要出现过一次就算成功，
    /// 之后即使同一目录又被记为失败也不会改变结果。
    pub async fn is_succeeded(&self, dir: &Path) -> Result<bool, LedgerError> {
        let content = match fs::read_to_string(&self.success_list).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(source) => {
                return Err(LedgerError::Read {
                    path: self.success_list.clone(),
                    source,
                })
            }
        };

        let key = journal_key(dir);
        Ok(content.lines().any(|line| line == key))
    }

    async fn append_line(&self, path: &Path, line: &str) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        debug!("追加到 {}: {}", path.display(), line);

        let to_error = |source| LedgerError::Append {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(to_error)?;

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        file.write_all(buf.as_bytes()).await.map_err(to_error)?;
        file.flush().await.map_err(to_error)?;
        Ok(())
    }
}

/// 目录在日志文件中的写法
fn journal_key(dir: &Path) -> String {
    dir.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ledger_in(dir: &Path) -> Ledger {
        Ledger::new(
            dir.join("conversion.log"),
            dir.join("success.list"),
            dir.join("failed.list"),
        )
    }

    #[tokio::test]
    async fn test_missing_success_list_means_not_succeeded() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = ledger_in(tmp.path());
        assert!(!ledger.is_succeeded(Path::new("/photos/trip")).await.unwrap());
    }

    #[tokio::test]
    async fn test_success_membership_is_exact_line_match() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = ledger_in(tmp.path());

        ledger.record_success(Path::new("/photos/trip")).await.unwrap();

        assert!(ledger.is_succeeded(Path::new("/photos/trip")).await.unwrap());
        assert!(!ledger.is_succeeded(Path::new("/photos/tri")).await.unwrap());
        assert!(!ledger.is_succeeded(Path::new("/photos/trip/day1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_any_prior_success_counts_even_after_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = ledger_in(tmp.path());
        let dir = Path::new("/photos/trip");

        ledger.record_success(dir).await.unwrap();
        ledger.record_failure(dir).await.unwrap();

        assert!(ledger.is_succeeded(dir).await.unwrap());
    }

    #[tokio::test]
    async fn test_appends_never_deduplicate() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = ledger_in(tmp.path());
        let dir = Path::new("/photos/trip");

        ledger.record_success(dir).await.unwrap();
        ledger.record_success(dir).await.unwrap();
        ledger.record_failure(dir).await.unwrap();

        let success = std::fs::read_to_string(ledger.success_list_path()).unwrap();
        assert_eq!(success, "/photos/trip\n/photos/trip\n");
        let failed = std::fs::read_to_string(ledger.failed_list_path()).unwrap();
        assert_eq!(failed, "/photos/trip\n");
    }

    #[tokio::test]
    async fn test_activity_log_lines_are_timestamped() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = ledger_in(tmp.path());

        ledger.log("Starting...").await.unwrap();
        ledger.log("Done!").await.unwrap();

        let log = std::fs::read_to_string(ledger.activity_log_path()).unwrap();
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - Starting..."));
        assert!(lines[1].ends_with(" - Done!"));
        assert!(lines[0].starts_with(&chrono::Local::now().format("%Y-").to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_whole_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = Arc::new(ledger_in(tmp.path()));

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move {
                    let dir = PathBuf::from(format!("/photos/album-{i:03}"));
                    ledger.record_success(&dir).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let content = std::fs::read_to_string(ledger.success_list_path()).unwrap();
        let mut lines: Vec<_> = content.lines().collect();
        lines.sort();
        assert_eq!(lines.len(), 64);
        assert_eq!(lines[0], "/photos/album-000");
        assert_eq!(lines[63], "/photos/album-063");
    }

    #[test]
    fn test_unwritable_journal_is_append_error() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = ledger_in(&tmp.path().join("missing-subdir"));

        let result = tokio_test::block_on(ledger.record_failure(Path::new("/photos/x")));
        assert!(matches!(result, Err(LedgerError::Append { .. })));
    }
}
