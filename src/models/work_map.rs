//! 待转换列表
//!
//! 目录 → 待转换 RAW 的映射，每次运行新建，不持久化。
//! 每个目录只由匹配它的那一次调用写入，因此不同 key 之间没有竞争。

use crate::models::RawFile;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct PendingWorkMap {
    inner: Mutex<BTreeMap<PathBuf, Vec<RawFile>>>,
}

impl PendingWorkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录目录的待转换列表，返回该目录之前的列表（正常情况下为 `None`）
    pub fn insert(&self, dir: PathBuf, files: Vec<RawFile>) -> Option<Vec<RawFile>> {
        self.lock().insert(dir, files)
    }

    /// 目录数量（包括空列表）
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 所有目录中待转换 RAW 的总数
    pub fn pending_files(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// 取出全部内容，按目录路径排序
    pub fn take(&self) -> Vec<(PathBuf, Vec<RawFile>)> {
        std::mem::take(&mut *self.lock()).into_iter().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Vec<RawFile>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
