//! RAW 文件与同名 JPG 候选
//!
//! 只做路径层面的判断，不访问文件系统。

use std::fmt;
use std::path::{Path, PathBuf};

/// 可识别的 RAW 扩展名（小写比较）
pub const RAW_EXTENSIONS: [&str; 2] = ["cr2", "nef"];

/// 已有 JPG 的扩展名，按顺序查找
pub const RENDERED_EXTENSIONS: [&str; 2] = ["jpg", "JPG"];

/// 可选删除的元数据文件扩展名
pub const SIDECAR_EXTENSION: &str = "xmp";

/// 已确认扩展名为 RAW 的文件路径
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawFile(PathBuf);

impl RawFile {
    /// 扩展名是 RAW（忽略大小写）时返回 `Some`
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        has_extension(&path, &RAW_EXTENSIONS).then_some(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// 同目录、同文件名、只有扩展名不同的 JPG 路径（`.jpg` 在前，`.JPG` 在后）
    pub fn rendered_candidates(&self) -> [RenderedCandidate; 2] {
        RENDERED_EXTENSIONS.map(|ext| RenderedCandidate(replace_extension(&self.0, ext)))
    }
}

impl fmt::Display for RawFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for RawFile {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// 可能存在的同名 JPG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCandidate(PathBuf);

impl RenderedCandidate {
    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// 是否为 .xmp 元数据文件
pub fn is_sidecar(path: &Path) -> bool {
    has_extension(path, &[SIDECAR_EXTENSION])
}

/// 按文件名后缀判断（忽略大小写）
///
/// `.cr2` 这种只有后缀的文件名也算，`Path::extension` 对它返回 `None`。
fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let name = name.to_string_lossy().to_ascii_lowercase();
    extensions.iter().any(|ext| {
        name.strip_suffix(ext)
            .is_some_and(|rest| rest.ends_with('.'))
    })
}

/// 替换最后一个后缀；只有后缀的文件名整体替换
fn replace_extension(path: &Path, ext: &str) -> PathBuf {
    if path.extension().is_some() {
        path.with_extension(ext)
    } else {
        path.with_file_name(format!(".{ext}"))
    }
}
