use crate::error::ConfigError;
use crate::infrastructure::ConverterOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 默认配置文件名（位于工作目录）
pub const DEFAULT_CONFIG_FILE: &str = "raw_backfill.toml";

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "RAW_BACKFILL_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 扫描的根目录
    pub photo_root_dir: PathBuf,
    /// 转换成功后删除 RAW
    pub delete_raw_after_convert: bool,
    /// 已有高分辨率 JPG 时删除 RAW
    pub delete_raw_on_high_res_jpg: bool,
    /// 删除 .xmp 元数据文件
    pub delete_xmp_files: bool,
    /// 只记录将要执行的操作，不删除文件、不调用转换程序
    pub dry_run: bool,
    /// 低分辨率阈值（像素），宽或高低于该值即重新转换
    pub low_res_threshold: u32,
    /// 每次调用转换程序传入的 RAW 文件数量
    pub chunk_size: usize,
    /// 匹配阶段的并发数
    pub match_pool_size: usize,
    /// 同时转换的目录数量
    pub convert_pool_size: usize,
    /// success / failed / 活动日志所在目录
    pub journal_dir: PathBuf,
    pub activity_log_file: String,
    pub success_list_file: String,
    pub failed_list_file: String,
    // --- 转换程序配置 ---
    pub converter: ConverterConfig,
}

/// 外部转换程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// 可执行文件路径
    pub executable: PathBuf,
    /// 单次调用的超时时间（秒），不设置则一直等待
    pub timeout_secs: Option<u64>,
    /// 退出码非零时把整个目录记为失败
    pub fail_on_nonzero_exit: bool,
    /// 固定参数
    pub options: ConverterOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            photo_root_dir: PathBuf::from("."),
            delete_raw_after_convert: false,
            delete_raw_on_high_res_jpg: false,
            delete_xmp_files: false,
            dry_run: false,
            low_res_threshold: 2000,
            chunk_size: 100,
            match_pool_size: 4,
            convert_pool_size: 2,
            journal_dir: PathBuf::from("."),
            activity_log_file: "conversion.log".to_string(),
            success_list_file: "success.list".to_string(),
            failed_list_file: "failed.list".to_string(),
            converter: ConverterConfig::default(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("ufraw-batch"),
            timeout_secs: None,
            fail_on_nonzero_exit: false,
            options: ConverterOptions::default(),
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（可选）→ 环境变量覆盖 → 校验
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse_toml(content, "<inline>")
    }

    fn parse_toml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// 用 `lookup` 提供的变量覆盖配置项
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PHOTO_ROOT_DIR") {
            self.photo_root_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("JOURNAL_DIR") {
            self.journal_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("CONVERTER_PATH") {
            self.converter.executable = PathBuf::from(v);
        }
        override_parsed(&lookup, "DRY_RUN", "bool", &mut self.dry_run)?;
        override_parsed(
            &lookup,
            "DELETE_RAW_AFTER_CONVERT",
            "bool",
            &mut self.delete_raw_after_convert,
        )?;
        override_parsed(
            &lookup,
            "DELETE_RAW_ON_HIGH_RES_JPG",
            "bool",
            &mut self.delete_raw_on_high_res_jpg,
        )?;
        override_parsed(&lookup, "DELETE_XMP_FILES", "bool", &mut self.delete_xmp_files)?;
        override_parsed(&lookup, "LOW_RES_THRESHOLD", "u32", &mut self.low_res_threshold)?;
        override_parsed(&lookup, "CHUNK_SIZE", "usize", &mut self.chunk_size)?;
        override_parsed(&lookup, "MATCH_POOL_SIZE", "usize", &mut self.match_pool_size)?;
        override_parsed(&lookup, "CONVERT_POOL_SIZE", "usize", &mut self.convert_pool_size)?;

        if let Some(v) = lookup("CONVERTER_TIMEOUT_SECS") {
            let secs = parse_value::<u64>("CONVERTER_TIMEOUT_SECS", &v, "u64")?;
            self.converter.timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::invalid("chunk_size", "必须大于 0"));
        }
        if self.match_pool_size == 0 {
            return Err(ConfigError::invalid("match_pool_size", "必须大于 0"));
        }
        if self.convert_pool_size == 0 {
            return Err(ConfigError::invalid("convert_pool_size", "必须大于 0"));
        }
        if self.low_res_threshold == 0 {
            return Err(ConfigError::invalid("low_res_threshold", "必须大于 0"));
        }
        if self.converter.timeout_secs == Some(0) {
            return Err(ConfigError::invalid("converter.timeout_secs", "必须大于 0"));
        }
        Ok(())
    }

    pub fn activity_log_path(&self) -> PathBuf {
        self.journal_dir.join(&self.activity_log_file)
    }

    pub fn success_list_path(&self) -> PathBuf {
        self.journal_dir.join(&self.success_list_file)
    }

    pub fn failed_list_path(&self) -> PathBuf {
        self.journal_dir.join(&self.failed_list_file)
    }
}

fn override_parsed<T, F>(
    lookup: &F,
    var_name: &str,
    expected_type: &str,
    slot: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(var_name) {
        *slot = parse_value(var_name, &value, expected_type)?;
    }
    Ok(())
}

fn parse_value<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}
