use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use crate::error::{AppError, AppResult, ConfigError};

/// 结果存储后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// 在线表格（Sheets values API）
    Sheets,
    /// 本地 CSV 文件
    Csv,
    /// 进程内存（演示 / 测试）
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Sheets => "sheets",
            StoreBackend::Csv => "csv",
            StoreBackend::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sheets" | "gsheets" => Ok(StoreBackend::Sheets),
            "csv" => Ok(StoreBackend::Csv),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "STORE_BACKEND".to_string(),
                value: s.to_string(),
                expected_type: "sheets | csv | memory".to_string(),
            }),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 监听地址
    pub bind_addr: String,
    /// 对比图片目录
    pub image_dir: String,
    /// 页面标题
    pub page_title: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 结果存储配置 ---
    pub store_backend: StoreBackend,
    /// 工作表名称（CSV 后端下为文件名）
    pub table_name: String,
    pub sheets_api_base_url: String,
    pub spreadsheet_id: String,
    pub sheets_access_token: String,
    pub csv_store_dir: String,
    /// 读缓存有效期（秒），0 表示每次直读
    pub cache_ttl_secs: u64,
    // --- 会话配置 ---
    /// 会话空闲多久后被清理（秒）
    pub session_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8501".to_string(),
            image_dir: "images".to_string(),
            page_title: "Genfocus Sharpness Study".to_string(),
            verbose_logging: false,
            store_backend: StoreBackend::Sheets,
            table_name: "Sheet1".to_string(),
            sheets_api_base_url: "https://sheets.googleapis.com".to_string(),
            spreadsheet_id: String::new(),
            sheets_access_token: String::new(),
            csv_store_dir: "results".to_string(),
            cache_ttl_secs: 0,
            session_ttl_secs: 3600,
        }
    }
}

impl Config {
    /// 先读取 TOML 配置文件（如果存在），再用环境变量覆盖
    ///
    /// 文件路径取 `SURVEY_CONFIG`，未设置时尝试当前目录下的 `survey.toml`。
    /// 配置有误不会中止启动：出错的部分沿用默认值，问题随配置一起返回，由调用方在日志初始化后记录
    pub fn load() -> (Self, Vec<AppError>) {
        let explicit = std::env::var("SURVEY_CONFIG").ok().map(PathBuf::from);
        let path = explicit.unwrap_or_else(|| PathBuf::from("survey.toml"));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> (Self, Vec<AppError>) {
        let mut problems = Vec::new();

        let base = if path.exists() {
            Self::from_toml_file(path).unwrap_or_else(|e| {
                problems.push(e);
                Self::default()
            })
        } else {
            Self::default()
        };

        let config = base.with_env_overrides(&mut problems);
        (config, problems)
    }

    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileParseFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            ConfigError::FileParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            }
            .into()
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self, problems: &mut Vec<AppError>) -> Self {
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse().unwrap_or_else(|e: ConfigError| {
                problems.push(e.into());
                self.store_backend
            }),
            Err(_) => self.store_backend,
        };

        Self {
            bind_addr: std::env::var("SURVEY_BIND_ADDR").unwrap_or(self.bind_addr),
            image_dir: std::env::var("IMAGE_DIR").unwrap_or(self.image_dir),
            page_title: std::env::var("PAGE_TITLE").unwrap_or(self.page_title),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            store_backend,
            table_name: std::env::var("TABLE_NAME").unwrap_or(self.table_name),
            sheets_api_base_url: std::env::var("SHEETS_API_BASE_URL").unwrap_or(self.sheets_api_base_url),
            spreadsheet_id: std::env::var("SPREADSHEET_ID").unwrap_or(self.spreadsheet_id),
            sheets_access_token: std::env::var("SHEETS_ACCESS_TOKEN").unwrap_or(self.sheets_access_token),
            csv_store_dir: std::env::var("CSV_STORE_DIR").unwrap_or(self.csv_store_dir),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.cache_ttl_secs),
            session_ttl_secs: std::env::var("SESSION_TTL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.session_ttl_secs),
        }
    }

    /// 检查所选后端是否具备连接所需的配置
    pub fn store_problem(&self) -> Option<ConfigError> {
        match self.store_backend {
            StoreBackend::Sheets if self.spreadsheet_id.trim().is_empty() => {
                Some(ConfigError::StoreUnconfigured {
                    reason: "SPREADSHEET_ID 未设置".to_string(),
                })
            }
            StoreBackend::Sheets if self.sheets_access_token.trim().is_empty() => {
                Some(ConfigError::StoreUnconfigured {
                    reason: "SHEETS_ACCESS_TOKEN 未设置".to_string(),
                })
            }
            _ if self.table_name.trim().is_empty() => Some(ConfigError::StoreUnconfigured {
                reason: "TABLE_NAME 为空".to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            image_dir = "pairs"
            store_backend = "csv"
            cache_ttl_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.image_dir, "pairs");
        assert_eq!(config.store_backend, StoreBackend::Csv);
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.table_name, "Sheet1");
        assert_eq!(config.bind_addr, "127.0.0.1:8501");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("survey.toml");
        std::fs::write(&path, "bind_addr = [").unwrap();

        let (config, problems) = Config::load_from(&path);
        assert_eq!(problems.len(), 1);
        assert!(matches!(
            problems[0],
            AppError::Config(ConfigError::FileParseFailed { .. })
        ));
        assert_eq!(config.table_name, Config::default().table_name);
        assert_eq!(config.session_ttl_secs, 3600);
    }

    #[test]
    fn test_missing_file_is_not_a_problem() {
        let tmp = tempfile::tempdir().unwrap();
        let (config, problems) = Config::load_from(&tmp.path().join("absent.toml"));
        assert!(problems.is_empty());
        assert_eq!(config.cache_ttl_secs, 0);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Config::from_toml_str(r#"store_backend = "ftp""#).is_err());
        assert!("ftp".parse::<StoreBackend>().is_err());
        assert_eq!("GSheets".parse::<StoreBackend>().unwrap(), StoreBackend::Sheets);
    }

    #[test]
    fn test_sheets_without_id_is_unconfigured() {
        let config = Config::default();
        assert!(matches!(
            config.store_problem(),
            Some(ConfigError::StoreUnconfigured { .. })
        ));

        let config = Config {
            store_backend: StoreBackend::Memory,
            ..Config::default()
        };
        assert!(config.store_problem().is_none());
    }
}
