use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 图片目录相关错误
    Catalog(CatalogError),
    /// 结果存储错误
    Store(StoreError),
    /// 配置错误
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Catalog(e) => write!(f, "题目目录错误: {}", e),
            AppError::Store(e) => write!(f, "存储错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Catalog(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

/// 图片目录错误
#[derive(Debug)]
pub enum CatalogError {
    /// 目录不存在
    DirectoryNotFound { path: String },
    /// 读取目录失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录中没有可用的对比图
    NoImages { path: String },
    /// 文件名推导出的题号为空（如 `_a.png`）
    EmptyIdentifier { file_name: String },
    /// 两个文件推导出相同的题号
    DuplicateIdentifier {
        identifier: String,
        first: String,
        second: String,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DirectoryNotFound { path } => {
                write!(f, "Cannot find the image folder '{}'. Please check your file structure.", path)
            }
            CatalogError::ReadFailed { path, source } => {
                write!(f, "Cannot read the image folder '{}': {}", path, source)
            }
            CatalogError::NoImages { path } => {
                write!(f, "No comparison images (.png, .jpg, .jpeg) were found in '{}'.", path)
            }
            CatalogError::EmptyIdentifier { file_name } => {
                write!(
                    f,
                    "Image '{}' has no question prefix; name it like 'Q01_pair.png'.",
                    file_name
                )
            }
            CatalogError::DuplicateIdentifier {
                identifier,
                first,
                second,
            } => {
                write!(
                    f,
                    "Question '{}' is used by both '{}' and '{}'; every image needs a unique question prefix.",
                    identifier, first, second
                )
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::ReadFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 提交校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 缺少用户名或存在未作答的题目
    Incomplete {
        missing_participant: bool,
        unanswered: Vec<String>,
    },
    /// 选项不在 Left / Right 之内
    InvalidChoice { question: String, value: String },
    /// 本次会话已经提交过
    AlreadySubmitted,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Incomplete {
                missing_participant,
                unanswered,
            } => {
                write!(f, "Please answer all questions before submitting!")?;
                if *missing_participant {
                    write!(f, " Your name or ID is missing.")?;
                }
                if !unanswered.is_empty() {
                    write!(f, " Unanswered: {}.", unanswered.join(", "))?;
                }
                Ok(())
            }
            ValidationError::InvalidChoice { question, value } => {
                write!(f, "'{}' is not a valid answer for {}; choose Left or Right.", value, question)
            }
            ValidationError::AlreadySubmitted => {
                write!(f, "Your answers have already been submitted.")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    FileParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 结果存储未配置
    StoreUnconfigured { reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::FileParseFailed { path, source } => {
                write!(f, "配置文件解析失败 ({}): {}", path, source)
            }
            ConfigError::StoreUnconfigured { reason } => {
                write!(f, "结果存储未配置: {}", reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 表格存储错误
///
/// `MissingHeaders` 单独区分：表格为空或首行没有表头时，需要提示研究者补上表头
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("表格 {table} 为空或缺少表头")]
    MissingHeaders { table: String },

    #[error("结果存储未配置: {reason}")]
    Unconfigured { reason: String },

    #[error("请求表格 {table} 失败: {source}")]
    Request {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("表格 {table} 返回错误响应: status={status}, body={body}")]
    BadResponse {
        table: String,
        status: u16,
        body: String,
    },

    #[error("表格 {table} 数据格式错误: {reason}")]
    Malformed { table: String, reason: String },

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 读写失败: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    /// 是否属于"表格为空 / 缺少表头"一类
    pub fn is_missing_headers(&self) -> bool {
        matches!(self, StoreError::MissingHeaders { .. })
    }

    pub fn request_failed(
        table: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::Request {
            table: table.into(),
            source: Box::new(source),
        }
    }
}

// ========== 从常见错误类型转换 ==========

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Catalog(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Store(StoreError::Csv(err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
