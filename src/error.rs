use thiserror::Error;

use crate::models::AnswerType;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 校验失败（在任何状态变更之前返回）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 引用的题组 / 题目不存在
    #[error("未找到: {0}")]
    NotFound(#[from] NotFoundError),
    /// 单张内嵌图片解码失败
    #[error("图片解码错误: {0}")]
    AssetDecode(#[from] AssetDecodeError),
    /// 导出包组装失败
    #[error("打包错误: {0}")]
    Packaging(#[from] PackagingError),
    /// 快照读写失败
    #[error("持久化错误: {0}")]
    Persistence(#[from] PersistenceError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 校验错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 科目为空
    #[error("请先填写科目")]
    MissingSubject,
    /// 考试代码为空
    #[error("请先填写考试代码")]
    MissingExamCode,
    /// 考试代码格式不符
    #[error("考试代码 '{code}' 不符合格式 {pattern}")]
    MalformedExamCode { code: String, pattern: String },
    /// 未选择题组
    #[error("请先选择或创建题组")]
    NoSetSelected,
    /// 题组名称为空
    #[error("题组名称不能为空")]
    EmptySetLabel,
    /// 路径为空
    #[error("题目路径不能为空")]
    MissingPath,
    /// 题干为空
    #[error("题干不能为空")]
    MissingText,
    /// 评分标准为空
    #[error("答案类型 {answer_type} 必须填写评分标准")]
    MissingMarkScheme { answer_type: AnswerType },
    /// 分值不合法
    #[error("答案类型 {answer_type} 的分值 {marks} 不合法")]
    MarksOutOfRange { answer_type: AnswerType, marks: i64 },
    /// 已有题目正在编辑
    #[error("题目 {editing} 正在编辑中")]
    EditInProgress { editing: String },
    /// 没有可导出的题目
    #[error("没有可导出的题目")]
    NothingToExport,
}

/// 引用不存在
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("题组 {id} 不存在")]
    Set { id: String },
    #[error("题目 {id} 不存在")]
    Question { id: String },
    /// 拖拽锚点不在目标题组中
    #[error("锚点题目 {id} 不在题组 {set_id} 中")]
    Anchor { id: String, set_id: String },
}

/// 图片解码错误
#[derive(Debug, Error)]
pub enum AssetDecodeError {
    /// 非 base64 编码的 data URI
    #[error("不支持的内嵌编码: {media_type}")]
    UnsupportedEncoding { media_type: String },
    /// base64 内容损坏
    #[error("base64 解码失败: {source}")]
    InvalidPayload {
        #[source]
        source: base64::DecodeError,
    },
    /// 解码后为空
    #[error("图片内容为空")]
    EmptyPayload,
}

/// 打包错误
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("写入压缩包失败: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("写入文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV 序列化失败: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV 内容不是合法的 UTF-8")]
    Utf8,
    /// 后台打包任务异常退出
    #[error("打包任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// 持久化错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("读写快照失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON 快照解析失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML 快照解析失败: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("不支持的快照格式: {path}")]
    UnsupportedFormat { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected}")]
    InvalidValue {
        var_name: String,
        value: String,
        expected: String,
    },
    /// 考试代码规则不是合法的正则
    #[error("考试代码规则无效: {0}")]
    InvalidPattern(#[from] regex::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    pub fn set_not_found(id: impl Into<String>) -> Self {
        AppError::NotFound(NotFoundError::Set { id: id.into() })
    }

    pub fn question_not_found(id: impl Into<String>) -> Self {
        AppError::NotFound(NotFoundError::Question { id: id.into() })
    }

    pub fn persistence_io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Persistence(PersistenceError::Io {
            path: path.into(),
            source,
        })
    }

    /// 是否为校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// 是否为未找到错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Packaging(PackagingError::Zip(err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Packaging(PackagingError::Csv(err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
