//! 错误处理模块
//! 定义了所有应用级别的错误类型

use thiserror::Error;

/// 应用主错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// Zipf分布创建错误
    #[error("Zipf distribution create error: {0}")]
    ZipfCreate(String),
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),
    /// 被测缓存后端错误
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    /// 工作线程 panic
    #[error("Worker {worker} panicked: {reason}")]
    WorkerPanicked { worker: usize, reason: String },
    /// 结果输出错误
    #[error("Result sink error: {0}")]
    Sink(String),
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 后端适配器错误
#[derive(Debug, Error)]
pub enum BackendError {
    /// 构造失败（配置非法、端点不可达等）
    #[error("{backend}: init failed: {reason}")]
    Init { backend: String, reason: String },
    /// 单次 get/set 失败
    #[error("{backend}: operation failed: {reason}")]
    Operation { backend: String, reason: String },
    /// 释放资源失败
    #[error("{backend}: close failed: {reason}")]
    Close { backend: String, reason: String },
}

impl BackendError {
    pub fn init(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Init {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    pub fn operation(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Operation {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 错误上下文扩展trait
pub trait ErrorContext<T> {
    /// 添加上下文信息
    fn with_context(self, context: &str) -> Result<T>;
}

impl<T> ErrorContext<T> for Result<T> {
    fn with_context(self, context: &str) -> Result<T> {
        self.map_err(|e| match e {
            AppError::ZipfCreate(msg) => AppError::ZipfCreate(format!("{}: {}", context, msg)),
            AppError::Config(msg) => AppError::Config(format!("{}: {}", context, msg)),
            AppError::Sink(msg) => AppError::Sink(format!("{}: {}", context, msg)),
            AppError::Io(err) => AppError::Io(std::io::Error::new(
                err.kind(),
                format!("{}: {}", context, err),
            )),
            AppError::WorkerPanicked { worker, reason } => AppError::WorkerPanicked {
                worker,
                reason: format!("{}: {}", context, reason),
            },
            other @ AppError::Backend(_) => other,
        })
    }
}
