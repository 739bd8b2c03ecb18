use thiserror::Error;

/// 服务启动/运行期错误
///
/// 请求级错误见 [`crate::utils::AppError`]
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
