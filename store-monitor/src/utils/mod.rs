//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] / [`AppResult`] - HTTP 层错误类型
//! - [`logger`] - 日志初始化
//! - [`time`] - 时间戳解析与转换

pub mod error;
pub mod logger;
pub mod result;
pub mod time;

pub use error::{AppError, ErrorBody};
pub use result::AppResult;
