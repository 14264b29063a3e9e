//! 统一错误类型定义.
//!
//! 库内部 (解析、转换、缓冲区管理) 共用的错误类型.
//! 对外的解码管线错误分类见 `vdec_codec::error`.

use thiserror::Error;

/// vdec 统一错误类型
#[derive(Debug, Error)]
pub enum VdecError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 已到达数据末尾
    #[error("已到达数据末尾")]
    Eof,

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// vdec 统一 Result 类型
pub type VdecResult<T> = Result<T, VdecError>;
