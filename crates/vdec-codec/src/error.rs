//! 解码管线错误分类.
//!
//! 初始化错误与逐帧解码错误分开定义:
//! - `InitError::EngineCreation` 是管线中唯一的致命错误
//! - `DecodeError` 的各变体都不致命, 由错误观察者接收一次并作为失败结果返回

use thiserror::Error;

use vdec_core::PixelFormat;

/// 初始化错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// 配置非法 (尺寸为零, 缓冲区提示过小等)
    #[error("解码器配置非法: {0}")]
    InvalidConfig(String),

    /// 当前状态不允许初始化 (重复初始化, 或已处于终止失败状态)
    #[error("当前状态不允许初始化: {0}")]
    InvalidState(String),

    /// 解码引擎创建失败 (致命, 不可重试)
    #[error("解码引擎创建失败: {0}")]
    EngineCreation(String),
}

impl InitError {
    /// 是否为致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EngineCreation(_))
    }
}

/// 逐帧解码错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// 解码器未就绪 (未初始化或已致命失败)
    #[error("解码器未就绪")]
    NotReady,

    /// 输入为空或超出输入缓冲区容量
    #[error("输入数据非法: {0}")]
    InvalidInput(String),

    /// 解码引擎报告了除 "数据不完整" 之外的错误
    #[error("解码引擎失败: {0}")]
    EngineFailure(String),

    /// 颜色空间转换无法产生有效输出
    #[error("颜色空间转换失败: {src} -> {dst}: {reason}")]
    ConversionFailure {
        src: PixelFormat,
        dst: PixelFormat,
        reason: String,
    },
}
