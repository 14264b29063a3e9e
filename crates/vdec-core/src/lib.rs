//! # vdec-core
//!
//! vdec 解码管线的核心库, 提供基础类型定义、错误处理和比特流读取.
//!
//! 本 crate 不依赖任何解码引擎, 被 `vdec-codec` 与 `vdec-scale` 共同使用.

pub mod bitreader;
pub mod error;
pub mod pixel_format;

// 重导出常用类型
pub use error::{VdecError, VdecResult};
pub use pixel_format::PixelFormat;
