//! # vdec-scale
//!
//! vdec 像素格式转换库.
//!
//! 将解码引擎输出的平面 YUV 4:2:0 帧转换为显示设备使用的打包 RGB 格式:
//! - YUV420P → RGB565 (大端 16 位字)
//! - YUV420P → RGB888 (R, G, B 字节顺序)
//!
//! 全部运算为 BT.601 定点整数运算, 不分配内存, 输出缓冲区由调用方预先分配.

pub mod convert;

pub use convert::{convert, is_conversion_supported, pack_rgb565, yuv_to_rgb};
