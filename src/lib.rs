//! # vdec
//!
//! 面向资源受限嵌入式设备的 H.264 帧解码管线.
//!
//! vdec 接收 H.264 Annex B 码流片段, 借助可插拔的解码引擎得到解码平面,
//! 按需转换为 RGB565/RGB888, 再同步分发给已注册的观察者:
//! - **NAL 扫描**: 3/4 字节起始码定位, NAL 类型识别, SPS 尺寸解析
//! - **固定缓冲区**: 帧内存在初始化时一次性分配, 逐帧复用
//! - **颜色空间转换**: BT.601 定点 YUV420P → RGB
//! - **事件分发**: 按注册顺序调用帧/错误观察者
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use vdec::codec::H264FrameDecoder;
//! use vdec::core::PixelFormat;
//!
//! let mut decoder = H264FrameDecoder::with_registry(vdec::default_engine_registry());
//! decoder.configure(640, 480, PixelFormat::Rgb565, 0).unwrap();
//! decoder.initialize().unwrap();
//! decoder.register_frame_observer(|frame| {
//!     println!("帧: {}x{} @ {}us", frame.width(), frame.height(), frame.timestamp());
//! });
//! let chunk = std::fs::read("input.h264").unwrap();
//! decoder.decode_frame(&chunk).ok();
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `vdec-core` | 错误类型, 像素格式, 比特流读取 |
//! | `vdec-codec` | NAL 扫描, 解码引擎, 状态机, 缓冲区, 分发, 解码管线 |
//! | `vdec-scale` | 像素格式转换 |

/// 核心类型与工具
pub use vdec_core as core;

/// 解码管线
pub use vdec_codec as codec;

/// 像素格式转换
pub use vdec_scale as scale;

/// 获取 vdec 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解码引擎的注册表
pub fn default_engine_registry() -> vdec_codec::EngineRegistry {
    let mut registry = vdec_codec::EngineRegistry::new();
    vdec_codec::register_all(&mut registry);
    registry
}
