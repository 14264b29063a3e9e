//! # vdec-codec
//!
//! 嵌入式 H.264 帧解码管线.
//!
//! 管线把一段 Annex B 码流交给解码引擎, 把得到的平面按需转换为目标像素格式,
//! 再以借用视图的形式同步分发给观察者. 所有帧内存在初始化时一次性分配并复用.
//!
//! ## 组成
//!
//! - [`parsers::h264`]: NAL 扫描, 防竞争字节去除, SPS 尺寸解析
//! - [`buffers`]: 帧缓冲区大小计算与复用
//! - [`engine`] / [`engines`] / [`registry`]: 解码引擎接口, 内置软件回退引擎, 引擎选择
//! - [`state`]: 解码器状态机
//! - [`dispatcher`]: 帧与错误的观察者分发
//! - [`pipeline`]: 把以上部分组合起来的 [`H264FrameDecoder`]
//!
//! ## 使用示例
//!
//! ```rust
//! use vdec_codec::{DecodeOutcome, H264FrameDecoder};
//! use vdec_core::PixelFormat;
//!
//! let mut decoder = H264FrameDecoder::new();
//! decoder.configure(320, 240, PixelFormat::Rgb565, 0).unwrap();
//! decoder.initialize().unwrap();
//! decoder.register_frame_observer(|frame| {
//!     assert_eq!(frame.format(), PixelFormat::Rgb565);
//! });
//!
//! // 只有参数集, 尚无完整帧
//! let sps = [0, 0, 0, 1, 0x67, 0x42, 0x00, 0x1E, 0xDA, 0x05, 0x07, 0xE4];
//! assert_eq!(decoder.decode_frame(&sps).unwrap(), DecodeOutcome::NeedMoreData);
//! ```

pub mod buffers;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod engines;
pub mod error;
pub mod frame;
pub mod parsers;
pub mod pipeline;
pub mod registry;
pub mod state;

// 重导出常用类型
pub use buffers::{DEFAULT_INPUT_BUFFER_SIZE, FrameBuffers, calculate_frame_buffer_size};
pub use config::DecoderConfig;
pub use dispatcher::EventDispatcher;
pub use engine::{DecodedPlane, DecoderEngine, EngineConfig, EngineFault, EngineOutput};
pub use error::{DecodeError, InitError};
pub use frame::DecodedFrame;
pub use pipeline::{DecodeOutcome, DecodeStats, H264FrameDecoder};
pub use registry::EngineRegistry;
pub use state::DecoderState;

/// 注册所有内置解码引擎
pub fn register_all(registry: &mut EngineRegistry) {
    engines::register_all_engines(registry);
}
