//! 解码引擎适配接口.
//!
//! 真正的 H.264 熵解码、运动补偿与去块滤波由引擎完成 (硬件加速、厂商软件解码库
//! 或仅检查码流的回退实现), 管线只通过 `DecoderEngine` 与之交互.
//!
//! 提交是同步阻塞的: 同一时刻最多只有一次解码在进行, 不支持帧重排或多路排队.

use std::fmt;

use vdec_core::PixelFormat;

/// 创建引擎时传入的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// 最大帧宽度
    pub max_width: u32,
    /// 最大帧高度
    pub max_height: u32,
    /// 管线最终输出的像素格式, 支持直接输出该格式的引擎可借此跳过颜色空间转换
    pub output_format: PixelFormat,
}

/// 引擎成功解码出的平面描述
///
/// 平面数据已写入提交时传入的输出缓冲区, 格式为引擎的 `native_format()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedPlane {
    pub width: u32,
    pub height: u32,
    /// 单调时间戳 (微秒)
    pub timestamp: u64,
}

/// 引擎报告的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFault {
    /// 错误描述
    pub reason: String,
    /// 是否可恢复; 不可恢复时管线进入 `Failed` 状态
    pub recoverable: bool,
}

impl EngineFault {
    /// 可恢复错误 (损坏的码流等)
    pub fn recoverable(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            recoverable: true,
        }
    }

    /// 不可恢复错误 (引擎内部状态损坏, 硬件故障等)
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            recoverable: false,
        }
    }
}

impl fmt::Display for EngineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recoverable {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{} (不可恢复)", self.reason)
        }
    }
}

/// 一次提交的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutput {
    /// 输入已消费, 尚无完整帧
    Incomplete,
    /// 解码出一帧
    Decoded(DecodedPlane),
    /// 解码失败
    Failed(EngineFault),
}

/// 解码引擎
pub trait DecoderEngine {
    /// 引擎名称
    fn name(&self) -> &str;

    /// 引擎写入输出缓冲区的像素格式
    ///
    /// 与管线目标格式相同时跳过颜色空间转换.
    fn native_format(&self) -> PixelFormat {
        PixelFormat::Yuv420p
    }

    /// 提交一段码流
    ///
    /// # 参数
    /// - `data`: Annex B 码流 (非空)
    /// - `timestamp`: 输入时间戳 (微秒)
    /// - `output`: 帧缓冲区, 解码结果写入其前部
    fn submit(&mut self, data: &[u8], timestamp: u64, output: &mut [u8]) -> EngineOutput;

    /// 丢弃内部历史 (参考帧, 参数集缓存等)
    fn reset(&mut self);

    /// 周期调用机会, 供需要轮询的引擎使用
    fn poll(&mut self) {}
}
