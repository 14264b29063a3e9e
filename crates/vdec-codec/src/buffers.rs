//! 帧缓冲区管理.
//!
//! 解码器持有三块在初始化时一次性分配、之后反复复用的缓冲区:
//! - `frame_buffer`: 引擎解码输出, 大小在初始化时确定, 之后不再改变
//! - `temp_buffer`: 颜色空间转换输出, 只增不减
//! - `input_buffer`: 码流暂存区, 容量固定

use log::debug;

use vdec_core::{PixelFormat, VdecError, VdecResult};

use crate::config::DecoderConfig;

/// 默认输入暂存缓冲区容量 (64 KiB)
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 64 * 1024;

/// 计算一帧所需的字节数
///
/// YUV420P 为 `w*h*3/2`, RGB565 为 `w*h*2`, RGB888 为 `w*h*3`.
pub const fn calculate_frame_buffer_size(format: PixelFormat, width: u32, height: u32) -> usize {
    format.frame_size(width, height)
}

/// 根据配置确定主帧缓冲区大小 (提示为 0 时自动计算)
pub fn frame_buffer_size_for(config: &DecoderConfig) -> usize {
    if config.frame_buffer_size == 0 {
        calculate_frame_buffer_size(config.pixel_format, config.max_width, config.max_height)
    } else {
        config.frame_buffer_size
    }
}

/// 解码器的三块复用缓冲区
#[derive(Debug, Default)]
pub struct FrameBuffers {
    frame_buffer: Vec<u8>,
    temp_buffer: Vec<u8>,
    input_buffer: Vec<u8>,
    /// 当前暂存的输入字节数
    staged: usize,
}

impl FrameBuffers {
    /// 按配置分配缓冲区
    pub fn allocate(config: &DecoderConfig) -> Self {
        let frame_size = frame_buffer_size_for(config);
        debug!(
            "分配缓冲区: frame={}, temp={}, input={}",
            frame_size, frame_size, config.input_buffer_size,
        );
        Self {
            frame_buffer: vec![0; frame_size],
            temp_buffer: vec![0; frame_size],
            input_buffer: vec![0; config.input_buffer_size],
            staged: 0,
        }
    }

    pub fn frame_buffer_size(&self) -> usize {
        self.frame_buffer.len()
    }

    pub fn temp_buffer_size(&self) -> usize {
        self.temp_buffer.len()
    }

    pub fn input_capacity(&self) -> usize {
        self.input_buffer.len()
    }

    /// 确保转换缓冲区至少有 `min_bytes` 字节, 只增不减
    pub fn ensure_scratch(&mut self, min_bytes: usize) {
        if self.temp_buffer.len() < min_bytes {
            debug!("扩展转换缓冲区: {} -> {}", self.temp_buffer.len(), min_bytes);
            self.temp_buffer.resize(min_bytes, 0);
        }
    }

    /// 将一段码流复制到输入暂存区
    pub fn stage_input(&mut self, data: &[u8]) -> VdecResult<()> {
        if data.len() > self.input_buffer.len() {
            return Err(VdecError::InvalidArgument(format!(
                "输入数据超出暂存区容量: {} > {}",
                data.len(),
                self.input_buffer.len()
            )));
        }
        self.input_buffer[..data.len()].copy_from_slice(data);
        self.staged = data.len();
        Ok(())
    }

    /// 引擎解码所需的 (暂存输入, 帧缓冲区)
    pub fn engine_io(&mut self) -> (&[u8], &mut [u8]) {
        (&self.input_buffer[..self.staged], &mut self.frame_buffer)
    }

    /// 颜色空间转换所需的 (源数据, 目标数据)
    ///
    /// 源为帧缓冲区前 `src_len` 字节, 目标为转换缓冲区前 `dst_len` 字节.
    /// 调用前应先通过 `ensure_scratch` 确保容量.
    pub fn conversion_io(&mut self, src_len: usize, dst_len: usize) -> VdecResult<(&[u8], &mut [u8])> {
        if src_len > self.frame_buffer.len() || dst_len > self.temp_buffer.len() {
            return Err(VdecError::Internal(format!(
                "转换区间越界: src={}/{}, dst={}/{}",
                src_len,
                self.frame_buffer.len(),
                dst_len,
                self.temp_buffer.len()
            )));
        }
        Ok((&self.frame_buffer[..src_len], &mut self.temp_buffer[..dst_len]))
    }

    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer
    }

    pub fn temp_buffer(&self) -> &[u8] {
        &self.temp_buffer
    }

    /// 释放全部缓冲区
    pub fn release(&mut self) {
        *self = Self::default();
    }
}
