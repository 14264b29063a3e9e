//! 解码帧视图.
//!
//! `DecodedFrame` 不拥有数据, 它借用解码器内部的帧缓冲区或转换缓冲区.
//! 视图只在分发回调期间有效, 下一次解码会覆盖同一块内存;
//! 需要保留帧数据的观察者应调用 `to_vec()` 复制.

use std::fmt;

use vdec_core::PixelFormat;

/// 解码帧 (借用视图)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    /// 单调时间戳 (微秒)
    timestamp: u64,
}

impl<'a> DecodedFrame<'a> {
    /// 构造帧视图
    ///
    /// 数据为空、宽高为零或数据长度不足一整帧时返回 `None`.
    /// `data` 超出一帧的部分会被截掉.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        timestamp: u64,
    ) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let size = format.frame_size(width, height);
        if size == 0 || data.len() < size {
            return None;
        }
        Some(Self {
            data: &data[..size],
            width,
            height,
            format,
            timestamp,
        })
    }

    /// 帧数据
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// 帧数据字节数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 帧视图总是非空, 恒为 false
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// 时间戳 (微秒)
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// 复制帧数据
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}

impl fmt::Debug for DecodedFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
