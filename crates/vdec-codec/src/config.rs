//! 解码器配置.
//!
//! 在 `initialize()` 之前设置, 之后不可修改. 可由宿主从 JSON 等格式反序列化.

use serde::{Deserialize, Serialize};

use vdec_core::PixelFormat;

use crate::buffers::DEFAULT_INPUT_BUFFER_SIZE;
use crate::error::InitError;

/// 解码器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// 最大帧宽度 (像素)
    pub max_width: u32,
    /// 最大帧高度 (像素)
    pub max_height: u32,
    /// 输出像素格式
    pub pixel_format: PixelFormat,
    /// 主帧缓冲区大小 (字节), 0 表示按宽高与格式自动计算
    pub frame_buffer_size: usize,
    /// 输入暂存缓冲区容量 (字节)
    pub input_buffer_size: usize,
    /// 指定解码引擎名称, 为空时按注册顺序探测
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_width: 640,
            max_height: 480,
            pixel_format: PixelFormat::Yuv420p,
            frame_buffer_size: 0,
            input_buffer_size: DEFAULT_INPUT_BUFFER_SIZE,
            engine: None,
        }
    }
}

impl DecoderConfig {
    /// 以最大尺寸与输出格式创建配置, 其余字段取默认值
    pub fn new(max_width: u32, max_height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            max_width,
            max_height,
            pixel_format,
            ..Self::default()
        }
    }

    /// 设置主帧缓冲区大小提示
    pub fn with_frame_buffer_size(mut self, size: usize) -> Self {
        self.frame_buffer_size = size;
        self
    }

    /// 设置输入暂存缓冲区容量
    pub fn with_input_buffer_size(mut self, size: usize) -> Self {
        self.input_buffer_size = size;
        self
    }

    /// 指定解码引擎
    pub fn with_engine(mut self, name: impl Into<String>) -> Self {
        self.engine = Some(name.into());
        self
    }

    /// 校验配置
    ///
    /// 引擎原生输出为 YUV420P, 因此显式给出的缓冲区大小不得小于最大尺寸下的一帧 YUV420P.
    pub fn validate(&self) -> Result<(), InitError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(InitError::InvalidConfig(format!(
                "最大尺寸不能为零: {}x{}",
                self.max_width, self.max_height
            )));
        }
        if self.max_width % 2 != 0 || self.max_height % 2 != 0 {
            return Err(InitError::InvalidConfig(format!(
                "4:2:0 采样要求尺寸为偶数: {}x{}",
                self.max_width, self.max_height
            )));
        }
        if self.input_buffer_size == 0 {
            return Err(InitError::InvalidConfig("输入缓冲区容量不能为零".into()));
        }
        let native = PixelFormat::Yuv420p.frame_size(self.max_width, self.max_height);
        if self.frame_buffer_size != 0 && self.frame_buffer_size < native {
            return Err(InitError::InvalidConfig(format!(
                "帧缓冲区过小: {} < {} ({}x{} YUV420P)",
                self.frame_buffer_size, native, self.max_width, self.max_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DecoderConfig::default();
        assert_eq!((cfg.max_width, cfg.max_height), (640, 480));
        assert_eq!(cfg.pixel_format, PixelFormat::Yuv420p);
        assert_eq!(cfg.frame_buffer_size, 0);
        assert_eq!(cfg.input_buffer_size, 65536);
        assert!(cfg.engine.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = DecoderConfig::new(0, 480, PixelFormat::Rgb565);
        assert!(matches!(zero.validate(), Err(InitError::InvalidConfig(_))));

        let odd = DecoderConfig::new(641, 480, PixelFormat::Rgb565);
        assert!(matches!(odd.validate(), Err(InitError::InvalidConfig(_))));

        let no_input = DecoderConfig::default().with_input_buffer_size(0);
        assert!(no_input.validate().is_err());

        let small = DecoderConfig::default().with_frame_buffer_size(1024);
        assert!(small.validate().is_err());

        let exact = DecoderConfig::default().with_frame_buffer_size(640 * 480 * 3 / 2);
        assert!(exact.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let cfg: DecoderConfig =
            serde_json::from_str(r#"{"max_width": 320, "max_height": 240, "pixel_format": "RGB888"}"#)
                .unwrap();
        assert_eq!((cfg.max_width, cfg.max_height), (320, 240));
        assert_eq!(cfg.pixel_format, PixelFormat::Rgb888);
        assert_eq!(cfg.input_buffer_size, DEFAULT_INPUT_BUFFER_SIZE);
        assert!(cfg.engine.is_none());
    }

    #[test]
    fn test_serialize_omits_unset_engine() {
        let json = serde_json::to_string(&DecoderConfig::default()).unwrap();
        assert!(json.contains("\"pixel_format\":\"YUV420P\""));
        assert!(!json.contains("engine"));
    }
}
