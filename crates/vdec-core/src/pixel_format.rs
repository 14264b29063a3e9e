//! 像素格式定义.
//!
//! 解码管线只处理三种格式: 引擎原生输出的 YUV420P, 以及面向显示的 RGB565/RGB888.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::VdecError;

/// 像素格式
///
/// 决定帧缓冲区大小 (每像素 1.5 / 2 / 3 字节) 与颜色空间转换路径.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// YUV 4:2:0 平面格式, 8 位 (Y 平面后紧跟 U, 再紧跟 V)
    #[default]
    #[serde(rename = "YUV420P")]
    Yuv420p,
    /// RGB565 打包格式, 每像素一个大端 16 位字
    #[serde(rename = "RGB565")]
    Rgb565,
    /// RGB888 打包格式, 每像素 3 字节, R/G/B 顺序
    #[serde(rename = "RGB888")]
    Rgb888,
}

impl PixelFormat {
    /// 所有支持的格式
    pub const ALL: [PixelFormat; 3] = [Self::Yuv420p, Self::Rgb565, Self::Rgb888];

    /// 每像素平均位数 (YUV420P 为 12)
    pub const fn bits_per_pixel(&self) -> u32 {
        match self {
            Self::Yuv420p => 12,
            Self::Rgb565 => 16,
            Self::Rgb888 => 24,
        }
    }

    /// 是否为平面格式
    pub const fn is_planar(&self) -> bool {
        matches!(self, Self::Yuv420p)
    }

    /// 是否为打包 RGB 格式
    pub const fn is_rgb(&self) -> bool {
        matches!(self, Self::Rgb565 | Self::Rgb888)
    }

    /// 计算整帧的字节数
    ///
    /// - YUV420P: `width * height * 3 / 2`
    /// - RGB565: `width * height * 2`
    /// - RGB888: `width * height * 3`
    pub const fn frame_size(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bits_per_pixel() as usize / 8
    }

    /// 格式名称 (大写, 与配置文件中的写法一致)
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Yuv420p => "YUV420P",
            Self::Rgb565 => "RGB565",
            Self::Rgb888 => "RGB888",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = VdecError;

    /// 按名称解析, 不区分大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|pf| pf.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VdecError::InvalidArgument(format!("未知像素格式: {s}")))
    }
}
