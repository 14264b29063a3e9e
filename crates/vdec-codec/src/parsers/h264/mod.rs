//! H.264/AVC Annex B 码流解析器.
//!
//! 只覆盖解码管线需要的部分:
//! - 起始码定位与 NAL 类型识别 (惰性扫描, 不修改输入)
//! - 去除防竞争字节, 得到 RBSP
//! - SPS 中的图像尺寸信息

pub mod nal;
pub mod sps;

pub use nal::{NalScanner, NalUnit, NalUnitType, scan_nal_units, unescape_rbsp};
pub use sps::{SpsInfo, parse_sps};
