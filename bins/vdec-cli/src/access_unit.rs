//! Annex B 码流按访问单元切分.
//!
//! 切分规则:
//! - 前一个 NAL 为切片时, `first_mb_in_slice == 0` 的切片开始一个新访问单元
//! - 前一个 NAL 为切片时, AUD/SPS/PPS/SEI 开始一个新访问单元
//!
//! 同一图像的多个切片留在同一个访问单元中. 切片头无法读取时按新图像处理.
//! 不比较 frame_num/pic_parameter_set_id 等字段, 因此 ASO (任意切片顺序)
//! 码流中 first_mb 为 0 的切片不在首位时会被切开.

use bytes::Bytes;

use vdec_codec::parsers::h264::{NalUnit, NalUnitType, scan_nal_units};

/// 是否为访问单元的前置 NAL
fn is_prefix_nal(nal_type: NalUnitType) -> bool {
    nal_type.is_parameter_set() || matches!(nal_type, NalUnitType::Aud | NalUnitType::Sei)
}

/// 切片 NAL 是否开始一个新图像
fn begins_picture(nal: &NalUnit<'_>) -> bool {
    match nal.nal_type {
        // 数据分区 B/C 跟随同一切片的分区 A
        NalUnitType::SliceDpb | NalUnitType::SliceDpc => false,
        _ => nal.first_mb_in_slice().is_none_or(|mb| mb == 0),
    }
}

/// 访问单元是否包含 IDR 切片
pub fn is_keyframe(unit: &[u8]) -> bool {
    scan_nal_units(unit).any(|nal| nal.nal_type.is_idr())
}

/// 将码流切分为访问单元, 返回的 `Bytes` 与输入共享内存
pub fn split_access_units(stream: &Bytes) -> Vec<Bytes> {
    let mut units = Vec::new();
    let mut start = None;
    let mut prev_vcl = false;

    for nal in scan_nal_units(stream) {
        let nal_type = nal.nal_type;
        let begins_unit = prev_vcl
            && (is_prefix_nal(nal_type) || (nal_type.is_vcl() && begins_picture(&nal)));
        match start {
            None => start = Some(nal.offset),
            Some(s) if begins_unit => {
                units.push(stream.slice(s..nal.offset));
                start = Some(nal.offset);
            }
            Some(_) => {}
        }
        prev_vcl = nal_type.is_vcl();
    }

    if let Some(s) = start {
        units.push(stream.slice(s..));
    }
    units
}
