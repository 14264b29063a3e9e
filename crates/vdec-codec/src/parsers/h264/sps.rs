//! H.264 SPS (Sequence Parameter Set) 尺寸解析.
//!
//! 只解析到 frame cropping 为止, 足以得到显示宽高:
//! - Profile / Level
//! - 色度格式 (High Profile 及以上)
//! - 图像尺寸 (以宏块为单位) 与 cropping
//!
//! VUI 与量化矩阵内容不保留, 仅按语法跳过.

use vdec_core::bitreader::BitReader;
use vdec_core::{VdecError, VdecResult};

/// SPS 中与帧尺寸相关的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpsInfo {
    /// profile_idc (66=Baseline, 77=Main, 100=High)
    pub profile_idc: u8,
    /// level_idc (30=3.0, 41=4.1)
    pub level_idc: u8,
    /// seq_parameter_set_id
    pub sps_id: u32,
    /// 色度格式 (0=单色, 1=4:2:0, 2=4:2:2, 3=4:4:4)
    pub chroma_format_idc: u32,
    /// 是否为帧编码 (非场编码)
    pub frame_mbs_only: bool,
    /// 图像宽度 (像素, 已应用 cropping)
    pub width: u32,
    /// 图像高度 (像素, 已应用 cropping)
    pub height: u32,
}

/// 从 RBSP 数据 (不含 NAL 头部, 已去除防竞争字节) 解析 SPS
pub fn parse_sps(rbsp: &[u8]) -> VdecResult<SpsInfo> {
    if rbsp.len() < 4 {
        return Err(VdecError::InvalidData("H.264: SPS RBSP 太短".into()));
    }

    let mut br = BitReader::new(rbsp);
    let profile_idc = br.read_bits(8)? as u8;
    br.skip_bits(8)?; // constraint_set flags + reserved_zero_2bits
    let level_idc = br.read_bits(8)? as u8;
    let sps_id = br.read_ue()?;
    if sps_id > 31 {
        return Err(VdecError::InvalidData(format!(
            "H.264: sps_id 超出范围, sps_id={sps_id}"
        )));
    }

    let mut chroma_format_idc = 1;
    let mut separate_colour_plane = false;
    if is_high_profile(profile_idc) {
        chroma_format_idc = br.read_ue()?;
        if chroma_format_idc > 3 {
            return Err(VdecError::InvalidData(format!(
                "H.264: chroma_format_idc 非法, value={chroma_format_idc}"
            )));
        }
        if chroma_format_idc == 3 {
            separate_colour_plane = br.read_flag()?;
        }
        br.read_ue()?; // bit_depth_luma_minus8
        br.read_ue()?; // bit_depth_chroma_minus8
        br.skip_bits(1)?; // qpprime_y_zero_transform_bypass_flag
        if br.read_flag()? {
            let list_count = if chroma_format_idc == 3 { 12 } else { 8 };
            for i in 0..list_count {
                if br.read_flag()? {
                    skip_scaling_list(&mut br, if i < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    br.read_ue()?; // log2_max_frame_num_minus4
    match br.read_ue()? {
        0 => {
            br.read_ue()?; // log2_max_pic_order_cnt_lsb_minus4
        }
        1 => {
            br.skip_bits(1)?; // delta_pic_order_always_zero_flag
            br.read_se()?; // offset_for_non_ref_pic
            br.read_se()?; // offset_for_top_to_bottom_field
            let cycle = br.read_ue()?;
            if cycle > 255 {
                return Err(VdecError::InvalidData(format!(
                    "H.264: num_ref_frames_in_pic_order_cnt_cycle 超出范围, value={cycle}"
                )));
            }
            for _ in 0..cycle {
                br.read_se()?;
            }
        }
        2 => {}
        poc_type => {
            return Err(VdecError::InvalidData(format!(
                "H.264: pic_order_cnt_type 非法, value={poc_type}"
            )));
        }
    }

    br.read_ue()?; // max_num_ref_frames
    br.skip_bits(1)?; // gaps_in_frame_num_value_allowed_flag

    let width_in_mbs = br.read_ue()? + 1;
    let height_in_map_units = br.read_ue()? + 1;
    let frame_mbs_only = br.read_flag()?;
    if !frame_mbs_only {
        br.skip_bits(1)?; // mb_adaptive_frame_field_flag
    }
    br.skip_bits(1)?; // direct_8x8_inference_flag

    let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0, 0, 0, 0);
    if br.read_flag()? {
        crop_left = br.read_ue()?;
        crop_right = br.read_ue()?;
        crop_top = br.read_ue()?;
        crop_bottom = br.read_ue()?;
    }

    let chroma_array_type = if separate_colour_plane {
        0
    } else {
        chroma_format_idc
    };
    let (unit_x, unit_y) = cropping_unit(chroma_array_type, frame_mbs_only);
    let overflow = || VdecError::InvalidData("H.264: 计算图像尺寸时发生溢出".into());
    let raw_width = width_in_mbs.checked_mul(16).ok_or_else(overflow)?;
    let raw_height = height_in_map_units
        .checked_mul(if frame_mbs_only { 16 } else { 32 })
        .ok_or_else(overflow)?;
    let crop_x = crop_left
        .checked_add(crop_right)
        .and_then(|v| v.checked_mul(unit_x))
        .ok_or_else(overflow)?;
    let crop_y = crop_top
        .checked_add(crop_bottom)
        .and_then(|v| v.checked_mul(unit_y))
        .ok_or_else(overflow)?;
    if crop_x >= raw_width || crop_y >= raw_height {
        return Err(VdecError::InvalidData(format!(
            "H.264: 裁剪参数非法, raw={raw_width}x{raw_height}, crop_x={crop_x}, crop_y={crop_y}"
        )));
    }

    Ok(SpsInfo {
        profile_idc,
        level_idc,
        sps_id,
        chroma_format_idc,
        frame_mbs_only,
        width: raw_width - crop_x,
        height: raw_height - crop_y,
    })
}

/// 是否为 High Profile 或更高 (SPS 含色度格式与量化矩阵字段)
fn is_high_profile(profile_idc: u8) -> bool {
    matches!(
        profile_idc,
        100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 138 | 139 | 134 | 135
    )
}

/// 获取 cropping 单位 (水平, 垂直)
fn cropping_unit(chroma_array_type: u32, frame_mbs_only: bool) -> (u32, u32) {
    let (sub_width, sub_height) = match chroma_array_type {
        1 => (2, 2),
        2 => (2, 1),
        _ => (1, 1),
    };
    let field_factor = if frame_mbs_only { 1 } else { 2 };
    (sub_width, sub_height * field_factor)
}

/// 按 7.3.2.1.1.1 语法跳过一个量化矩阵
fn skip_scaling_list(br: &mut BitReader, size: usize) -> VdecResult<()> {
    let mut last_scale = 8i32;
    let mut next_scale = 8i32;
    for _ in 0..size {
        if next_scale != 0 {
            let delta = br.read_se()?;
            next_scale = (last_scale + delta + 256).rem_euclid(256);
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Ok(())
}
