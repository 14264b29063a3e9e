//! 像素格式转换模块.
//!
//! 支持的转换路径:
//! - YUV420P → RGB565
//! - YUV420P → RGB888
//! - 同格式复制
//!
//! 使用 BT.601 limited range 逆变换 (定点数, 缩放 256 倍):
//! ```text
//! C = Y - 16, D = U - 128, E = V - 128
//! R = clamp((298*C           + 409*E + 128) >> 8)
//! G = clamp((298*C - 100*D   - 208*E + 128) >> 8)
//! B = clamp((298*C + 516*D           + 128) >> 8)
//! ```
//!
//! 色度为 2x2 子采样: 每个 U/V 样本由一个 2x2 亮度块共享.

use byteorder::{BigEndian, ByteOrder};
use log::debug;
use vdec_core::{PixelFormat, VdecError, VdecResult};

// ============================================================
// BT.601 逆变换常量 (定点数, 缩放 256 倍)
// ============================================================

const Y_GAIN: i32 = 298; // 1.164 * 256
const R_V: i32 = 409; // 1.596 * 256
const G_U: i32 = -100; // -0.391 * 256
const G_V: i32 = -208; // -0.813 * 256
const B_U: i32 = 516; // 2.018 * 256
const ROUND: i32 = 128;

/// 检查给定的格式转换是否支持
pub fn is_conversion_supported(src: PixelFormat, dst: PixelFormat) -> bool {
    src == dst || (src.is_planar() && dst.is_rgb())
}

/// 执行像素格式转换
///
/// `src` 为连续存放的整帧数据 (YUV420P 时 Y/U/V 三个平面首尾相接),
/// `dst` 必须至少容纳 `dst_format.frame_size(width, height)` 字节.
///
/// # 返回
/// 写入 `dst` 的字节数
pub fn convert(
    src: &[u8],
    src_format: PixelFormat,
    dst: &mut [u8],
    dst_format: PixelFormat,
    width: u32,
    height: u32,
) -> VdecResult<usize> {
    if !is_conversion_supported(src_format, dst_format) {
        debug!("拒绝格式转换: {src_format} → {dst_format}");
        return Err(VdecError::Unsupported(format!(
            "不支持的格式转换: {src_format} → {dst_format}"
        )));
    }
    if width == 0 || height == 0 {
        return Err(VdecError::InvalidArgument(format!(
            "图像尺寸非法: {width}x{height}"
        )));
    }

    let src_size = src_format.frame_size(width, height);
    let dst_size = dst_format.frame_size(width, height);
    if src.len() < src_size {
        return Err(VdecError::InvalidArgument(format!(
            "源缓冲区不足: 需要 {src_size} 字节, 实际 {}",
            src.len()
        )));
    }
    if dst.len() < dst_size {
        return Err(VdecError::InvalidArgument(format!(
            "目标缓冲区不足: 需要 {dst_size} 字节, 实际 {}",
            dst.len()
        )));
    }

    let src = &src[..src_size];
    let dst = &mut dst[..dst_size];
    match (src_format, dst_format) {
        (PixelFormat::Yuv420p, PixelFormat::Rgb888) => {
            yuv420p_to_packed::<3, _>(src, width, height, dst, |out, [r, g, b]| {
                out[0] = r;
                out[1] = g;
                out[2] = b;
            })?
        }
        (PixelFormat::Yuv420p, PixelFormat::Rgb565) => {
            yuv420p_to_packed::<2, _>(src, width, height, dst, |out, [r, g, b]| {
                BigEndian::write_u16(out, pack_rgb565(r, g, b));
            })?
        }
        _ => dst.copy_from_slice(src),
    }
    Ok(dst_size)
}

/// 单像素 BT.601 YUV → RGB
///
/// 与整帧转换使用完全相同的定点公式, 便于测试与调试.
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    luma_to_rgb(y, chroma_terms(u, v))
}

/// 将 RGB 分量打包为 RGB565: `RRRRR GGGGGG BBBBB`
#[inline(always)]
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r & 0xF8) << 8) | (u16::from(g & 0xFC) << 3) | u16::from(b >> 3)
}

/// 一个色度样本对 R/G/B 的贡献 (已含舍入常量)
#[derive(Clone, Copy)]
struct ChromaTerms {
    r: i32,
    g: i32,
    b: i32,
}

#[inline(always)]
fn chroma_terms(u: u8, v: u8) -> ChromaTerms {
    let d = i32::from(u) - 128;
    let e = i32::from(v) - 128;
    ChromaTerms {
        r: R_V * e + ROUND,
        g: G_U * d + G_V * e + ROUND,
        b: B_U * d + ROUND,
    }
}

#[inline(always)]
fn luma_to_rgb(y: u8, t: ChromaTerms) -> [u8; 3] {
    let c = Y_GAIN * (i32::from(y) - 16);
    [
        ((c + t.r) >> 8).clamp(0, 255) as u8,
        ((c + t.g) >> 8).clamp(0, 255) as u8,
        ((c + t.b) >> 8).clamp(0, 255) as u8,
    ]
}

/// YUV420P → 打包 RGB 通用扫描
///
/// 按行主序遍历, 每次处理水平相邻的两个亮度样本及其共享色度.
/// `BPP` 为目标每像素字节数, `put` 负责把一个 RGB 像素写入 `BPP` 字节.
fn yuv420p_to_packed<const BPP: usize, F>(
    src: &[u8],
    width: u32,
    height: u32,
    dst: &mut [u8],
    put: F,
) -> VdecResult<()>
where
    F: Fn(&mut [u8], [u8; 3]),
{
    if width % 2 != 0 || height % 2 != 0 {
        return Err(VdecError::InvalidArgument(format!(
            "YUV420P 要求宽高为偶数: {width}x{height}"
        )));
    }

    let w = width as usize;
    let h = height as usize;
    let cw = w / 2;
    let (y_plane, chroma) = src.split_at(w * h);
    let (u_plane, v_plane) = chroma.split_at(cw * (h / 2));

    let rows = y_plane
        .chunks_exact(w)
        .zip(dst.chunks_exact_mut(w * BPP))
        .enumerate();
    for (row, (y_row, out_row)) in rows {
        let chroma_off = (row / 2) * cw;
        let u_row = &u_plane[chroma_off..chroma_off + cw];
        let v_row = &v_plane[chroma_off..chroma_off + cw];

        let pairs = y_row
            .chunks_exact(2)
            .zip(out_row.chunks_exact_mut(2 * BPP))
            .zip(u_row.iter().zip(v_row));
        for ((y_pair, out_pair), (&u, &v)) in pairs {
            let t = chroma_terms(u, v);
            let (left, right) = out_pair.split_at_mut(BPP);
            put(left, luma_to_rgb(y_pair[0], t));
            put(right, luma_to_rgb(y_pair[1], t));
        }
    }

    Ok(())
}
