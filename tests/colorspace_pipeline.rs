//! 颜色空间转换集成测试
//!
//! 验证整帧 YUV420P → RGB565/RGB888 转换的数值性质.

use vdec::codec::calculate_frame_buffer_size;
use vdec::core::PixelFormat;
use vdec::scale::{convert, yuv_to_rgb};

/// 构造纯色 YUV420P 帧
fn flat_yuv(width: u32, height: u32, y: u8, u: u8, v: u8) -> Vec<u8> {
    let luma = (width * height) as usize;
    let mut frame = vec![y; luma];
    frame.extend(std::iter::repeat_n(u, luma / 4));
    frame.extend(std::iter::repeat_n(v, luma / 4));
    frame
}

#[test]
fn test_buffer_size_formulas() {
    for (w, h) in [(2u32, 2u32), (16, 8), (176, 144), (640, 480), (1280, 720)] {
        let pixels = (w * h) as usize;
        assert_eq!(calculate_frame_buffer_size(PixelFormat::Yuv420p, w, h), pixels * 3 / 2);
        assert_eq!(calculate_frame_buffer_size(PixelFormat::Rgb565, w, h), pixels * 2);
        assert_eq!(calculate_frame_buffer_size(PixelFormat::Rgb888, w, h), pixels * 3);
    }
}

#[test]
fn test_bt601_white_frame() {
    let (w, h) = (64, 48);
    let src = flat_yuv(w, h, 235, 128, 128);

    let mut rgb = vec![0u8; PixelFormat::Rgb888.frame_size(w, h)];
    convert(&src, PixelFormat::Yuv420p, &mut rgb, PixelFormat::Rgb888, w, h).unwrap();
    assert!(rgb.iter().all(|&c| c >= 253), "白色应在 ±2 范围内");

    let mut rgb565 = vec![0u8; PixelFormat::Rgb565.frame_size(w, h)];
    convert(&src, PixelFormat::Yuv420p, &mut rgb565, PixelFormat::Rgb565, w, h).unwrap();
    assert!(
        rgb565
            .chunks_exact(2)
            .all(|px| u16::from_be_bytes([px[0], px[1]]) == 0xFFFF)
    );
}

#[test]
fn test_bt601_black_frame() {
    let (w, h) = (32, 32);
    let src = flat_yuv(w, h, 16, 128, 128);
    let mut rgb = vec![0xAAu8; PixelFormat::Rgb888.frame_size(w, h)];
    convert(&src, PixelFormat::Yuv420p, &mut rgb, PixelFormat::Rgb888, w, h).unwrap();
    assert!(rgb.iter().all(|&c| c == 0));
}

#[test]
fn test_frame_matches_per_pixel_formula() {
    // 每个像素不同的亮度, 每个 2x2 块不同的色度
    let (w, h) = (8u32, 4u32);
    let luma = (w * h) as usize;
    let mut src = Vec::with_capacity(luma * 3 / 2);
    src.extend((0..luma).map(|i| (16 + i * 7) as u8));
    src.extend((0..luma / 4).map(|i| (90 + i * 9) as u8));
    src.extend((0..luma / 4).map(|i| (200 - i * 11) as u8));

    let mut rgb = vec![0u8; luma * 3];
    convert(&src, PixelFormat::Yuv420p, &mut rgb, PixelFormat::Rgb888, w, h).unwrap();

    let (cw, u_base, v_base) = ((w / 2) as usize, luma, luma + luma / 4);
    for row in 0..h as usize {
        for col in 0..w as usize {
            let c = (row / 2) * cw + col / 2;
            let expect = yuv_to_rgb(src[row * w as usize + col], src[u_base + c], src[v_base + c]);
            let i = (row * w as usize + col) * 3;
            assert_eq!(&rgb[i..i + 3], &expect, "像素 ({col}, {row})");
        }
    }
}

#[test]
fn test_undersized_output_rejected() {
    let src = flat_yuv(16, 16, 128, 128, 128);
    let mut small = vec![0u8; 16 * 16 * 3 - 1];
    assert!(convert(&src, PixelFormat::Yuv420p, &mut small, PixelFormat::Rgb888, 16, 16).is_err());
}
