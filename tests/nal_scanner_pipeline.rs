//! NAL 扫描与 SPS 解析集成测试

use vdec::codec::parsers::h264::{NalUnitType, parse_sps, scan_nal_units, unescape_rbsp};

// ============================================================
// 测试码流
// ============================================================

/// 典型 Annex B 码流: SPS (4 字节起始码) + PPS (3 字节) + IDR (4 字节) + P (3 字节)
fn build_typical_annex_b() -> Vec<u8> {
    let mut data = Vec::new();

    // SPS 640x480
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
    data.extend_from_slice(&[0x67, 0x42, 0x00, 0x1E, 0xDA, 0x02, 0x80, 0xF6, 0x40]);

    // PPS
    data.extend_from_slice(&[0x00, 0x00, 0x01]);
    data.extend_from_slice(&[0x68, 0xCE, 0x38, 0x80]);

    // IDR 切片
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
    data.extend_from_slice(&[0x65, 0x88, 0x80, 0x40, 0x00, 0xFF, 0xFE]);

    // P 切片
    data.extend_from_slice(&[0x00, 0x00, 0x01]);
    data.extend_from_slice(&[0x41, 0x9A, 0x01, 0x02, 0x03]);

    data
}

// ============================================================
// 扫描
// ============================================================

#[test]
fn test_single_sps_at_offset_zero() {
    let data = [0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1E];
    let units: Vec<_> = scan_nal_units(&data).collect();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].offset, 0);
    assert_eq!(units[0].nal_type.type_id(), 0x67 & 0x1F);
    assert_eq!(units[0].nal_type, NalUnitType::Sps);
}

#[test]
fn test_no_start_code_is_empty_not_error() {
    let data = [0x12u8, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x00, 0x00];
    assert_eq!(scan_nal_units(&data).count(), 0);
    assert_eq!(scan_nal_units(&data[..3]).count(), 0);
    assert_eq!(scan_nal_units(&[]).count(), 0);
}

#[test]
fn test_typical_stream_types_and_offsets() {
    let data = build_typical_annex_b();
    let units: Vec<_> = scan_nal_units(&data).collect();

    assert_eq!(units.len(), 4, "应该有 4 个 NAL 单元");
    let types: Vec<_> = units.iter().map(|u| u.nal_type).collect();
    assert_eq!(
        types,
        vec![
            NalUnitType::Sps,
            NalUnitType::Pps,
            NalUnitType::SliceIdr,
            NalUnitType::Slice
        ]
    );
    let offsets: Vec<_> = units.iter().map(|u| (u.offset, u.start_code_len)).collect();
    assert_eq!(offsets, vec![(0, 4), (13, 3), (20, 4), (31, 3)]);

    // IDR 是关键帧, ref_idc=3
    assert!(units[2].nal_type.is_idr());
    assert_eq!(units[2].ref_idc, 3);
    // P 切片不是关键帧, ref_idc=2
    assert!(units[3].nal_type.is_vcl());
    assert!(!units[3].nal_type.is_idr());
    assert_eq!(units[3].ref_idc, 2);
}

#[test]
fn test_scan_does_not_mutate_and_is_restartable() {
    let data = build_typical_annex_b();
    let snapshot = data.clone();
    let scanner = scan_nal_units(&data);
    let first: Vec<_> = scanner.clone().collect();
    let second: Vec<_> = scanner.collect();
    assert_eq!(first, second);
    assert_eq!(data, snapshot);
}

// ============================================================
// SPS
// ============================================================

#[test]
fn test_sps_from_scanned_stream() {
    let data = build_typical_annex_b();
    let sps_nal = scan_nal_units(&data)
        .find(|u| u.nal_type == NalUnitType::Sps)
        .expect("应包含 SPS");
    let mut rbsp = Vec::new();
    unescape_rbsp(sps_nal.payload(), &mut rbsp);
    let sps = parse_sps(&rbsp).expect("SPS 解析失败");
    assert_eq!(sps.profile_idc, 66);
    assert_eq!((sps.width, sps.height), (640, 480));
}

#[test]
fn test_high_profile_sps_with_emulation_byte_path() {
    // High Profile 1920x1080: 含量化矩阵与 cropping
    let data = [
        0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x28, 0xAD, 0x84, 0x3F, 0xFF, 0x80, 0xB4, 0x03,
        0xC0, 0x11, 0x3F, 0x2A,
    ];
    let nal = scan_nal_units(&data).next().unwrap();
    let mut rbsp = Vec::new();
    unescape_rbsp(nal.payload(), &mut rbsp);
    // 0xB4 0x03 之前没有两个 0x00, 0x03 是普通数据
    assert_eq!(rbsp.len(), nal.payload().len());
    let sps = parse_sps(&rbsp).unwrap();
    assert_eq!(sps.chroma_format_idc, 1);
    assert_eq!((sps.width, sps.height), (1920, 1080));
}
