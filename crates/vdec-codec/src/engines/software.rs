//! 软件回退引擎.
//!
//! 不做熵解码, 只检查码流中是否出现 SPS/PPS 与切片 NAL, 并从 SPS 中学习帧尺寸.
//! 确认码流存在后合成一帧 YUV420P 测试图 (水平亮度渐变, 中性色度),
//! 用于在没有真实解码器的设备上验证整条管线.
//!
//! 结果规则:
//! - 未找到任何 NAL → 可恢复失败
//! - 只有参数集等非切片 NAL → `Incomplete`
//! - 在 SPS/PPS 之前出现切片 → 可恢复失败
//! - SPS 尺寸超过最大尺寸 → 可恢复失败
//! - 其他情况 → 输出测试图

use bitflags::bitflags;
use log::{debug, warn};

use vdec_core::{PixelFormat, VdecResult};

use crate::engine::{DecodedPlane, DecoderEngine, EngineConfig, EngineFault, EngineOutput};
use crate::parsers::h264::{NalUnitType, parse_sps, scan_nal_units, unescape_rbsp};

/// 引擎名称
pub const SOFTWARE_ENGINE_NAME: &str = "software";

bitflags! {
    /// 已见过的参数集
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ParamSets: u8 {
        /// 序列参数集
        const SPS = 1 << 0;
        /// 图像参数集
        const PPS = 1 << 1;
    }
}

/// 回退引擎从码流中学到的状态, 跨调用保留直到 reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftwareDecoderState {
    /// 已见过的参数集
    pub seen: ParamSets,
    /// 最近一个 SPS 给出的宽度 (0 表示未知)
    pub width: u32,
    /// 最近一个 SPS 给出的高度 (0 表示未知)
    pub height: u32,
}

impl SoftwareDecoderState {
    /// SPS 与 PPS 是否都已出现
    pub fn has_parameter_sets(&self) -> bool {
        self.seen.contains(ParamSets::SPS | ParamSets::PPS)
    }
}

/// 软件回退引擎
pub struct SoftwareEngine {
    max_width: u32,
    max_height: u32,
    state: SoftwareDecoderState,
    /// SPS 去防竞争字节后的 RBSP, 复用以避免逐帧分配
    rbsp: Vec<u8>,
    /// 已输出帧数, 用于让测试图逐帧移动
    frame_count: u32,
}

impl SoftwareEngine {
    /// 创建引擎
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_width: config.max_width,
            max_height: config.max_height,
            state: SoftwareDecoderState::default(),
            rbsp: Vec::with_capacity(64),
            frame_count: 0,
        }
    }

    /// 工厂函数
    pub fn create(config: &EngineConfig) -> VdecResult<Box<dyn DecoderEngine>> {
        Ok(Box::new(Self::new(config)))
    }

    /// 当前学到的码流状态
    pub fn state(&self) -> &SoftwareDecoderState {
        &self.state
    }

    /// 处理一个 SPS, 尺寸超出上限时返回错误
    ///
    /// 被拒绝的 SPS 不改变已学到的状态.
    fn learn_sps(&mut self, payload: &[u8]) -> Result<(), EngineFault> {
        unescape_rbsp(payload, &mut self.rbsp);
        match parse_sps(&self.rbsp) {
            Ok(sps) => {
                if sps.width > self.max_width || sps.height > self.max_height {
                    return Err(EngineFault::recoverable(format!(
                        "SPS 尺寸 {}x{} 超过最大尺寸 {}x{}",
                        sps.width, sps.height, self.max_width, self.max_height
                    )));
                }
                if (sps.width, sps.height) != (self.state.width, self.state.height) {
                    debug!(
                        "软件引擎: SPS profile={}, level={}, {}x{}",
                        sps.profile_idc, sps.level_idc, sps.width, sps.height
                    );
                }
                self.state.width = sps.width;
                self.state.height = sps.height;
            }
            Err(e) => warn!("软件引擎: SPS 解析失败, 沿用已知尺寸: {e}"),
        }
        self.state.seen |= ParamSets::SPS;
        Ok(())
    }

    /// 当前输出尺寸: SPS 已知时取 SPS 尺寸 (向下取偶), 否则取最大尺寸
    fn output_size(&self) -> (u32, u32) {
        let (w, h) = (self.state.width & !1, self.state.height & !1);
        if w == 0 || h == 0 {
            (self.max_width, self.max_height)
        } else {
            (w, h)
        }
    }

    /// 合成 YUV420P 测试图
    fn render_test_pattern(&self, output: &mut [u8], width: u32, height: u32) {
        let (w, h) = (width as usize, height as usize);
        let (luma, chroma) = output.split_at_mut(w * h);
        let shift = self.frame_count as usize;
        for row in luma.chunks_exact_mut(w) {
            for (x, px) in row.iter_mut().enumerate() {
                *px = 16 + (((x + shift) % w) * 219 / w) as u8;
            }
        }
        chroma[..w * h / 2].fill(128);
    }
}

impl DecoderEngine for SoftwareEngine {
    fn name(&self) -> &str {
        SOFTWARE_ENGINE_NAME
    }

    fn native_format(&self) -> PixelFormat {
        PixelFormat::Yuv420p
    }

    fn submit(&mut self, data: &[u8], timestamp: u64, output: &mut [u8]) -> EngineOutput {
        let mut nal_count = 0usize;
        let mut has_slice = false;
        for nal in scan_nal_units(data) {
            nal_count += 1;
            match nal.nal_type {
                NalUnitType::Sps => {
                    if let Err(fault) = self.learn_sps(nal.payload()) {
                        return EngineOutput::Failed(fault);
                    }
                }
                NalUnitType::Pps => self.state.seen |= ParamSets::PPS,
                t if t.is_vcl() => {
                    if !self.state.has_parameter_sets() {
                        return EngineOutput::Failed(EngineFault::recoverable(format!(
                            "{t} 切片出现在 SPS/PPS 之前"
                        )));
                    }
                    has_slice = true;
                }
                _ => {}
            }
        }

        if nal_count == 0 {
            return EngineOutput::Failed(EngineFault::recoverable("输入中未找到 NAL 起始码"));
        }
        if !has_slice {
            return EngineOutput::Incomplete;
        }

        let (width, height) = self.output_size();
        let needed = PixelFormat::Yuv420p.frame_size(width, height);
        if output.len() < needed {
            return EngineOutput::Failed(EngineFault::fatal(format!(
                "输出缓冲区不足: 需要 {needed} 字节, 实际 {}",
                output.len()
            )));
        }
        self.render_test_pattern(output, width, height);
        self.frame_count = self.frame_count.wrapping_add(1);

        EngineOutput::Decoded(DecodedPlane {
            width,
            height,
            timestamp,
        })
    }

    fn reset(&mut self) {
        debug!("软件引擎: 清空参数集状态");
        self.state = SoftwareDecoderState::default();
        self.frame_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPS_320X240: &[u8] = &[0, 0, 0, 1, 0x67, 0x42, 0x00, 0x1E, 0xDA, 0x05, 0x07, 0xE4];
    const SPS_1920X1080: &[u8] = &[
        0, 0, 0, 1, 0x67, 0x64, 0x00, 0x28, 0xAD, 0x84, 0x3F, 0xFF, 0x80, 0xB4, 0x03, 0xC0, 0x11,
        0x3F, 0x2A,
    ];
    const PPS: &[u8] = &[0, 0, 0, 1, 0x68, 0xCE, 0x38, 0x80];
    const IDR: &[u8] = &[0, 0, 0, 1, 0x65, 0x88, 0x84, 0x00];

    fn engine() -> SoftwareEngine {
        SoftwareEngine::new(&EngineConfig {
            max_width: 640,
            max_height: 480,
            output_format: PixelFormat::Yuv420p,
        })
    }

    fn concat(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn test_no_start_code_fails_recoverably() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        match eng.submit(&[1, 2, 3, 4, 5], 0, &mut out) {
            EngineOutput::Failed(fault) => assert!(fault.recoverable),
            other => panic!("意外结果: {other:?}"),
        }
    }

    #[test]
    fn test_parameter_sets_only_is_incomplete() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        let data = concat(&[SPS_320X240, PPS]);
        assert_eq!(eng.submit(&data, 0, &mut out), EngineOutput::Incomplete);
        assert!(eng.state().has_parameter_sets());
        assert_eq!((eng.state().width, eng.state().height), (320, 240));
    }

    #[test]
    fn test_slice_before_parameter_sets_fails() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        assert!(matches!(
            eng.submit(IDR, 0, &mut out),
            EngineOutput::Failed(EngineFault { recoverable: true, .. })
        ));
    }

    #[test]
    fn test_decodes_at_sps_size() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        let data = concat(&[SPS_320X240, PPS, IDR]);
        let plane = match eng.submit(&data, 1234, &mut out) {
            EngineOutput::Decoded(plane) => plane,
            other => panic!("意外结果: {other:?}"),
        };
        assert_eq!((plane.width, plane.height, plane.timestamp), (320, 240, 1234));
        // 亮度在 [16, 235) 范围内, 色度为中性
        assert!(out[..320 * 240].iter().all(|&y| (16..235).contains(&y)));
        assert_eq!(out[0], 16);
        assert!(out[320 * 240..320 * 240 * 3 / 2].iter().all(|&c| c == 128));
    }

    #[test]
    fn test_state_persists_across_calls() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        let headers = concat(&[SPS_320X240, PPS]);
        assert_eq!(eng.submit(&headers, 0, &mut out), EngineOutput::Incomplete);
        assert!(matches!(
            eng.submit(IDR, 1, &mut out),
            EngineOutput::Decoded(DecodedPlane { width: 320, .. })
        ));
    }

    #[test]
    fn test_oversized_sps_rejected() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        let data = concat(&[SPS_1920X1080, PPS, IDR]);
        assert!(matches!(
            eng.submit(&data, 0, &mut out),
            EngineOutput::Failed(EngineFault { recoverable: true, .. })
        ));
    }

    #[test]
    fn test_rejected_sps_does_not_count_as_seen() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        assert_eq!(eng.submit(PPS, 0, &mut out), EngineOutput::Incomplete);
        assert!(matches!(
            eng.submit(SPS_1920X1080, 1, &mut out),
            EngineOutput::Failed(EngineFault { recoverable: true, .. })
        ));
        assert!(!eng.state().seen.contains(ParamSets::SPS));
        // 唯一的 SPS 被拒绝, 切片不能输出帧
        assert!(matches!(
            eng.submit(IDR, 2, &mut out),
            EngineOutput::Failed(EngineFault { recoverable: true, .. })
        ));
    }

    #[test]
    fn test_rejected_sps_keeps_learned_size() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        let headers = concat(&[SPS_320X240, PPS]);
        assert_eq!(eng.submit(&headers, 0, &mut out), EngineOutput::Incomplete);
        let learned = *eng.state();

        assert!(matches!(
            eng.submit(SPS_1920X1080, 1, &mut out),
            EngineOutput::Failed(_)
        ));
        assert_eq!(*eng.state(), learned);
        assert!(matches!(
            eng.submit(IDR, 2, &mut out),
            EngineOutput::Decoded(DecodedPlane { width: 320, height: 240, .. })
        ));
    }

    #[test]
    fn test_unparsable_sps_falls_back_to_max_size() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        let data = concat(&[&[0, 0, 0, 1, 0x67, 0x42], PPS, IDR]);
        assert!(matches!(
            eng.submit(&data, 0, &mut out),
            EngineOutput::Decoded(DecodedPlane { width: 640, height: 480, .. })
        ));
    }

    #[test]
    fn test_small_output_is_fatal() {
        let mut eng = engine();
        let mut out = vec![0u8; 100];
        let data = concat(&[SPS_320X240, PPS, IDR]);
        assert!(matches!(
            eng.submit(&data, 0, &mut out),
            EngineOutput::Failed(EngineFault { recoverable: false, .. })
        ));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut eng = engine();
        let mut out = vec![0u8; 640 * 480 * 3 / 2];
        let data = concat(&[SPS_320X240, PPS]);
        eng.submit(&data, 0, &mut out);
        eng.reset();
        assert_eq!(*eng.state(), SoftwareDecoderState::default());
        assert!(matches!(eng.submit(IDR, 0, &mut out), EngineOutput::Failed(_)));
    }
}
