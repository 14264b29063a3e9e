//! H.264 NAL (Network Abstraction Layer) 单元扫描.
//!
//! # Annex B 格式
//!
//! Annex B 使用起始码 (start code) 分隔 NAL 单元:
//! - 4 字节起始码: `00 00 00 01`
//! - 3 字节起始码: `00 00 01`
//!
//! # NAL 头部 (1 字节)
//! ```text
//! ┌──────────────────────────────────────┐
//! │ forbidden(1) | ref_idc(2) | type(5) │
//! └──────────────────────────────────────┘
//! ```
//!
//! 扫描是惰性的: [`NalScanner`] 每次 `next()` 只向前查找到下一个起始码,
//! 不分配内存, 不修改输入. 扫描器可以 `clone()` 后从头重新遍历.

use vdec_core::bitreader::BitReader;

/// NAL 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NalUnitType {
    /// 非 IDR 图像切片 (P/B slice)
    Slice,
    /// 数据分区 A (DPA)
    SliceDpa,
    /// 数据分区 B (DPB)
    SliceDpb,
    /// 数据分区 C (DPC)
    SliceDpc,
    /// IDR 图像切片 (关键帧)
    SliceIdr,
    /// 增补增强信息 (SEI)
    Sei,
    /// 序列参数集 (SPS)
    Sps,
    /// 图像参数集 (PPS)
    Pps,
    /// 访问单元分隔符 (AUD)
    Aud,
    /// 序列结束
    EndOfSequence,
    /// 流结束
    EndOfStream,
    /// 填充数据
    FillerData,
    /// 未列出的类型编号
    Other(u8),
}

impl NalUnitType {
    /// 从 NAL 头部字节提取类型 (低 5 位)
    pub fn from_header(header: u8) -> Self {
        match header & 0x1F {
            1 => Self::Slice,
            2 => Self::SliceDpa,
            3 => Self::SliceDpb,
            4 => Self::SliceDpc,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::Aud,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            other => Self::Other(other),
        }
    }

    /// 获取类型编号
    pub fn type_id(&self) -> u8 {
        match self {
            Self::Slice => 1,
            Self::SliceDpa => 2,
            Self::SliceDpb => 3,
            Self::SliceDpc => 4,
            Self::SliceIdr => 5,
            Self::Sei => 6,
            Self::Sps => 7,
            Self::Pps => 8,
            Self::Aud => 9,
            Self::EndOfSequence => 10,
            Self::EndOfStream => 11,
            Self::FillerData => 12,
            Self::Other(id) => *id,
        }
    }

    /// 是否为 VCL (Video Coding Layer) NAL, 即携带切片数据
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            Self::Slice | Self::SliceDpa | Self::SliceDpb | Self::SliceDpc | Self::SliceIdr
        )
    }

    /// 是否为关键帧 (IDR)
    pub fn is_idr(&self) -> bool {
        matches!(self, Self::SliceIdr)
    }

    /// 是否为参数集 (SPS/PPS)
    pub fn is_parameter_set(&self) -> bool {
        matches!(self, Self::Sps | Self::Pps)
    }
}

impl std::fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slice => write!(f, "Slice"),
            Self::SliceDpa => write!(f, "SliceDPA"),
            Self::SliceDpb => write!(f, "SliceDPB"),
            Self::SliceDpc => write!(f, "SliceDPC"),
            Self::SliceIdr => write!(f, "IDR"),
            Self::Sei => write!(f, "SEI"),
            Self::Sps => write!(f, "SPS"),
            Self::Pps => write!(f, "PPS"),
            Self::Aud => write!(f, "AUD"),
            Self::EndOfSequence => write!(f, "EndOfSeq"),
            Self::EndOfStream => write!(f, "EndOfStream"),
            Self::FillerData => write!(f, "Filler"),
            Self::Other(id) => write!(f, "Other({id})"),
        }
    }
}

/// 扫描得到的 NAL 单元 (借用输入缓冲区)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// 起始码在输入缓冲区中的偏移
    pub offset: usize,
    /// 起始码长度 (3 或 4)
    pub start_code_len: usize,
    /// NAL 单元类型
    pub nal_type: NalUnitType,
    /// nal_ref_idc (参考重要性, 0-3)
    pub ref_idc: u8,
    /// NAL 数据 (含头部字节, 不含起始码, 已去除尾部 0 字节)
    pub data: &'a [u8],
}

impl<'a> NalUnit<'a> {
    /// 头部之后的载荷 (仍含防竞争字节)
    pub fn payload(&self) -> &'a [u8] {
        &self.data[1..]
    }

    /// 切片头的 first_mb_in_slice, 为 0 表示新图像的第一个切片
    ///
    /// 非切片 NAL, 数据分区 B/C (没有切片头) 以及数据不足时返回 None.
    pub fn first_mb_in_slice(&self) -> Option<u32> {
        if !matches!(
            self.nal_type,
            NalUnitType::Slice | NalUnitType::SliceIdr | NalUnitType::SliceDpa
        ) {
            return None;
        }
        // ue(v) 最多 63 位, 16 字节去防竞争后仍然足够
        let payload = self.payload();
        let mut head = Vec::with_capacity(16);
        unescape_rbsp(&payload[..payload.len().min(16)], &mut head);
        BitReader::new(&head).read_ue().ok()
    }
}

/// 惰性 NAL 扫描器
#[derive(Debug, Clone)]
pub struct NalScanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> NalScanner<'a> {
    /// 创建扫描器, 从缓冲区起点开始
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for NalScanner<'a> {
    type Item = NalUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        let (offset, start_code_len) = find_start_code(data, self.pos)?;
        let header_pos = offset + start_code_len;
        let Some(&header) = data.get(header_pos) else {
            // 起始码位于缓冲区末尾, 没有头部字节
            self.pos = data.len();
            return None;
        };

        let end = find_start_code(data, header_pos + 1).map_or(data.len(), |(next, _)| next);
        self.pos = end;

        // 去除尾部的 0 字节 (trailing_zero_8bits), 至少保留头部
        let mut nal_end = end;
        while nal_end > header_pos + 1 && data[nal_end - 1] == 0x00 {
            nal_end -= 1;
        }

        Some(NalUnit {
            offset,
            start_code_len,
            nal_type: NalUnitType::from_header(header),
            ref_idc: (header >> 5) & 0x03,
            data: &data[header_pos..nal_end],
        })
    }
}

impl std::iter::FusedIterator for NalScanner<'_> {}

/// 扫描 Annex B 缓冲区中的 NAL 单元
///
/// 长度不足 4 字节或不含起始码的缓冲区得到空序列, 不视为错误.
pub fn scan_nal_units(data: &[u8]) -> NalScanner<'_> {
    NalScanner::new(data)
}

/// 去除防竞争字节 (`00 00 03` → `00 00`), 结果写入 `rbsp`
///
/// `rbsp` 会先被清空; 调用方可复用同一个 Vec, 稳态下不再分配.
pub fn unescape_rbsp(data: &[u8], rbsp: &mut Vec<u8>) {
    rbsp.clear();
    rbsp.reserve(data.len());
    let mut zeros = 0usize;
    for &byte in data {
        if zeros >= 2 && byte == 0x03 {
            zeros = 0;
            continue;
        }
        zeros = if byte == 0x00 { zeros + 1 } else { 0 };
        rbsp.push(byte);
    }
}

/// 从 `from` 开始查找下一个起始码, 返回 (偏移, 长度)
fn find_start_code(data: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i + 3 <= data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 {
            match data[i + 2] {
                0x01 => return Some((i, 3)),
                0x00 if data.get(i + 3) == Some(&0x01) => return Some((i, 4)),
                _ => {}
            }
        }
        i += 1;
    }
    None
}
