//! 比特流读取器.
//!
//! 按大端位序 (MSB first) 从字节切片中读取定长字段与 Exp-Golomb 变长字段,
//! 供参数集 (SPS) 解析使用.

use crate::{VdecError, VdecResult};

/// 比特流读取器
///
/// # 示例
/// ```
/// use vdec_core::bitreader::BitReader;
///
/// let data = [0b1011_0001, 0b0101_0101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(4).unwrap(), 0b0001);
/// assert_eq!(br.read_bits(8).unwrap(), 0b0101_0101);
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    /// 已消费的总位数
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 已读取的总位数
    pub fn bits_read(&self) -> usize {
        self.pos
    }

    /// 剩余可读位数
    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> VdecResult<u32> {
        let byte = *self.data.get(self.pos / 8).ok_or(VdecError::Eof)?;
        let bit = (byte >> (7 - (self.pos % 8))) & 1;
        self.pos += 1;
        Ok(u32::from(bit))
    }

    /// 读取 1 个位并解释为布尔标志
    pub fn read_flag(&mut self) -> VdecResult<bool> {
        Ok(self.read_bit()? == 1)
    }

    /// 读取 N 个位 (最多 32 位)
    pub fn read_bits(&mut self, n: u32) -> VdecResult<u32> {
        if n > 32 {
            return Err(VdecError::InvalidArgument(format!(
                "read_bits: n={n} 超过 32 位"
            )));
        }
        if n as usize > self.bits_left() {
            return Err(VdecError::Eof);
        }

        let mut result = 0u32;
        let mut remaining = n;
        while remaining > 0 {
            let bit_in_byte = (self.pos % 8) as u32;
            let available = 8 - bit_in_byte;
            let take = remaining.min(available);
            let byte = u32::from(self.data[self.pos / 8]);
            let bits = (byte >> (available - take)) & ((1 << take) - 1);
            result = (result << take) | bits;
            self.pos += take as usize;
            remaining -= take;
        }
        Ok(result)
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: usize) -> VdecResult<()> {
        if n > self.bits_left() {
            return Err(VdecError::Eof);
        }
        self.pos += n;
        Ok(())
    }

    /// 读取无符号 Exp-Golomb 编码值 ue(v)
    pub fn read_ue(&mut self) -> VdecResult<u32> {
        let mut leading_zeros = 0u32;
        while self.read_bit()? == 0 {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(VdecError::InvalidData("Exp-Golomb 前导零过多".into()));
            }
        }
        if leading_zeros == 0 {
            return Ok(0);
        }
        let suffix = self.read_bits(leading_zeros)?;
        Ok(((1u64 << leading_zeros) - 1 + u64::from(suffix)) as u32)
    }

    /// 读取有符号 Exp-Golomb 编码值 se(v)
    ///
    /// 映射: 0→0, 1→1, 2→-1, 3→2, 4→-2, ...
    pub fn read_se(&mut self) -> VdecResult<i32> {
        let code = self.read_ue()?;
        let value = code.div_ceil(2) as i32;
        Ok(if code & 1 == 0 { -value } else { value })
    }
}
