//! H.264 帧解码管线.
//!
//! 数据流:
//! ```text
//! 码流 → 输入暂存区 → 解码引擎 ─┬─ Incomplete → 成功 (无帧)
//!                               └─ 解码平面 → [颜色空间转换] → 事件分发 → 观察者
//! ```
//!
//! 所有缓冲区在 `initialize()` 时一次性分配, 稳态解码不再分配内存
//! (转换缓冲区仅在帧尺寸变大时增长一次).
//!
//! 单线程, 不可重入: `decode_frame` 同步执行到底后才返回, 调用方需自行串行化.

use std::time::Instant;

use log::{debug, error, info, warn};
use serde::Serialize;

use vdec_core::PixelFormat;
use vdec_scale::{convert, is_conversion_supported};

use crate::buffers::{FrameBuffers, frame_buffer_size_for};
use crate::config::DecoderConfig;
use crate::dispatcher::EventDispatcher;
use crate::engine::{DecodedPlane, DecoderEngine, EngineConfig, EngineOutput};
use crate::error::{DecodeError, InitError};
use crate::frame::DecodedFrame;
use crate::registry::EngineRegistry;
use crate::state::{DecoderState, StateMachine};

/// 一次成功解码调用的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// 解码出一帧并已分发给观察者
    FrameDelivered,
    /// 输入已消费, 尚无完整帧
    NeedMoreData,
}

/// 解码统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// 提交给引擎的数据块数
    pub chunks_submitted: u64,
    /// 已分发的帧数
    pub frames_delivered: u64,
    /// 引擎返回 Incomplete 的次数
    pub incomplete: u64,
    /// 返回错误的次数
    pub errors: u64,
}

/// H.264 帧解码器
pub struct H264FrameDecoder {
    config: DecoderConfig,
    registry: EngineRegistry,
    state: StateMachine,
    buffers: FrameBuffers,
    engine: Option<Box<dyn DecoderEngine>>,
    dispatcher: EventDispatcher,
    stats: DecodeStats,
    /// 初始化时刻, 作为 `decode_frame` 时间戳的零点
    epoch: Option<Instant>,
}

impl Default for H264FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl H264FrameDecoder {
    /// 使用内置引擎与默认配置创建解码器
    pub fn new() -> Self {
        let mut registry = EngineRegistry::new();
        crate::register_all(&mut registry);
        Self::with_registry(registry)
    }

    /// 使用指定的引擎注册表创建解码器
    pub fn with_registry(registry: EngineRegistry) -> Self {
        Self {
            config: DecoderConfig::default(),
            registry,
            state: StateMachine::new(),
            buffers: FrameBuffers::default(),
            engine: None,
            dispatcher: EventDispatcher::new(),
            stats: DecodeStats::default(),
            epoch: None,
        }
    }

    /// 设置最大尺寸、输出格式与缓冲区大小提示 (0 表示自动计算)
    ///
    /// 只能在 `initialize()` 之前调用.
    pub fn configure(
        &mut self,
        max_width: u32,
        max_height: u32,
        pixel_format: PixelFormat,
        buffer_size_hint: usize,
    ) -> Result<(), InitError> {
        let config = DecoderConfig {
            max_width,
            max_height,
            pixel_format,
            frame_buffer_size: buffer_size_hint,
            ..self.config.clone()
        };
        self.set_config(config)
    }

    /// 整体替换配置, 只能在 `initialize()` 之前调用
    pub fn set_config(&mut self, config: DecoderConfig) -> Result<(), InitError> {
        if !self.state.can_configure() {
            return Err(InitError::InvalidState(format!(
                "初始化后不能修改配置, 当前状态: {}",
                self.state.state()
            )));
        }
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// 初始化: 校验配置, 创建引擎, 分配缓冲区
    ///
    /// 只有引擎创建失败是致命的 (`InitError::EngineCreation`), 此后解码器停留在
    /// `Failed` 状态. 配置错误会让解码器回到 `Uninitialized`, 修正配置后可重试.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        self.state.begin_initialize()?;

        if let Err(e) = self.config.validate() {
            error!("H.264 解码器配置非法: {e}");
            self.state.abort_initialize();
            return Err(e);
        }

        let engine_config = EngineConfig {
            max_width: self.config.max_width,
            max_height: self.config.max_height,
            output_format: self.config.pixel_format,
        };
        let engine = match self
            .registry
            .create(&engine_config, self.config.engine.as_deref())
        {
            Ok(engine) => engine,
            Err(e) => {
                error!("H.264 解码引擎创建失败: {e}");
                self.state.fail();
                return Err(e);
            }
        };

        let native = engine.native_format();
        let frame_size = frame_buffer_size_for(&self.config);
        let native_size = native.frame_size(self.config.max_width, self.config.max_height);
        if frame_size < native_size {
            self.state.abort_initialize();
            return Err(InitError::InvalidConfig(format!(
                "帧缓冲区 {frame_size} 字节不足以容纳引擎 {} 的 {native} 输出 ({native_size} 字节)",
                engine.name()
            )));
        }
        if !is_conversion_supported(native, self.config.pixel_format) {
            warn!(
                "引擎 {} 输出 {native}, 无法转换为 {}, 解码将失败",
                engine.name(),
                self.config.pixel_format
            );
        }

        self.buffers = FrameBuffers::allocate(&self.config);
        self.engine = Some(engine);
        self.stats = DecodeStats::default();
        self.epoch = Some(Instant::now());
        self.state.complete_initialize();
        info!(
            "H.264 解码器初始化完成: {}x{} {}, 引擎 {}",
            self.config.max_width,
            self.config.max_height,
            self.config.pixel_format,
            self.engine_name().unwrap_or("-"),
        );
        Ok(())
    }

    /// 解码一段码流, 时间戳取初始化以来的微秒数
    pub fn decode_frame(&mut self, data: &[u8]) -> Result<DecodeOutcome, DecodeError> {
        let timestamp = self.epoch.map_or(0, |epoch| {
            u64::try_from(epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
        });
        self.decode_frame_at(data, timestamp)
    }

    /// 解码一段码流, 使用调用方提供的时间戳 (微秒)
    ///
    /// 成功时返回是否分发了一帧; 失败时错误观察者先收到一次通知, 然后返回错误.
    pub fn decode_frame_at(
        &mut self,
        data: &[u8],
        timestamp: u64,
    ) -> Result<DecodeOutcome, DecodeError> {
        if !self.state.is_ready() {
            return self.fail(DecodeError::NotReady);
        }
        if data.is_empty() {
            return self.fail(DecodeError::InvalidInput("输入为空".into()));
        }
        if let Err(e) = self.buffers.stage_input(data) {
            return self.fail(DecodeError::InvalidInput(e.to_string()));
        }

        let Some(engine) = self.engine.as_mut() else {
            return self.fail(DecodeError::NotReady);
        };
        self.stats.chunks_submitted += 1;
        let native = engine.native_format();
        let (input, output) = self.buffers.engine_io();
        let result = engine.submit(input, timestamp, output);

        match result {
            EngineOutput::Incomplete => {
                self.stats.incomplete += 1;
                Ok(DecodeOutcome::NeedMoreData)
            }
            EngineOutput::Failed(fault) => {
                if !fault.recoverable {
                    error!("H.264 解码引擎不可恢复错误, 解码器停止工作: {fault}");
                    self.state.fail();
                }
                self.fail(DecodeError::EngineFailure(fault.to_string()))
            }
            EngineOutput::Decoded(plane) => match self.deliver(plane, native) {
                Ok(()) => Ok(DecodeOutcome::FrameDelivered),
                Err(e) => self.fail(e),
            },
        }
    }

    /// 必要时转换颜色空间, 然后分发帧
    fn deliver(&mut self, plane: DecodedPlane, native: PixelFormat) -> Result<(), DecodeError> {
        let DecodedPlane {
            width,
            height,
            timestamp,
        } = plane;
        if width == 0
            || height == 0
            || width > self.config.max_width
            || height > self.config.max_height
        {
            return Err(DecodeError::EngineFailure(format!(
                "引擎输出尺寸非法: {width}x{height}"
            )));
        }
        let src_size = native.frame_size(width, height);
        if src_size > self.buffers.frame_buffer_size() {
            return Err(DecodeError::EngineFailure(format!(
                "引擎输出超出帧缓冲区: {src_size} > {}",
                self.buffers.frame_buffer_size()
            )));
        }

        let target = self.config.pixel_format;
        let data = if native == target {
            self.buffers.frame_buffer()
        } else {
            let conversion_failure = |reason: String| DecodeError::ConversionFailure {
                src: native,
                dst: target,
                reason,
            };
            if !is_conversion_supported(native, target) {
                return Err(conversion_failure("不支持的转换路径".into()));
            }
            let dst_size = target.frame_size(width, height);
            self.buffers.ensure_scratch(dst_size);
            let (src, dst) = self
                .buffers
                .conversion_io(src_size, dst_size)
                .map_err(|e| conversion_failure(e.to_string()))?;
            convert(src, native, dst, target, width, height)
                .map_err(|e| conversion_failure(e.to_string()))?;
            self.buffers.temp_buffer()
        };

        let frame = DecodedFrame::new(data, width, height, target, timestamp).ok_or_else(|| {
            DecodeError::EngineFailure(format!("无法构造帧视图: {width}x{height} {target}"))
        })?;
        self.stats.frames_delivered += 1;
        let panicked = self.dispatcher.dispatch_frame(&frame);
        if panicked > 0 {
            warn!("{panicked} 个帧观察者 panic");
        }
        Ok(())
    }

    /// 记录并分发错误, 然后原样返回
    fn fail(&mut self, err: DecodeError) -> Result<DecodeOutcome, DecodeError> {
        self.stats.errors += 1;
        warn!("H.264 解码失败: {err}");
        self.dispatcher.dispatch_error(&err);
        Err(err)
    }

    /// 清空引擎历史 (参考帧, 参数集), 保持 `Ready`, 不重新分配缓冲区
    ///
    /// 未就绪时返回 `NotReady`, 不通知错误观察者.
    pub fn reset(&mut self) -> Result<(), DecodeError> {
        if !self.state.reset() {
            return Err(DecodeError::NotReady);
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.reset();
        }
        debug!("H.264 解码器已重置");
        Ok(())
    }

    /// 销毁引擎并释放缓冲区, 回到 `Uninitialized`; `Failed` 状态保持不变
    pub fn shutdown(&mut self) {
        self.engine = None;
        self.buffers.release();
        self.epoch = None;
        if self.state.shutdown() {
            info!("H.264 解码器已关闭");
        }
    }

    /// 周期调用机会, 转发给需要轮询的引擎
    pub fn poll(&mut self) {
        if !self.state.is_ready() {
            return;
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.poll();
        }
    }

    /// 输出配置与状态诊断信息
    pub fn dump_config(&self) {
        info!("H.264 解码器:");
        info!(
            "  最大分辨率: {}x{}",
            self.config.max_width, self.config.max_height
        );
        info!("  像素格式: {}", self.config.pixel_format);
        info!("  帧缓冲区: {} 字节", frame_buffer_size_for(&self.config));
        info!("  输入缓冲区: {} 字节", self.config.input_buffer_size);
        info!("  引擎: {}", self.engine_name().unwrap_or("-"));
        info!(
            "  观察者: 帧 {} 个, 错误 {} 个",
            self.dispatcher.frame_observer_count(),
            self.dispatcher.error_observer_count()
        );
        info!("  状态: {}", self.state.state());
    }

    /// 追加帧观察者
    ///
    /// 帧视图只在回调期间有效, 需要保留数据时调用 `DecodedFrame::to_vec()`.
    pub fn register_frame_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&DecodedFrame<'_>) + 'static,
    {
        self.dispatcher.on_frame(observer);
    }

    /// 追加错误观察者
    pub fn register_error_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&DecodeError) + 'static,
    {
        self.dispatcher.on_error(observer);
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn is_failed(&self) -> bool {
        self.state.is_failed()
    }

    pub fn state(&self) -> DecoderState {
        self.state.state()
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// 当前引擎名称, 未初始化时为 None
    pub fn engine_name(&self) -> Option<&str> {
        self.engine.as_deref().map(|e| e.name())
    }

    pub fn frame_buffer_size(&self) -> usize {
        self.buffers.frame_buffer_size()
    }

    pub fn temp_buffer_size(&self) -> usize {
        self.buffers.temp_buffer_size()
    }

    pub fn input_buffer_capacity(&self) -> usize {
        self.buffers.input_capacity()
    }
}
