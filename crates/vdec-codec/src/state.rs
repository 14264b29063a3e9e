//! 解码器状态机.
//!
//! ```text
//! Uninitialized ──initialize──> Initializing ──引擎创建成功──> Ready
//!       ^                            │                          │ decode_frame / reset
//!       │                            └──引擎创建失败──> Failed   │ (Ready -> Ready)
//!       └───────────── shutdown ─────────────────────────────────┘
//! ```
//!
//! `Failed` 为终止状态, 只有引擎创建失败或引擎报告不可恢复错误时进入.
//! 逐帧解码不是持久状态, 每次调用结束后都回到 `Ready`.

use std::fmt;

use crate::error::InitError;

/// 解码器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecoderState {
    /// 未初始化
    #[default]
    Uninitialized,
    /// 正在初始化 (分配缓冲区, 创建引擎)
    Initializing,
    /// 就绪, 可以接受输入
    Ready,
    /// 致命失败 (终止状态)
    Failed,
}

impl DecoderState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DecoderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 状态机
#[derive(Debug, Default)]
pub struct StateMachine {
    state: DecoderState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == DecoderState::Ready
    }

    pub fn is_failed(&self) -> bool {
        self.state == DecoderState::Failed
    }

    /// 是否允许修改配置
    pub fn can_configure(&self) -> bool {
        self.state == DecoderState::Uninitialized
    }

    /// Uninitialized -> Initializing
    pub fn begin_initialize(&mut self) -> Result<(), InitError> {
        match self.state {
            DecoderState::Uninitialized => {
                self.state = DecoderState::Initializing;
                Ok(())
            }
            DecoderState::Failed => Err(InitError::InvalidState(
                "解码器已致命失败, 不可重新初始化".into(),
            )),
            state => Err(InitError::InvalidState(format!(
                "重复初始化, 当前状态: {state}"
            ))),
        }
    }

    /// Initializing -> Ready
    pub fn complete_initialize(&mut self) {
        debug_assert_eq!(self.state, DecoderState::Initializing);
        self.state = DecoderState::Ready;
    }

    /// Initializing -> Uninitialized (配置错误, 可修正后重试)
    pub fn abort_initialize(&mut self) {
        debug_assert_eq!(self.state, DecoderState::Initializing);
        self.state = DecoderState::Uninitialized;
    }

    /// 进入终止失败状态
    pub fn fail(&mut self) {
        self.state = DecoderState::Failed;
    }

    /// Ready -> Ready, 其他状态下返回 false
    pub fn reset(&mut self) -> bool {
        self.state == DecoderState::Ready
    }

    /// 回到 Uninitialized; `Failed` 保持不变, 返回是否发生了转换
    pub fn shutdown(&mut self) -> bool {
        match self.state {
            DecoderState::Failed => false,
            _ => {
                self.state = DecoderState::Uninitialized;
                true
            }
        }
    }
}
