//! 事件分发.
//!
//! 维护帧观察者与错误观察者两个有序列表, 按注册顺序同步调用.
//! 每次调用单独捕获 panic, 一个观察者失败不影响后续观察者.
//!
//! 帧观察者的签名 `FnMut(&DecodedFrame<'_>)` 对任意生命周期成立,
//! 因此无法把帧视图保存到回调之外.

use std::panic::{AssertUnwindSafe, catch_unwind};

use log::error;

use crate::error::DecodeError;
use crate::frame::DecodedFrame;

/// 帧观察者
pub type FrameObserver = Box<dyn FnMut(&DecodedFrame<'_>)>;

/// 错误观察者
pub type ErrorObserver = Box<dyn FnMut(&DecodeError)>;

/// 事件分发器
#[derive(Default)]
pub struct EventDispatcher {
    frame_observers: Vec<FrameObserver>,
    error_observers: Vec<ErrorObserver>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加帧观察者
    pub fn on_frame<F>(&mut self, observer: F)
    where
        F: FnMut(&DecodedFrame<'_>) + 'static,
    {
        self.frame_observers.push(Box::new(observer));
    }

    /// 追加错误观察者
    pub fn on_error<F>(&mut self, observer: F)
    where
        F: FnMut(&DecodeError) + 'static,
    {
        self.error_observers.push(Box::new(observer));
    }

    pub fn frame_observer_count(&self) -> usize {
        self.frame_observers.len()
    }

    pub fn error_observer_count(&self) -> usize {
        self.error_observers.len()
    }

    /// 分发一帧, 返回 panic 的观察者数量
    pub fn dispatch_frame(&mut self, frame: &DecodedFrame<'_>) -> usize {
        let mut panicked = 0;
        for (i, observer) in self.frame_observers.iter_mut().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| observer(frame))).is_err() {
                error!("帧观察者 #{i} panic, 继续分发");
                panicked += 1;
            }
        }
        panicked
    }

    /// 分发一个错误, 返回 panic 的观察者数量
    pub fn dispatch_error(&mut self, err: &DecodeError) -> usize {
        let mut panicked = 0;
        for (i, observer) in self.error_observers.iter_mut().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| observer(err))).is_err() {
                error!("错误观察者 #{i} panic, 继续分发");
                panicked += 1;
            }
        }
        panicked
    }
}
