//! 内置解码引擎.

pub mod software;

use crate::registry::EngineRegistry;

pub use software::{SOFTWARE_ENGINE_NAME, SoftwareDecoderState, SoftwareEngine};

/// 注册所有内置引擎
///
/// 软件回退引擎的探测总是成功, 应排在硬件或厂商引擎之后注册.
pub fn register_all_engines(registry: &mut EngineRegistry) {
    registry.register(SOFTWARE_ENGINE_NAME, |_| true, SoftwareEngine::create);
}
