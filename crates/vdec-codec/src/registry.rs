//! 解码引擎注册表.
//!
//! 按注册顺序保存 (名称, 探测函数, 工厂函数). 初始化时选择第一个探测成功
//! 且创建成功的引擎; 管线的其余部分不关心最终选中的是哪一个.

use log::{debug, warn};

use vdec_core::VdecResult;

use crate::engine::{DecoderEngine, EngineConfig};
use crate::error::InitError;

/// 探测函数类型: 判断当前平台能否使用该引擎
pub type EngineProbe = Box<dyn Fn(&EngineConfig) -> bool>;

/// 工厂函数类型
pub type EngineFactory = Box<dyn Fn(&EngineConfig) -> VdecResult<Box<dyn DecoderEngine>>>;

/// 引擎注册条目
struct EngineEntry {
    name: String,
    probe: EngineProbe,
    factory: EngineFactory,
}

/// 引擎注册表
#[derive(Default)]
pub struct EngineRegistry {
    entries: Vec<EngineEntry>,
}

impl EngineRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个引擎, 先注册的优先
    pub fn register<P, F>(&mut self, name: impl Into<String>, probe: P, factory: F)
    where
        P: Fn(&EngineConfig) -> bool + 'static,
        F: Fn(&EngineConfig) -> VdecResult<Box<dyn DecoderEngine>> + 'static,
    {
        self.entries.push(EngineEntry {
            name: name.into(),
            probe: Box::new(probe),
            factory: Box::new(factory),
        });
    }

    /// 已注册的引擎名称 (按优先级)
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 创建引擎
    ///
    /// 指定 `preferred` 时只尝试同名引擎; 否则按注册顺序尝试所有探测成功的引擎.
    pub fn create(
        &self,
        config: &EngineConfig,
        preferred: Option<&str>,
    ) -> Result<Box<dyn DecoderEngine>, InitError> {
        if let Some(name) = preferred {
            let entry = self
                .entries
                .iter()
                .find(|e| e.name == name)
                .ok_or_else(|| InitError::EngineCreation(format!("未找到解码引擎: {name}")))?;
            if !(entry.probe)(config) {
                return Err(InitError::EngineCreation(format!(
                    "解码引擎 {name} 在当前平台不可用"
                )));
            }
            return (entry.factory)(config)
                .map_err(|e| InitError::EngineCreation(format!("{name}: {e}")));
        }

        let mut last_error = None;
        for entry in self.entries.iter().filter(|e| (e.probe)(config)) {
            match (entry.factory)(config) {
                Ok(engine) => {
                    debug!("选中解码引擎: {}", entry.name);
                    return Ok(engine);
                }
                Err(e) => {
                    warn!("解码引擎 {} 创建失败, 尝试下一个: {e}", entry.name);
                    last_error = Some(format!("{}: {e}", entry.name));
                }
            }
        }
        Err(InitError::EngineCreation(
            last_error.unwrap_or_else(|| "没有可用的解码引擎".into()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOutput;
    use vdec_core::{PixelFormat, VdecError};

    struct NamedEngine(&'static str);

    impl DecoderEngine for NamedEngine {
        fn name(&self) -> &str {
            self.0
        }
        fn submit(&mut self, _: &[u8], _: u64, _: &mut [u8]) -> EngineOutput {
            EngineOutput::Incomplete
        }
        fn reset(&mut self) {}
    }

    fn config() -> EngineConfig {
        EngineConfig {
            max_width: 64,
            max_height: 64,
            output_format: PixelFormat::Rgb565,
        }
    }

    fn make(name: &'static str) -> impl Fn(&EngineConfig) -> VdecResult<Box<dyn DecoderEngine>> {
        move |_: &EngineConfig| Ok(Box::new(NamedEngine(name)) as Box<dyn DecoderEngine>)
    }

    #[test]
    fn test_注册所有引擎() {
        let mut registry = EngineRegistry::new();
        crate::register_all(&mut registry);
        assert_eq!(registry.list(), vec!["software"]);
        let engine = registry.create(&config(), None).unwrap();
        assert_eq!(engine.name(), "software");
    }

    #[test]
    fn test_first_probe_wins() {
        let mut registry = EngineRegistry::new();
        registry.register("hw", |_| false, make("hw"));
        registry.register("vendor", |c| c.output_format == PixelFormat::Rgb565, make("vendor"));
        registry.register("fallback", |_| true, make("fallback"));
        assert_eq!(registry.create(&config(), None).unwrap().name(), "vendor");
    }

    #[test]
    fn test_factory_failure_falls_through() {
        let mut registry = EngineRegistry::new();
        registry.register("broken", |_| true, |_| Err(VdecError::Internal("无设备".into())));
        registry.register("fallback", |_| true, make("fallback"));
        assert_eq!(registry.create(&config(), None).unwrap().name(), "fallback");
    }

    #[test]
    fn test_no_engine_is_fatal() {
        let registry = EngineRegistry::new();
        let err = registry.create(&config(), None).err().unwrap();
        assert!(err.is_fatal());

        let mut registry = EngineRegistry::new();
        registry.register("broken", |_| true, |_| Err(VdecError::Internal("无设备".into())));
        assert!(matches!(
            registry.create(&config(), None),
            Err(InitError::EngineCreation(msg)) if msg.contains("broken")
        ));
    }

    #[test]
    fn test_preferred_engine() {
        let mut registry = EngineRegistry::new();
        registry.register("hw", |_| false, make("hw"));
        registry.register("a", |_| true, make("a"));
        registry.register("b", |_| true, make("b"));
        assert_eq!(registry.create(&config(), Some("b")).unwrap().name(), "b");
        assert!(registry.create(&config(), Some("hw")).is_err());
        assert!(registry.create(&config(), Some("missing")).is_err());
    }
}
