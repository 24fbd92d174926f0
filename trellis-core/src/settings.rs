//! TOML 配置
//!
//! ```toml
//! [trellis.strategies]
//! instance-provider = "shared"
//! invocation-wrapper = "deferred"
//!
//! [trellis.logging]
//! level = "debug"
//! format = "json"
//! ```
//!
//! 环境变量 `TRELLIS_INSTANCE_PROVIDER`、`TRELLIS_INVOCATION_WRAPPER`、
//! `TRELLIS_LOG_LEVEL`、`TRELLIS_LOG_FORMAT` 优先于文件中的值。

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constants;
use crate::error::SettingsError;
use crate::logging::LoggingConfig;
use crate::registry::{Strategies, StrategyRegistry};
use crate::scope::InstanceProvider;
use crate::wrapper::InvocationWrapper;

/// 策略配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StrategySettings {
    pub instance_provider: InstanceProvider,
    pub invocation_wrapper: InvocationWrapper,
}

impl From<StrategySettings> for Strategies {
    fn from(settings: StrategySettings) -> Self {
        Strategies {
            instance_provider: settings.instance_provider,
            invocation_wrapper: settings.invocation_wrapper,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrellisSettings {
    pub strategies: StrategySettings,
    pub logging: LoggingConfig,
}

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub trellis: TrellisSettings,
}

impl Settings {
    /// 从 TOML 字符串解析
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// 从文件加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "Loading settings");
        Self::from_toml_str(&content)
    }

    /// 应用进程环境变量覆盖
    pub fn with_env_overrides(self) -> Result<Self, SettingsError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// 应用覆盖值，`lookup` 按环境变量名返回值
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(constants::ENV_INSTANCE_PROVIDER) {
            self.trellis.strategies.instance_provider = value.parse()?;
        }
        if let Some(value) = lookup(constants::ENV_INVOCATION_WRAPPER) {
            self.trellis.strategies.invocation_wrapper = value.parse()?;
        }
        if let Some(value) = lookup(constants::ENV_LOG_LEVEL) {
            self.trellis.logging.level = value.parse()?;
        }
        if let Some(value) = lookup(constants::ENV_LOG_FORMAT) {
            self.trellis.logging.format = value.parse()?;
        }
        Ok(self)
    }

    pub fn strategies(&self) -> Strategies {
        self.trellis.strategies.into()
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.trellis.logging
    }

    /// 用配置的策略创建注册表
    pub fn build_registry(&self) -> StrategyRegistry {
        StrategyRegistry::with_strategies(self.strategies())
    }
}
