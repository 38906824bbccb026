//! # Config 模块
//!
//! 调度器配置。
//!
//! 所有字段都有默认值，配置文件里可以只写需要覆盖的项：
//!
//! ```json
//! { "max_delta_ms": 100.0, "default_category_mask": 3 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// 调度器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 单帧时间增量上限（毫秒），用于吸收卡顿造成的尖峰；`None`（默认）表示不限制
    #[serde(default)]
    pub max_delta_ms: Option<f32>,

    /// `tick` 未指定分类掩码时使用的掩码；`None` 表示推进所有 ticker
    #[serde(default)]
    pub default_category_mask: Option<u32>,

    /// 没有错误回调时是否用 `warn!` 记录失败
    #[serde(default = "default_log_failures")]
    pub log_failures: bool,
}

fn default_log_failures() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: None,
            default_category_mask: None,
            log_failures: default_log_failures(),
        }
    }
}

impl SchedulerConfig {
    /// 从文件加载配置
    ///
    /// 文件不存在、无法读取或内容非法时记录警告并返回默认配置。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        let result = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(e.to_string()))
            .and_then(|content| Self::from_json_str(&content));

        match result {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 解析并验证 JSON 配置
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.max_delta_ms {
            if !max.is_finite() || max <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "max_delta_ms 必须为正数，当前为 {max}"
                )));
            }
        }
        Ok(())
    }

    /// 按上限截断一帧的时间增量（毫秒），负值视为 0
    pub fn clamp_delta_ms(&self, delta_ms: f32) -> f32 {
        let delta_ms = if delta_ms.is_nan() { 0.0 } else { delta_ms.max(0.0) };
        match self.max_delta_ms {
            Some(max) => delta_ms.min(max),
            None => delta_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_delta_ms, None);
        assert_eq!(config.default_category_mask, None);
        assert!(config.log_failures);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SchedulerConfig::from_json_str(r#"{ "default_category_mask": 2 }"#).unwrap();
        assert_eq!(config.default_category_mask, Some(2));
        assert_eq!(config.max_delta_ms, None);
        assert!(config.log_failures);

        let clamped = SchedulerConfig::from_json_str(r#"{ "max_delta_ms": 100.0 }"#).unwrap();
        assert_eq!(clamped.max_delta_ms, Some(100.0));
    }

    #[test]
    fn test_validation_rejects_non_positive_clamp() {
        let err = SchedulerConfig::from_json_str(r#"{ "max_delta_ms": 0.0 }"#).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"配置验证失败: max_delta_ms 必须为正数，当前为 0");
    }

    #[test]
    fn test_parse_error() {
        let err = SchedulerConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_clamp_delta_ms() {
        let unlimited = SchedulerConfig::default();
        assert_eq!(unlimited.clamp_delta_ms(1000.0), 1000.0);
        assert_eq!(unlimited.clamp_delta_ms(-5.0), 0.0);

        let clamped = SchedulerConfig {
            max_delta_ms: Some(250.0),
            ..SchedulerConfig::default()
        };
        assert_eq!(clamped.clamp_delta_ms(16.0), 16.0);
        assert_eq!(clamped.clamp_delta_ms(1000.0), 250.0);
        assert_eq!(clamped.clamp_delta_ms(-5.0), 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scheduler.json");
        let config = SchedulerConfig {
            max_delta_ms: Some(100.0),
            default_category_mask: Some(0b11),
            log_failures: false,
        };
        config.save(&path).unwrap();
        assert_eq!(SchedulerConfig::load(&path), config);
    }

    #[test]
    fn test_load_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            SchedulerConfig::load(dir.path().join("missing.json")),
            SchedulerConfig::default()
        );

        let broken = dir.path().join("broken.json");
        fs::write(&broken, r#"{ "max_delta_ms": -1.0 }"#).unwrap();
        assert_eq!(SchedulerConfig::load(&broken), SchedulerConfig::default());
    }
}
