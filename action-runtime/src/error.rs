//! # Error 模块
//!
//! 定义 action-runtime 中使用的错误类型。
//!
//! 调度器自身没有致命错误：所有错误路径最终都退化为"停止调度这一个 ticker"。

use thiserror::Error;

use crate::ticker::TickerId;

/// 动作执行错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    /// 用户代码（`run` / `custom_action` 闭包）报告的失败
    #[error("动作执行失败: {message}")]
    Custom { message: String },

    /// 调度器在单个 ticker 边界捕获的失败
    #[error("{ticker} 推进失败: {source}")]
    Step {
        ticker: TickerId,
        #[source]
        source: Box<ActionError>,
    },
}

impl ActionError {
    /// 创建自定义错误
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// 附加出错的 ticker
    pub(crate) fn in_ticker(self, ticker: TickerId) -> Self {
        Self::Step {
            ticker,
            source: Box::new(self),
        }
    }

    /// 出错的 ticker（仅调度器包装过的错误才有）
    pub fn ticker(&self) -> Option<TickerId> {
        match self {
            Self::Step { ticker, .. } => Some(*ticker),
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 读写失败
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// JSON 解析或序列化失败
    #[error("配置解析失败: {0}")]
    Parse(String),

    /// 取值非法
    #[error("配置验证失败: {0}")]
    Validation(String),
}

/// Result 类型别名
pub type ActionResult<T> = Result<T, ActionError>;
