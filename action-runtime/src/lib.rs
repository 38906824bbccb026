//! # Action Runtime
//!
//! 按帧驱动的动作调度器。
//!
//! ## 架构概述
//!
//! 调用方把一棵动作树绑定到目标上，调度器每帧推进所有活跃的动作：
//!
//! ```text
//! Host                              ActionScheduler
//!   │                                     │
//!   │──── run_on(target, action) ───────►│ 注册 ActionTicker
//!   │                                     │
//!   │──── tick(delta_ms, mask, on_error) ►│ 逆序推进每个 ticker
//!   │◄─── Vec<ActionEvent> ───────────────│
//!   │                                     │
//! ```
//!
//! 目标通过 [`ActionTarget`] trait 接入，调度器只持有弱引用，目标的生命周期由宿主管理。
//!
//! ## 核心类型
//!
//! - [`Action`]：动作描述（叶子动作与 Sequence / Group / Repeat / FollowPath 组合）
//! - [`ActionTicker`]：动作树与目标的运行时绑定
//! - [`ActionScheduler`]：注册表与每帧驱动
//! - [`PathResampler`]：折线路径的弧长重采样
//!
//! ## 使用示例
//!
//! ```ignore
//! use action_runtime::{Action, ActionScheduler, SceneNode, TimingMode};
//!
//! let stage = SceneNode::root("stage");
//! let sprite = SceneNode::child_of(&stage, "sprite");
//!
//! let mut scheduler = ActionScheduler::new();
//! scheduler.run_on(
//!     &sprite,
//!     Action::sequence(vec![
//!         Action::move_by(100.0, 0.0, 0.5).with_timing_mode(TimingMode::EaseOut),
//!         Action::fade_out(0.25),
//!         Action::remove_from_parent(),
//!     ]),
//! );
//!
//! loop {
//!     let events = scheduler.tick(16.0, None, None);
//!     // ...
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`action`]：动作描述与构造 API
//! - [`ticker`]：ticker 生命周期
//! - [`scheduler`]：调度器
//! - [`path`]：路径重采样
//! - [`timing`]：时间曲线
//! - [`target`]：目标能力接口
//! - [`node`]：可直接使用的场景节点
//! - [`config`]：调度器配置
//! - [`error`]：错误类型定义

pub mod action;
pub mod config;
pub mod error;
pub mod math;
pub mod node;
pub mod path;
pub mod scheduler;
pub mod target;
pub mod ticker;
pub mod timing;

// 重导出核心类型
pub use action::{
    Action, CustomStep, DEFAULT_CATEGORY_MASK, FollowPath, MAX_REPEAT_ITERATIONS_PER_TICK,
    RepeatCount, RunBlock,
};
pub use config::SchedulerConfig;
pub use error::{ActionError, ActionResult, ConfigError};
pub use math::Vec2;
pub use node::{SceneNode, Transform};
pub use path::{PathCursor, PathResampler, SpeedMode};
pub use scheduler::{ActionEvent, ActionScheduler};
pub use target::{ActionTarget, inherited_speed, is_live, is_paused_in_scope};
pub use ticker::{ActionTicker, TickOutcome, TickerData, TickerId};
pub use timing::TimingMode;
